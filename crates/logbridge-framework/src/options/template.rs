use std::sync::Arc;

use logbridge_core::{BridgeError, LogTemplate};
use tracing::debug;

use super::{DestinationOption, OptionValue};
use crate::context::DestinationContext;
use crate::error::{OptionError, OptionResult};

/// An option whose value is compiled into a [`LogTemplate`] on `init`.
///
/// The template is created against the destination's configuration handle
/// and holds one native reference until [`deinit`](DestinationOption::deinit).
pub struct TemplateOption {
    context: Arc<DestinationContext>,
    name: String,
    default: Option<String>,
    value: Option<OptionValue>,
    template: Option<LogTemplate>,
}

impl TemplateOption {
    pub fn new(context: Arc<DestinationContext>, name: impl Into<String>) -> Self {
        Self {
            context,
            name: name.into(),
            default: None,
            value: None,
            template: None,
        }
    }

    pub fn with_default(
        context: Arc<DestinationContext>,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self {
            default: Some(default.into()),
            ..Self::new(context, name)
        }
    }

    fn compile(&self, text: &str) -> OptionResult<LogTemplate> {
        let failed = |err: BridgeError| OptionError::Template {
            name: self.name.clone(),
            reason: match err {
                BridgeError::TemplateCompile(reason) => reason,
                other => other.to_string(),
            },
        };
        let mut template = self.context.new_template().map_err(failed)?;
        template.compile(text).map_err(failed)?;
        Ok(template)
    }
}

impl DestinationOption for TemplateOption {
    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> &Arc<DestinationContext> {
        &self.context
    }

    fn init(&mut self) -> OptionResult<()> {
        let Some(text) = self
            .context
            .get_option(&self.name)
            .map(str::to_string)
            .or_else(|| self.default.clone())
        else {
            return Ok(());
        };

        let template = self.compile(&text)?;
        debug!(option = %self.name, template = %text, "Template option compiled");
        if let Some(previous) = self.template.replace(template) {
            previous.release();
        }
        self.value = Some(OptionValue::String(text));
        Ok(())
    }

    fn value(&self) -> Option<&OptionValue> {
        self.value.as_ref()
    }

    fn deinit(&mut self) {
        if let Some(template) = self.template.take() {
            template.release();
        }
    }

    fn template(&self) -> Option<&LogTemplate> {
        self.template.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use logbridge_core::InProcessEngine;

    use super::*;
    use crate::context::OptionSet;
    use crate::options::RequiredOptionDecorator;
    use crate::options::testing::context_on;

    #[test]
    fn test_compiles_and_formats() {
        let engine = InProcessEngine::new();
        let (ctx, _) = context_on(&engine, OptionSet::from([("template", "$HOST $MSG")]));
        let mut option = TemplateOption::new(ctx, "template");

        option.init().unwrap();
        let template = option.template().unwrap();
        assert_eq!(template.source(), Some("$HOST $MSG"));

        let message = logbridge_core::LogMessage::new(
            engine.clone(),
            engine.new_message([("HOST", "web-1"), ("MSG", "hello")]),
        );
        assert_eq!(template.format(&message).unwrap(), "web-1 hello");
        assert_eq!(engine.live_templates(), 1);
    }

    #[test]
    fn test_compile_failure_is_option_error() {
        let engine = InProcessEngine::new();
        let (ctx, _) = context_on(&engine, OptionSet::from([("template", "${HOST")]));
        let mut option = TemplateOption::new(ctx, "template");

        let err = option.init().unwrap_err();
        assert!(
            err.to_string()
                .starts_with("option template: failed to compile template")
        );
        assert!(option.template().is_none());
        assert_eq!(engine.live_templates(), 0);
    }

    #[test]
    fn test_deinit_releases_once() {
        let engine = InProcessEngine::new();
        let (ctx, _) = context_on(&engine, OptionSet::new());
        let mut option = RequiredOptionDecorator::new(TemplateOption::with_default(
            ctx,
            "template",
            "$MSG\n",
        ));

        option.init().unwrap();
        assert_eq!(engine.live_templates(), 1);

        option.deinit();
        option.deinit();
        assert_eq!(engine.live_templates(), 0);
        assert!(option.template().is_none());
    }

    #[test]
    fn test_absent_without_default() {
        let engine = InProcessEngine::new();
        let (ctx, _) = context_on(&engine, OptionSet::new());
        let mut option = TemplateOption::new(ctx, "template");

        option.init().unwrap();
        assert!(option.value().is_none());
        assert_eq!(engine.live_templates(), 0);
    }
}
