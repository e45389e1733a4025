//! In-process implementation of [`NativeEngine`].
//!
//! [`InProcessEngine`] keeps every native object in memory behind the same
//! opaque handles a real engine would hand out, with real reference counts.
//! It backs the standalone runtime and makes reference counting observable:
//! [`message_release_count`](InProcessEngine::message_release_count) and
//! [`template_refs`](InProcessEngine::template_refs) report exactly what the
//! managed side did with each handle.

mod template;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::num::NonZeroU64;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use parking_lot::Mutex;
use tracing::{debug, error};

use self::template::{CompiledTemplate, RenderInput};
use crate::error::{BridgeError, BridgeResult};
use crate::handle::{ConfigHandle, MessageHandle, TemplateHandle, TemplateOptionsHandle};
use crate::native::{NativeEngine, TimeZone};

/// Formatting options referenced through a [`TemplateOptionsHandle`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Digits of sub-second precision in `$ISODATE` and `$UNIXTIME` (max 6).
    pub frac_digits: u8,
    /// Time zone used for [`TimeZone::Local`] instead of the machine's.
    pub local_time_zone: Option<FixedOffset>,
}

struct TemplateSlot {
    config: ConfigHandle,
    compiled: Option<CompiledTemplate>,
    refs: u32,
}

struct MessagePayload {
    values: BTreeMap<String, String>,
    stamp: DateTime<FixedOffset>,
}

/// Counters outlive the payload, which is freed on the last unref.
struct MessageSlot {
    payload: Option<MessagePayload>,
    refs: u32,
    releases: u32,
}

#[derive(Default)]
struct EngineState {
    allocated: u64,
    configs: HashSet<u64>,
    templates: HashMap<u64, TemplateSlot>,
    template_options: HashMap<u64, TemplateOptions>,
    messages: HashMap<u64, MessageSlot>,
}

impl EngineState {
    /// Hands out 1, 2, 3, ... so no handle is ever null.
    fn next_raw(&mut self) -> NonZeroU64 {
        let raw = NonZeroU64::MIN.saturating_add(self.allocated);
        self.allocated += 1;
        raw
    }
}

/// Native engine living in the current process.
#[derive(Default)]
pub struct InProcessEngine {
    state: Mutex<EngineState>,
}

impl InProcessEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a configuration object for templates to be created against.
    pub fn new_config(&self) -> ConfigHandle {
        let mut state = self.state.lock();
        let raw = state.next_raw();
        state.configs.insert(raw.get());
        ConfigHandle::from_nonzero(raw)
    }

    /// Registers formatting options.
    pub fn new_template_options(&self, options: TemplateOptions) -> TemplateOptionsHandle {
        let mut state = self.state.lock();
        let raw = state.next_raw();
        state.template_options.insert(raw.get(), options);
        TemplateOptionsHandle::from_nonzero(raw)
    }

    /// Creates a message stamped with the current local time.
    ///
    /// The returned handle carries the single reference that is passed on to
    /// a [`LogMessage`](crate::LogMessage).
    pub fn new_message<I, K, V>(&self, values: I) -> MessageHandle
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.new_message_at(Local::now().fixed_offset(), values)
    }

    /// Creates a message with an explicit send timestamp.
    pub fn new_message_at<I, K, V>(&self, stamp: DateTime<FixedOffset>, values: I) -> MessageHandle
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut state = self.state.lock();
        let raw = state.next_raw();
        state.messages.insert(
            raw.get(),
            MessageSlot {
                payload: Some(MessagePayload { values, stamp }),
                refs: 1,
                releases: 0,
            },
        );
        MessageHandle::from_nonzero(raw)
    }

    /// Current reference count of a message, `None` if never issued.
    pub fn message_refs(&self, message: MessageHandle) -> Option<u32> {
        self.state
            .lock()
            .messages
            .get(&message.as_raw())
            .map(|slot| slot.refs)
    }

    /// How many times the managed side released the message.
    pub fn message_release_count(&self, message: MessageHandle) -> u32 {
        self.state
            .lock()
            .messages
            .get(&message.as_raw())
            .map_or(0, |slot| slot.releases)
    }

    /// Number of messages whose payload is still held.
    pub fn live_messages(&self) -> usize {
        self.state
            .lock()
            .messages
            .values()
            .filter(|slot| slot.payload.is_some())
            .count()
    }

    /// Current reference count of a template, `None` once freed.
    pub fn template_refs(&self, template: TemplateHandle) -> Option<u32> {
        self.state
            .lock()
            .templates
            .get(&template.as_raw())
            .map(|slot| slot.refs)
    }

    /// Number of templates not yet freed.
    pub fn live_templates(&self) -> usize {
        self.state.lock().templates.len()
    }
}

impl NativeEngine for InProcessEngine {
    fn new_template(&self, config: ConfigHandle) -> BridgeResult<TemplateHandle> {
        let mut state = self.state.lock();
        if !state.configs.contains(&config.as_raw()) {
            return Err(BridgeError::unknown_handle(ConfigHandle::KIND, config.as_raw()));
        }
        let raw = state.next_raw();
        state.templates.insert(
            raw.get(),
            TemplateSlot {
                config,
                compiled: None,
                refs: 1,
            },
        );
        Ok(TemplateHandle::from_nonzero(raw))
    }

    fn compile_template(&self, template: TemplateHandle, text: &str) -> BridgeResult<()> {
        let compiled = CompiledTemplate::compile(text).map_err(BridgeError::TemplateCompile)?;
        let mut state = self.state.lock();
        let slot = state
            .templates
            .get_mut(&template.as_raw())
            .ok_or_else(|| BridgeError::unknown_handle(TemplateHandle::KIND, template.as_raw()))?;
        debug!(template = %template, config = %slot.config, "Template compiled");
        slot.compiled = Some(compiled);
        Ok(())
    }

    fn format_template(
        &self,
        template: TemplateHandle,
        message: MessageHandle,
        options: Option<TemplateOptionsHandle>,
        time_zone: TimeZone,
        seqnum: u32,
    ) -> BridgeResult<String> {
        let state = self.state.lock();
        let compiled = state
            .templates
            .get(&template.as_raw())
            .ok_or_else(|| BridgeError::unknown_handle(TemplateHandle::KIND, template.as_raw()))?
            .compiled
            .as_ref()
            .ok_or(BridgeError::TemplateNotCompiled)?;
        let msg = state
            .messages
            .get(&message.as_raw())
            .and_then(|slot| slot.payload.as_ref())
            .ok_or_else(|| BridgeError::unknown_handle(MessageHandle::KIND, message.as_raw()))?;
        let default_options = TemplateOptions::default();
        let options = match options {
            Some(handle) => state.template_options.get(&handle.as_raw()).ok_or_else(|| {
                BridgeError::unknown_handle(TemplateOptionsHandle::KIND, handle.as_raw())
            })?,
            None => &default_options,
        };

        Ok(compiled.render(&RenderInput {
            values: &msg.values,
            stamp: msg.stamp,
            options,
            time_zone,
            seqnum,
        }))
    }

    fn unref_template(&self, template: TemplateHandle) {
        let mut state = self.state.lock();
        let raw = template.as_raw();
        match state.templates.get_mut(&raw) {
            Some(slot) => {
                slot.refs -= 1;
                if slot.refs == 0 {
                    state.templates.remove(&raw);
                }
            }
            None => error!(template = %template, "Unref of unknown or freed template"),
        }
    }

    fn message_value(&self, message: MessageHandle, name: &str) -> Option<String> {
        self.state
            .lock()
            .messages
            .get(&message.as_raw())
            .and_then(|slot| slot.payload.as_ref())
            .and_then(|payload| payload.values.get(name).cloned())
    }

    fn unref_message(&self, message: MessageHandle) {
        let mut state = self.state.lock();
        match state.messages.get_mut(&message.as_raw()) {
            Some(slot) => {
                slot.releases += 1;
                if slot.refs == 0 {
                    error!(message = %message, "Message released more often than referenced");
                } else {
                    slot.refs -= 1;
                    if slot.refs == 0 {
                        slot.payload = None;
                    }
                }
            }
            None => error!(message = %message, "Unref of unknown message"),
        }
    }
}
