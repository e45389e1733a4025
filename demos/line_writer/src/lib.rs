//! Line-writer destination for logbridge.
//!
//! Renders every message through a template and appends it as one line to a
//! file.
//!
//! # Options
//!
//! | Option | Default | Meaning |
//! |--------|---------|---------|
//! | `path` | required | target file |
//! | `template` | `$ISODATE $HOST $MSG` | line format |
//! | `flush_lines` | `1` | lines buffered before a write-through (1-10000) |
//! | `create_dirs` | `no` | create missing parent directories on open |
//! | `mode` | `append` | `append` or `truncate` on open |
//!
//! ```toml
//! [[destinations]]
//! id = "audit"
//! class = "line-writer"
//! options = { path = "/var/log/audit.log", flush_lines = 16 }
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use logbridge::prelude::*;
use tracing::{debug, warn};

/// Registers the `line-writer` class.
pub const DESCRIPTOR: DestinationDescriptor =
    DestinationDescriptor::new("line-writer", || Box::new(LineWriter::new()))
        .with_description("Appends templated lines to a file");

pub const DEFAULT_TEMPLATE: &str = "$ISODATE $HOST $MSG";

/// Writes one templated line per message.
#[derive(Debug, Default)]
pub struct LineWriter {
    path: PathBuf,
    flush_lines: usize,
    create_dirs: bool,
    truncate: bool,
    writer: Option<BufWriter<File>>,
    pending: usize,
    seqnum: u32,
}

impl LineWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written but not yet flushed to the file.
    pub fn pending(&self) -> usize {
        self.pending
    }

    fn flush_writer(&mut self) -> std::io::Result<()> {
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        self.pending = 0;
        Ok(())
    }
}

impl Destination for LineWriter {
    fn declare_options(
        &mut self,
        context: &Arc<DestinationContext>,
        options: &mut Options,
    ) -> OptionResult<()> {
        options.put(RequiredOptionDecorator::new(StringOption::new(
            context.clone(),
            "path",
        )))?;
        options.put(TemplateOption::with_default(
            context.clone(),
            "template",
            DEFAULT_TEMPLATE,
        ))?;
        options.put(RangeOptionDecorator::new(
            IntegerOptionDecorator::new(StringOption::with_default(
                context.clone(),
                "flush_lines",
                "1",
            )),
            1..=10_000,
        ))?;
        options.put(BooleanOptionDecorator::new(StringOption::with_default(
            context.clone(),
            "create_dirs",
            "no",
        )))?;
        options.put(EnumOptionDecorator::new(
            StringOption::with_default(context.clone(), "mode", "append"),
            ["append", "truncate"],
        ))
    }

    fn name_by_uniq_options(&self, context: &DestinationContext) -> String {
        format!(
            "line-writer,{}",
            context.get_option("path").unwrap_or_default()
        )
    }

    fn init(&mut self, options: &Options) -> Result<(), DestinationError> {
        self.path = options.string("path").map(PathBuf::from).unwrap_or_default();
        self.flush_lines = options
            .integer("flush_lines")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(1);
        self.create_dirs = options.boolean("create_dirs").unwrap_or(false);
        self.truncate = options.string("mode") == Some("truncate");
        Ok(())
    }

    fn open(&mut self, _options: &Options) -> Result<(), DestinationError> {
        if self.create_dirs
            && let Some(parent) = self.path.parent()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!self.truncate)
            .truncate(self.truncate)
            .open(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        debug!(path = %self.path.display(), "Line writer opened");
        Ok(())
    }

    fn is_opened(&self) -> bool {
        self.writer.is_some()
    }

    fn send(&mut self, message: &LogMessage, options: &Options) -> SendStatus {
        let Some(template) = options.template("template") else {
            return SendStatus::Error;
        };
        self.seqnum = self.seqnum.wrapping_add(1);
        let line = match template.format_with(message, FormatOptions::new().seqnum(self.seqnum)) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "Failed to format message, dropping it");
                return SendStatus::Drop;
            }
        };

        let Some(writer) = &mut self.writer else {
            return SendStatus::NotConnected;
        };
        if let Err(err) = writeln!(writer, "{line}") {
            warn!(path = %self.path.display(), error = %err, "Write failed, reopening");
            self.writer = None;
            return SendStatus::NotConnected;
        }
        self.pending += 1;

        if self.pending < self.flush_lines {
            return SendStatus::Queued;
        }
        match self.flush_writer() {
            Ok(()) => SendStatus::Success,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Flush failed");
                SendStatus::Error
            }
        }
    }

    fn flush(&mut self, _options: &Options) -> SendStatus {
        match self.flush_writer() {
            Ok(()) => SendStatus::Success,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Flush failed");
                SendStatus::Error
            }
        }
    }

    fn close(&mut self) -> Result<(), DestinationError> {
        let result = self.flush_writer();
        self.writer = None;
        result.map_err(Into::into)
    }
}
