//! Fire-and-forget channel to the native internal-message facility.
//!
//! Diagnostics are the engine's self-reporting stream, distinct from user log
//! traffic. A [`Diagnostics`] value is a cheap, cloneable handle to a
//! [`DiagnosticsSink`]; components receive one by injection, and
//! [`Diagnostics::global`] provides a process-wide default for code that has
//! no context at hand.
//!
//! Emission never blocks on delivery and never fails visibly: a sink that
//! cannot deliver simply drops the message.
//!
//! # Levels
//!
//! | Method | Level | Priority |
//! |--------|-------|----------|
//! | `fatal` | [`Level::Fatal`] | 2 |
//! | `error` | [`Level::Error`] | 3 |
//! | `warning` | [`Level::Warning`] | 4 |
//! | `notice` | [`Level::Notice`] | 5 |
//! | `info` | [`Level::Info`] | 6 |
//! | `debug` | [`Level::Debug`] | 7 |
//!
//! A message is emitted when its priority is numerically less than or equal
//! to the sink's current level.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use parking_lot::{Mutex, RwLock};

/// Diagnostic severity, numbered like syslog priorities.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Fatal = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Level {
    /// All levels, most severe first.
    pub const ALL: [Level; 6] = [
        Level::Fatal,
        Level::Error,
        Level::Warning,
        Level::Notice,
        Level::Info,
        Level::Debug,
    ];

    /// Returns the numeric priority.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a numeric priority back to a level.
    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_i32() == value)
    }

    /// Returns the lowercase level name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fatal" | "crit" | "critical" => Ok(Self::Fatal),
            "error" | "err" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "notice" => Ok(Self::Notice),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("unknown diagnostics level: {other}")),
        }
    }
}

/// Receiver of diagnostic messages, implemented by the native side.
pub trait DiagnosticsSink: Send + Sync {
    /// Delivers one message. Must not block and must not panic.
    fn emit(&self, level: Level, message: &str);

    /// Current maximum priority the native side wants to receive.
    fn level(&self) -> i32;
}

// =============================================================================
// Diagnostics handle
// =============================================================================

/// Cloneable handle to a diagnostics sink.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticsSink>,
}

static GLOBAL: RwLock<Option<Diagnostics>> = RwLock::new(None);

impl Diagnostics {
    /// Wraps a sink.
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self { sink }
    }

    /// Returns the process-wide default channel.
    ///
    /// Until [`set_global`](Self::set_global) is called this forwards to
    /// `tracing` at [`Level::Notice`].
    pub fn global() -> Self {
        if let Some(diagnostics) = GLOBAL.read().as_ref() {
            return diagnostics.clone();
        }
        GLOBAL
            .write()
            .get_or_insert_with(|| Self::new(Arc::new(TracingSink::new(Level::Notice))))
            .clone()
    }

    /// Replaces the process-wide default channel.
    pub fn set_global(diagnostics: Diagnostics) {
        *GLOBAL.write() = Some(diagnostics);
    }

    /// Returns the native engine's current level.
    pub fn level(&self) -> i32 {
        self.sink.level()
    }

    /// Returns `true` if a message at `level` would be emitted.
    ///
    /// Use this to skip building expensive messages below threshold.
    pub fn is_enabled(&self, level: Level) -> bool {
        level.as_i32() <= self.sink.level()
    }

    /// Emits a message at `level` if the level is enabled.
    pub fn emit(&self, level: Level, message: impl AsRef<str>) {
        if self.is_enabled(level) {
            self.sink.emit(level, message.as_ref());
        }
    }

    pub fn fatal(&self, message: impl AsRef<str>) {
        self.emit(Level::Fatal, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(Level::Error, message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.emit(Level::Warning, message);
    }

    pub fn notice(&self, message: impl AsRef<str>) {
        self.emit(Level::Notice, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(Level::Info, message);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.emit(Level::Debug, message);
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("level", &self.level())
            .finish()
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Forwards diagnostics to `tracing` under the `logbridge::internal` target.
#[derive(Debug)]
pub struct TracingSink {
    level: AtomicI32,
}

impl TracingSink {
    /// Creates a sink emitting up to `level`.
    pub fn new(level: Level) -> Self {
        Self {
            level: AtomicI32::new(level.as_i32()),
        }
    }

    /// Changes the level at runtime.
    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_i32(), Ordering::Relaxed);
    }
}

impl DiagnosticsSink for TracingSink {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Fatal | Level::Error => {
                tracing::error!(target: "logbridge::internal", level = %level, "{message}")
            }
            Level::Warning => tracing::warn!(target: "logbridge::internal", "{message}"),
            Level::Notice | Level::Info => {
                tracing::info!(target: "logbridge::internal", level = %level, "{message}")
            }
            Level::Debug => tracing::debug!(target: "logbridge::internal", "{message}"),
        }
    }

    fn level(&self) -> i32 {
        self.level.load(Ordering::Relaxed)
    }
}

/// Records every message in memory.
///
/// Useful wherever the emitted text must be inspected afterwards.
#[derive(Debug)]
pub struct MemorySink {
    level: AtomicI32,
    records: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    /// Creates a sink emitting up to `level`.
    pub fn new(level: Level) -> Arc<Self> {
        Arc::new(Self {
            level: AtomicI32::new(level.as_i32()),
            records: Mutex::new(Vec::new()),
        })
    }

    /// Changes the level at runtime.
    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_i32(), Ordering::Relaxed);
    }

    /// Returns a [`Diagnostics`] handle backed by this sink.
    pub fn diagnostics(self: &Arc<Self>) -> Diagnostics {
        Diagnostics::new(self.clone())
    }

    /// Returns a copy of everything recorded so far.
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().clone()
    }

    /// Returns the recorded message texts.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Returns `true` if any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(_, message)| message.contains(needle))
    }
}

impl DiagnosticsSink for MemorySink {
    fn emit(&self, level: Level, message: &str) {
        self.records.lock().push((level, message.to_string()));
    }

    fn level(&self) -> i32 {
        self.level.load(Ordering::Relaxed)
    }
}
