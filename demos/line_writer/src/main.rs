//! Line Writer Example
//!
//! Reads lines from stdin and routes each one, as a log message, to every
//! destination configured in `logbridge.toml`.
//!
//! ```toml
//! [[destinations]]
//! id = "file"
//! class = "line-writer"
//! options = { path = "out/demo.log", create_dirs = true, flush_lines = 4 }
//! ```
//!
//! # Usage
//!
//! ```bash
//! printf 'hello\nworld\n' | cargo run --package line-writer -- logbridge.toml
//! ```

use anyhow::{Context, Result};
use logbridge::core::{InProcessEngine, LogMessage};
use logbridge::runtime::{BridgeRuntime, ConfigLoader};
use std::io::BufRead;
use tracing::{info, warn};

fn main() -> Result<()> {
    let mut loader = ConfigLoader::new().with_current_dir();
    if let Some(path) = std::env::args().nth(1) {
        loader = loader.file(path);
    }
    let config = loader.load().context("failed to load configuration")?;

    let engine = InProcessEngine::new();
    let config_handle = engine.new_config();
    let mut runtime = BridgeRuntime::with_engine(config, engine.clone(), config_handle)?;
    runtime.register(line_writer::DESCRIPTOR)?;

    let stats = runtime.start()?;
    info!(
        opened = stats.opened,
        failed = stats.failed,
        "Destinations started"
    );

    let ids: Vec<String> = runtime.ids().map(str::to_string).collect();
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        for id in &ids {
            let handle = engine.new_message([("HOST", host.as_str()), ("MSG", line.as_str())]);
            let status = runtime.send(id, LogMessage::new(engine.clone(), handle))?;
            if !status.is_delivered() {
                warn!(destination = %id, status = %status, "Message not delivered");
            }
        }
    }

    for (id, status) in runtime.flush_all() {
        info!(destination = %id, status = %status, "Flushed");
    }
    runtime.stop();
    Ok(())
}
