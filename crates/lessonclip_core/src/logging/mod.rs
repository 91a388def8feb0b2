//! Logging: a per-job file logger plus the global `tracing` subscriber.
//!
//! Library code reports through `tracing`; everything that belongs in a
//! job's own log (commands, strategy choices, tool output tails) goes
//! through that job's [`JobLogger`].
//!
//! # Example
//!
//! ```no_run
//! use lessonclip_core::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::new("expr_0001", ".logs", LogConfig::default(), None).unwrap();
//! logger.phase("Assemble");
//! logger.command("ffmpeg -f concat -safe 0 -i list.txt -c copy out.mp4");
//! logger.success("Wrote out.mp4");
//! ```

mod job_logger;
mod types;

pub use job_logger::JobLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// Call once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .init();
}

/// Warn-level subscriber for tests; safe to call repeatedly.
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
