//! Configuration for the assembly engine.
//!
//! Settings live in one TOML file with a table per concern (paths,
//! logging, tools, encoding, timeline, shorts, workers). Missing keys fall
//! back to defaults; a section can be rewritten on its own without
//! touching the rest of the file.
//!
//! # Example
//!
//! ```no_run
//! use lessonclip_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/lessonclip.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Batch limit: {}s", config.settings().shorts.max_batch_seconds);
//!
//! config.settings_mut().encoding.crf = 20;
//! config.update_section(ConfigSection::Encoding).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EncodingSettings, LoggingSettings, PathSettings, Settings, ShortsSettings,
    TimelineSettings, ToolSettings, WorkerSettings,
};
