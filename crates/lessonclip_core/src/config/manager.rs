//! Loading, saving and section-level updates of the settings file.
//!
//! Writes go to a temporary file in the same directory which is then
//! persisted over the target, so readers never see a half-written file.
//! Section updates go through `toml_edit` so comments elsewhere survive.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the settings file and its in-memory copy.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Create a manager for `config_path`. Nothing is read until
    /// `load()` or `load_or_create()`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Changes stay in memory until `save()` or `update_section()`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load from disk. Fails if the file does not exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        let settings: Settings = toml::from_str(&content)?;
        validate(&settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Load from disk, writing a default file first if none exists.
    ///
    /// Unknown top-level tables are dropped and missing keys are filled in;
    /// the file is rewritten when either happens.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            self.settings = Settings::default();
            return self.save();
        }

        let content = fs::read_to_string(&self.config_path)?;
        let doc: DocumentMut = content.parse()?;
        let settings: Settings = toml::from_str(&content)?;
        validate(&settings)?;

        let known: Vec<&str> = ConfigSection::ALL.iter().map(|s| s.table_name()).collect();
        let has_unknown = doc.iter().any(|(key, _)| !known.contains(&key));
        let is_complete = ConfigSection::ALL.iter().all(|section| {
            doc.get(section.table_name())
                .and_then(Item::as_table)
                .map(|table| {
                    section_keys(&settings, *section)
                        .map(|keys| keys.iter().all(|k| table.contains_key(k)))
                        .unwrap_or(false)
                })
                .unwrap_or(false)
        });

        self.settings = settings;
        if has_unknown || !is_complete {
            tracing::debug!("Rewriting {} with defaults", self.config_path.display());
            self.save()?;
        }
        Ok(())
    }

    /// Create the output, temp and log directories.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        let paths = &self.settings.paths;
        for dir in [&paths.output_folder, &paths.temp_root, &paths.logs_folder] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    /// Write the whole file, one commented table per section.
    pub fn save(&self) -> ConfigResult<()> {
        let mut output = String::from("# lessonclip configuration\n\n");
        for section in ConfigSection::ALL {
            output.push_str(&format!(
                "# {}\n[{}]\n",
                section.description(),
                section.table_name()
            ));
            output.push_str(&section_toml(&self.settings, section)?);
            output.push('\n');
        }
        self.atomic_write(output.trim_end())?;
        Ok(())
    }

    /// Rewrite one table from the in-memory settings.
    ///
    /// The file is re-read first, so the other tables keep whatever is on
    /// disk (including comments), not what is in memory.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = current.parse()?;
        let section_doc: DocumentMut = section_toml(&self.settings, section)?.parse()?;
        doc[section.table_name()] = Item::Table(section_doc.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        let dir = match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut file = tempfile::NamedTempFile::new_in(&dir)?;
        file.write_all(content.as_bytes())?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.config_path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Serialize one section's struct as a bare key/value block.
fn section_toml(settings: &Settings, section: ConfigSection) -> ConfigResult<String> {
    let content = match section {
        ConfigSection::Paths => toml::to_string_pretty(&settings.paths)?,
        ConfigSection::Logging => toml::to_string_pretty(&settings.logging)?,
        ConfigSection::Tools => toml::to_string_pretty(&settings.tools)?,
        ConfigSection::Encoding => toml::to_string_pretty(&settings.encoding)?,
        ConfigSection::Timeline => toml::to_string_pretty(&settings.timeline)?,
        ConfigSection::Shorts => toml::to_string_pretty(&settings.shorts)?,
        ConfigSection::Workers => toml::to_string_pretty(&settings.workers)?,
    };
    Ok(content)
}

fn section_keys(settings: &Settings, section: ConfigSection) -> ConfigResult<Vec<String>> {
    let doc: DocumentMut = section_toml(settings, section)?.parse()?;
    Ok(doc.iter().map(|(k, _)| k.to_string()).collect())
}

/// Reject values the engine cannot work with.
fn validate(settings: &Settings) -> ConfigResult<()> {
    let shorts = &settings.shorts;
    if !(shorts.max_batch_seconds.is_finite() && shorts.max_batch_seconds > 0.0) {
        return Err(ConfigError::Invalid {
            key: "shorts.max_batch_seconds",
            message: format!("must be positive, got {}", shorts.max_batch_seconds),
        });
    }
    if !settings.timeline.padding().is_valid() {
        return Err(ConfigError::Invalid {
            key: "timeline",
            message: "silence durations must be non-negative".to_string(),
        });
    }
    if settings.timeline.repeat_count == 0 {
        return Err(ConfigError::Invalid {
            key: "timeline.repeat_count",
            message: "must be at least 1".to_string(),
        });
    }
    if settings.workers.count == 0 {
        return Err(ConfigError::Invalid {
            key: "workers.count",
            message: "must be at least 1".to_string(),
        });
    }
    let encoding = &settings.encoding;
    if encoding.normalized_fps == 0
        || encoding.normalized_sample_rate_hz == 0
        || encoding.normalized_channels == 0
    {
        return Err(ConfigError::Invalid {
            key: "encoding",
            message: "normalized fps, sample rate and channels must be non-zero".to_string(),
        });
    }
    Ok(())
}
