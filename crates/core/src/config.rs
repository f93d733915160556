use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One day, the default library cache lifetime.
pub const DEFAULT_LIFETIME_SECS: u64 = 24 * 60 * 60;

/// Largest page the streaming service hands out for saved tracks.
pub const MAX_PAGE_SIZE: usize = 50;

/// Configuration manager for potentials settings
/// Separates the schema of available options from the persisted values. Configuration is stored
/// in config.json in the working directory by default
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
    // Carried over from the loaded file so saves keep the original creation time
    created_at: String,
}

/// All persisted settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub cache: CacheSettings,
    pub duplicates: DuplicatesConfig,
    pub source: SourceSettings,
}

/// Library cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// How long a rebuilt library index stays fresh, in seconds
    pub lifetime_secs: u64,
    /// Directory holding the library snapshot
    pub cache_dir: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            lifetime_secs: DEFAULT_LIFETIME_SECS,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("potentials"),
        }
    }
}

impl CacheSettings {
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }
}

/// Duplicate detection behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DuplicatesConfig {
    /// When set, a track also counts as a duplicate if a saved track has the same song name,
    /// album name and artists. Otherwise only an exact track ID match counts.
    pub aggressive: bool,
}

/// Where the library is rebuilt from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// JSON export of the saved-track library
    pub library_export: PathBuf,
    /// Tracks per page when draining the export
    pub page_size: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            library_export: PathBuf::from("library_export.json"),
            page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Available configuration options with validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSchema {
    pub cache: CacheConfigSchema,
    pub duplicates: DuplicatesConfigSchema,
    pub source: SourceConfigSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfigSchema {
    pub lifetime_secs: ConfigOption<u64>,
    pub cache_dir: ConfigOption<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicatesConfigSchema {
    pub aggressive: ConfigOption<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfigSchema {
    pub library_export: ConfigOption<PathBuf>,
    pub page_size: ConfigOption<usize>,
}

/// Configuration option with validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOption<T> {
    pub default: T,
    pub valid_range: Option<(T, T)>,
    pub description: String,
}

/// Persisted configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: Settings,
    pub created_at: String,
    pub modified_at: String,
}

impl ConfigManager {
    /// Create a new configuration manager
    /// If no path is provided, defaults to 'config.json' in the current working directory
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("config.json"));

        Self {
            config_path,
            settings: Settings::default(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Load settings from configuration file
    /// Writes and returns default settings if the file doesn't exist
    pub fn load(&mut self) -> Result<Settings, ConfigError> {
        if !self.config_path.exists() {
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let config_file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Config file version {} doesn't match application version {}. Using defaults for new settings.",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        Self::validate_settings(&config_file.settings).map_err(ConfigError::ValidationError)?;

        self.settings = config_file.settings;
        if !config_file.created_at.is_empty() {
            self.created_at = config_file.created_at;
        }
        Ok(self.settings.clone())
    }

    /// Save current settings to configuration file
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            if parent != Path::new("") && parent != Path::new(".") {
                fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
            }
        }

        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at: self.created_at.clone(),
            modified_at: chrono::Utc::now().to_rfc3339(),
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Update settings and save to file
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        Self::validate_settings(&settings).map_err(ConfigError::ValidationError)?;
        self.settings = settings;
        self.save()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get configuration schema with available options
    pub fn schema() -> ConfigSchema {
        let defaults = Settings::default();
        ConfigSchema {
            cache: CacheConfigSchema {
                lifetime_secs: ConfigOption {
                    default: DEFAULT_LIFETIME_SECS,
                    valid_range: Some((0, 30 * DEFAULT_LIFETIME_SECS)),
                    description: "Seconds a rebuilt library index stays fresh".to_string(),
                },
                cache_dir: ConfigOption {
                    default: defaults.cache.cache_dir,
                    valid_range: None,
                    description: "Directory holding the library snapshot".to_string(),
                },
            },
            duplicates: DuplicatesConfigSchema {
                aggressive: ConfigOption {
                    default: false,
                    valid_range: None,
                    description: "Also match duplicates by song, album and artist names"
                        .to_string(),
                },
            },
            source: SourceConfigSchema {
                library_export: ConfigOption {
                    default: defaults.source.library_export,
                    valid_range: None,
                    description: "JSON export of the saved-track library".to_string(),
                },
                page_size: ConfigOption {
                    default: MAX_PAGE_SIZE,
                    valid_range: Some((1, MAX_PAGE_SIZE)),
                    description: "Tracks fetched per page during a rebuild".to_string(),
                },
            },
        }
    }

    /// Validate settings against schema
    pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let schema = Self::schema();

        if let Some((min, max)) = schema.cache.lifetime_secs.valid_range {
            if settings.cache.lifetime_secs < min || settings.cache.lifetime_secs > max {
                errors.push(format!("cache.lifetime_secs must be between {} and {}", min, max));
            }
        }

        if settings.cache.cache_dir.as_os_str().is_empty() {
            errors.push("cache.cache_dir must not be empty".to_string());
        }

        if let Some((min, max)) = schema.source.page_size.valid_range {
            if settings.source.page_size < min || settings.source.page_size > max {
                errors.push(format!("source.page_size must be between {} and {}", min, max));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Failed to parse config file: {0}")]
    ParseError(String),
    #[error("Failed to serialize config: {0}")]
    SerializeError(String),
    #[error("Config validation errors: {}", .0.join(", "))]
    ValidationError(Vec<String>),
}
