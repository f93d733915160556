pub use config::{
    CacheSettings, ConfigError, ConfigManager, ConfigSchema, DuplicatesConfig, Settings,
    SourceSettings,
};
pub use duplicates::{describe_track, Duplicate, DuplicateFinder, MatchKind};

mod config;
mod duplicates;
