use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find a config directory for this user")]
    NoConfigDir,

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
