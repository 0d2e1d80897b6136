use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_LOADING_MESSAGE: &str = "Loading...";
pub const DEFAULT_PROCESSING_MESSAGE: &str = "Processing...";
pub const DEFAULT_NAVIGATION_MESSAGE: &str = "Loading page...";

/// Timer settings, all in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How often the simulated progress advances
    pub tick_interval_ms: u64,
    /// How long 100% stays visible before the indicator clears
    pub completion_delay_ms: u64,
    /// How long the indicator stays up after a route change
    pub page_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 200,
            completion_delay_ms: 300,
            page_delay_ms: 800,
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Simulated progress never reaches this value while an operation runs
    pub ceiling: f64,
    /// Upper bound of a single simulated step
    pub max_increment: f64,
    /// Clamp `set_progress` values into 0..=100
    pub clamp: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            ceiling: 90.0,
            max_increment: 10.0,
            clamp: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    pub loading: String,
    pub processing: String,
    pub navigation: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            loading: DEFAULT_LOADING_MESSAGE.to_string(),
            processing: DEFAULT_PROCESSING_MESSAGE.to_string(),
            navigation: DEFAULT_NAVIGATION_MESSAGE.to_string(),
        }
    }
}

/// Optional `#RRGGBB` / `#RGB` colour overrides for the terminal front end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub timing: TimingConfig,
    pub progress: ProgressConfig,
    pub messages: MessageConfig,
    pub theme: ThemeConfig,
}

impl LoaderConfig {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("busyline");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location, or create it with defaults.
    /// A broken file is logged and replaced by defaults in memory.
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Self::default(),
        };

        if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Ignoring config at {}: {}", path.display(), e);
                    return Self::default();
                }
            }
        }

        let config = Self::default();
        if let Err(e) = config.save_to(&path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        config
    }

    /// Load and validate a config file, failing on any problem
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "timing.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        let ceiling = self.progress.ceiling;
        if !(ceiling.is_finite() && ceiling > 0.0 && ceiling <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "progress.ceiling must be in (0, 100], got {}",
                ceiling
            )));
        }
        let max_increment = self.progress.max_increment;
        if !(max_increment.is_finite() && max_increment > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "progress.max_increment must be positive and finite, got {}",
                self.progress.max_increment
            )));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
