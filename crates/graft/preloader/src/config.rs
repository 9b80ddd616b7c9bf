//! Configuration for graft-preloader

use std::path::PathBuf;

use graft_model::annotation::DEFAULT_TARGET_UNIT;
use serde::{Deserialize, Serialize};

/// Environment variable prefix, e.g. `GRAFT__DEVEL__ENABLED=true`.
pub const ENV_PREFIX: &str = "GRAFT";

/// Main preloader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloaderConfig {
    /// Development output options
    #[serde(default)]
    pub devel: DevelConfig,

    /// Unit targeted by injection requests that name none
    #[serde(default = "default_target_unit")]
    pub default_target_unit: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for PreloaderConfig {
    fn default() -> Self {
        Self {
            devel: DevelConfig::default(),
            default_target_unit: default_target_unit(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Development dump of every patched unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelConfig {
    /// Write patched units to `output_path`
    #[serde(default)]
    pub enabled: bool,

    /// Folder receiving the patched units
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Extension appended to the unit name. Keep it distinct from the
    /// real unit extension when writing next to the originals.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
}

impl Default for DevelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_path: default_output_path(),
            output_extension: default_output_extension(),
        }
    }
}

impl DevelConfig {
    /// Dump location of the unit named `unit_name`.
    pub fn output_file(&self, unit_name: &str) -> PathBuf {
        PathBuf::from(&self.output_path).join(format!("{unit_name}{}", self.output_extension))
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value helpers
fn default_target_unit() -> String {
    DEFAULT_TARGET_UNIT.to_string()
}

fn default_output_path() -> String {
    ".".to_string()
}

fn default_output_extension() -> String {
    ".pdll".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PreloaderConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `GRAFT__*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&PreloaderConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with GRAFT__ prefix
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Configuration with the development dump enabled
    pub fn development(output_path: impl Into<String>) -> Self {
        Self {
            devel: DevelConfig {
                enabled: true,
                output_path: output_path.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
