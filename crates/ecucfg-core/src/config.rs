//! Configuration types and loading for the application.

use std::path::Path;

use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_INTERFACE;
use crate::paths::expand_str_path;
use crate::{AppPaths, env_prefix};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(
    title = "Application Configuration",
    description = "Main configuration for the application"
)]
pub struct AppConfig {
    /// JSON Schema reference for editor support.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub schema: Option<String>,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Values interpolated into generated ECU configuration.
    pub generator: GeneratorConfig,
}

impl AppConfig {
    /// Load configuration from the discovered config file and environment.
    ///
    /// A missing file is not an error; built-in defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn load(paths: &AppPaths) -> Result<Self> {
        if !paths.config_file.exists() {
            log::debug!(
                "no config file at {}, using defaults",
                paths.config_file.display()
            );
        }
        Self::load_from_path(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn load_from_path(config_file: &Path) -> Result<Self> {
        let env_prefix = env_prefix();
        let built = Config::builder()
            .set_default("logging.level", "warn")?
            .set_default("generator.interface", DEFAULT_INTERFACE)?
            .add_source(
                File::from(config_file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(env_prefix.as_str())
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = built.try_deserialize()?;

        if let Some(ref file) = config.logging.file {
            let expanded = expand_str_path(file)?;
            config.logging.file = Some(expanded.display().to_string());
        }

        Ok(config)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "Logging configuration")]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace).
    #[schemars(default = "default_log_level")]
    pub level: LogLevel,

    /// Optional path for log file output. Supports ~ and environment variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Log level enumeration for schema validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only emit error-level messages.
    Error,
    /// Emit warnings and errors (default).
    #[default]
    Warn,
    /// Emit informational messages and above.
    Info,
    /// Emit debug diagnostics and above.
    Debug,
    /// Emit all messages including fine-grained traces.
    Trace,
}

impl LogLevel {
    /// Convert to the `log` crate filter.
    #[must_use]
    pub const fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

const fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

/// Fixed values interpolated into the primary configuration template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "Values interpolated into generated ECU configuration")]
pub struct GeneratorConfig {
    /// Bind address written to the `[server]` block.
    pub server_host: String,

    /// Port written to the `[server]` block.
    pub server_port: u16,

    /// Bus interface used when `--interface` is not given.
    pub interface: String,

    /// ISO-TP frame padding byte.
    pub isotp_padding: u8,

    /// DoIP gateway TCP port.
    pub doip_port: u16,

    /// DoIP tester source address.
    pub doip_source_address: u16,

    /// Path of the DID store referenced from the `[dids]` block.
    pub did_store_path: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 18080,
            interface: DEFAULT_INTERFACE.to_string(),
            isotp_padding: 0xCC,
            doip_port: 13400,
            doip_source_address: 0x0E80,
            did_store_path: "config/dids.yaml".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config =
            AppConfig::load_from_path(&dir.path().join("absent.toml")).expect("load defaults");
        assert_eq!(config.generator, GeneratorConfig::default());
        assert!(matches!(config.logging.level, LogLevel::Warn));
    }

    #[test]
    fn file_overrides_generator_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[logging]\nlevel = \"debug\"\n\n[generator]\nserver_port = 9090\ninterface = \"can1\"\n",
        )
        .expect("write config");

        let config = AppConfig::load_from_path(&path).expect("load");
        assert_eq!(config.generator.server_port, 9090);
        assert_eq!(config.generator.interface, "can1");
        assert_eq!(config.generator.server_host, "0.0.0.0");
        assert_eq!(config.generator.isotp_padding, 0xCC);
        assert!(matches!(config.logging.level, LogLevel::Debug));
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(text.contains("[generator]"));
        assert!(text.contains("server_port = 18080"));
        let parsed: AppConfig = toml::from_str(&text).expect("parse");
        assert_eq!(parsed.generator, GeneratorConfig::default());
    }
}
