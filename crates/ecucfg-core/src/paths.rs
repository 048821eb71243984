//! XDG-compliant path resolution and output path helpers.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::{APP_NAME, AppConfig};

/// Suffix replaced when deriving the definitions path from an output path.
const CONFIG_SUFFIX: &str = ".toml";

/// Suffix of the definitions document written next to the primary config.
const DEFINITIONS_SUFFIX: &str = "-dids.yaml";

/// Application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file.
    pub config_file: PathBuf,
}

impl AppPaths {
    /// Discover application paths, optionally overriding the config file location.
    ///
    /// # Errors
    ///
    /// Returns an error if paths cannot be resolved or expanded.
    pub fn discover(override_path: Option<&Path>) -> Result<Self> {
        let config_file = match override_path {
            Some(path) => {
                let expanded = expand_path(path)?;
                if expanded.is_dir() {
                    expanded.join("config.toml")
                } else {
                    expanded
                }
            }
            None => default_config_dir()?.join("config.toml"),
        };

        if config_file.parent().is_none() {
            return Err(anyhow!(
                "invalid config file path: {}",
                config_file.display()
            ));
        }

        Ok(Self { config_file })
    }
}

impl std::fmt::Display for AppPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config: {}", self.config_file.display())
    }
}

/// Expand a `PathBuf`, resolving ~ and environment variables.
///
/// # Errors
///
/// Returns an error if shell expansion fails.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    path.to_str()
        .map_or_else(|| Ok(path.to_path_buf()), expand_str_path)
}

/// Expand a string path, resolving ~ and environment variables.
///
/// # Errors
///
/// Returns an error if shell expansion fails.
pub fn expand_str_path(text: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(text).context("expanding path")?;
    Ok(PathBuf::from(expanded.to_string()))
}

/// Get the default configuration directory (`XDG_CONFIG_HOME` or fallback).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        let mut path = PathBuf::from(dir);
        path.push(APP_NAME);
        return Ok(path);
    }

    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

/// Path of the definitions document that accompanies `output`.
///
/// `ecu.toml` becomes `ecu-dids.yaml`; a path without a `.toml` suffix gets
/// `-dids.yaml` appended so the primary config is never overwritten.
#[must_use]
pub fn definitions_path(output: &Path) -> PathBuf {
    let text = output.to_string_lossy().into_owned();
    let stem = text.strip_suffix(CONFIG_SUFFIX).unwrap_or(text.as_str());
    PathBuf::from(format!("{stem}{DEFINITIONS_SUFFIX}"))
}

/// Write the default configuration file to the specified path.
///
/// # Errors
///
/// Returns an error if the file cannot be written or the directory cannot be created.
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }

    let config = AppConfig::default();
    let toml_str = toml::to_string_pretty(&config).context("serializing default config to TOML")?;
    let mut body = default_config_header(path);
    body.push_str(&toml_str);
    fs::write(path, body).with_context(|| format!("writing config file to {}", path.display()))
}

fn default_config_header(path: &Path) -> String {
    let mut buffer = String::new();
    buffer.push_str("# Configuration for ");
    buffer.push_str(APP_NAME);
    buffer.push('\n');
    buffer.push_str("# File: ");
    buffer.push_str(&path.display().to_string());
    buffer.push('\n');
    buffer.push('\n');
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_path_replaces_toml_suffix() {
        assert_eq!(
            definitions_path(Path::new("out/engine.toml")),
            PathBuf::from("out/engine-dids.yaml")
        );
    }

    #[test]
    fn definitions_path_appends_without_suffix() {
        assert_eq!(
            definitions_path(Path::new("out/engine.cfg")),
            PathBuf::from("out/engine.cfg-dids.yaml")
        );
        assert_eq!(
            definitions_path(Path::new("engine")),
            PathBuf::from("engine-dids.yaml")
        );
    }

    #[test]
    fn only_trailing_suffix_is_replaced() {
        assert_eq!(
            definitions_path(Path::new("a.toml.d/ecu.toml")),
            PathBuf::from("a.toml.d/ecu-dids.yaml")
        );
    }

    #[test]
    fn discover_uses_directory_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::discover(Some(dir.path())).expect("discover");
        assert_eq!(paths.config_file, dir.path().join("config.toml"));
    }

    #[test]
    fn default_config_is_written_with_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        write_default_config(&path).expect("write");
        let body = fs::read_to_string(&path).expect("read");
        assert!(body.starts_with("# Configuration for ecucfg\n"));
        assert!(body.contains("[generator]"));
    }
}
