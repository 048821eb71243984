//! Core library for ecucfg - SOVD ECU configuration generator.
//!
//! This crate provides:
//! - Primary config and DID definition template rendering
//! - Discovery result transformation
//! - Configuration loading and XDG-compliant path resolution
//! - Schema generation for the tool's own configuration
//! - Common types and error handling

pub mod config;
pub mod definitions;
pub mod discovery;
pub mod error;
pub mod model;
pub mod paths;
pub mod render;
pub mod schema;

pub use config::{AppConfig, GeneratorConfig, LogLevel, LoggingConfig};
pub use definitions::{DefinitionEntry, DefinitionsDocument, standard_definitions};
pub use discovery::{DiscoveryDocument, transform, transform_file};
pub use error::{CoreError, Result};
pub use model::{TransportDescriptor, TransportKind, UnitConfig, UnitIdentity, derive_unit_id};
pub use paths::{AppPaths, definitions_path};
pub use render::{render_definitions, render_primary_config, render_primary_config_at};
pub use schema::generate_schema;

/// Application name used for config directories and environment prefix.
pub const APP_NAME: &str = "ecucfg";

/// Returns the environment variable prefix for this application.
#[must_use]
pub fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_prefix_is_upper_snake() {
        assert_eq!(env_prefix(), "ECUCFG");
    }
}
