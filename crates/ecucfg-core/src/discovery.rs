//! Turn a discovery result document into primary configuration fragments.
//!
//! Every discovered unit is rendered with the ISO-TP transport shape. The
//! discovery record's own transport is not consulted.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::config::GeneratorConfig;
use crate::error::{CoreError, Result};
use crate::model::{DEFAULT_RX_ID, DEFAULT_TX_ID, TransportKind, UnitConfig, UnitIdentity};
use crate::render::render_primary_config;

/// Line placed between two rendered units.
pub const DOCUMENT_SEPARATOR: &str = "\n---\n";

/// Maximum number of characters taken from a unit's VIN for its name.
pub const MAX_NAME_CHARS: usize = 20;

/// A bus address as it appears in discovery output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BusAddress {
    /// Textual form such as `"0x7E0"`, kept verbatim.
    Text(String),
    /// Numeric form, rendered as JSON prints it.
    Number(serde_json::Number),
}

impl BusAddress {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// One unit found on the bus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DiscoveredUnit {
    /// Vehicle identification number reported by the unit.
    #[serde(default)]
    pub vin: Option<String>,
    /// Request CAN id.
    #[serde(default)]
    pub tx_can_id: Option<BusAddress>,
    /// Response CAN id.
    #[serde(default)]
    pub rx_can_id: Option<BusAddress>,
}

/// Top-level discovery result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DiscoveryDocument {
    /// Units as emitted by the scanner.
    #[serde(default)]
    pub ecus: Option<Vec<DiscoveredUnit>>,
    /// Alternative key accepted when `ecus` is absent.
    #[serde(default)]
    pub units: Option<Vec<DiscoveredUnit>>,
}

impl DiscoveryDocument {
    /// Discovered units in scan order; `ecus` wins over `units`.
    #[must_use]
    pub fn units(&self) -> &[DiscoveredUnit] {
        self.ecus
            .as_deref()
            .or(self.units.as_deref())
            .unwrap_or_default()
    }
}

/// Parse discovery JSON.
///
/// # Errors
///
/// Returns the underlying parse error when the text is not well-formed JSON
/// of the expected shape.
pub fn parse_discovery(text: &str) -> serde_json::Result<DiscoveryDocument> {
    serde_json::from_str(text)
}

/// Build the unit configuration for the discovered unit at `index`.
#[must_use]
pub fn unit_from_discovery(
    index: usize,
    unit: &DiscoveredUnit,
    settings: &GeneratorConfig,
) -> UnitConfig {
    let name = unit.vin.as_deref().map_or_else(
        || format!("ECU {index}"),
        |vin| vin.chars().take(MAX_NAME_CHARS).collect(),
    );
    let tx_id = unit
        .tx_can_id
        .clone()
        .map_or_else(|| DEFAULT_TX_ID.to_string(), BusAddress::into_text);
    let rx_id = unit
        .rx_can_id
        .clone()
        .map_or_else(|| DEFAULT_RX_ID.to_string(), BusAddress::into_text);

    UnitConfig::new(
        UnitIdentity::new(format!("ecu_{index}"), name, tx_id, rx_id),
        &settings.interface,
        Some(TransportKind::IsoTp),
        settings,
    )
}

/// Render every discovered unit and join the fragments in scan order.
///
/// An empty or missing unit list yields an empty string.
#[must_use]
pub fn transform(document: &DiscoveryDocument, settings: &GeneratorConfig) -> String {
    document
        .units()
        .iter()
        .enumerate()
        .map(|(index, unit)| render_primary_config(&unit_from_discovery(index, unit, settings), settings))
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// Read a discovery document from disk and transform it.
///
/// # Errors
///
/// Returns [`CoreError::DiscoveryNotFound`] if the file does not exist,
/// [`CoreError::MalformedDiscovery`] if it cannot be parsed, and
/// [`CoreError::Io`] for other read failures.
pub fn transform_file(path: &Path, settings: &GeneratorConfig) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => CoreError::DiscoveryNotFound(path.to_path_buf()),
        _ => CoreError::Io(err),
    })?;

    let document = parse_discovery(&text).map_err(|source| CoreError::MalformedDiscovery {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!(
        "transforming {} discovered unit(s) from {}",
        document.units().len(),
        path.display()
    );
    Ok(transform(&document, settings))
}
