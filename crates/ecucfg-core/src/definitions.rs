//! DID definition entries and the definitions document.
//!
//! The standard identification table lives here as typed records. The YAML
//! text is produced by [`crate::render::render_definitions`]; this module can
//! read such a document back for inspection.

use std::fmt;

use serde::Deserialize;

use crate::error::Result;

/// Who may read or write a DID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Readable in the default session.
    Public,
    /// Requires the extended diagnostic session.
    Extended,
    /// Requires security access.
    Protected,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Public => "public",
            Self::Extended => "extended",
            Self::Protected => "protected",
        })
    }
}

/// Primitive encoding of a DID value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Fixed-length ASCII text.
    Ascii,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unsigned 16-bit integer, big-endian.
    Uint16,
    /// Unsigned 32-bit integer, big-endian.
    Uint32,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer, big-endian.
    Int16,
    /// Signed 32-bit integer, big-endian.
    Int32,
    /// IEEE 754 single precision float.
    Float32,
    /// IEEE 754 double precision float.
    Float64,
    /// Variable-length text.
    String,
    /// Raw bytes.
    Bytes,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascii => "ascii",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Bytes => "bytes",
        })
    }
}

/// Linear conversion from raw to physical value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scaling {
    /// Multiplier applied to the raw value.
    pub factor: f64,
    /// Offset added after scaling.
    pub offset: f64,
    /// Physical unit label.
    pub unit: String,
}

/// Size information: a byte length for string-like types, scaling for numeric ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueLayout {
    /// Fixed byte length.
    Length {
        /// Number of bytes.
        length: usize,
    },
    /// Scaled numeric value.
    Scaled {
        /// Raw-to-physical conversion.
        scaling: Scaling,
    },
}

/// A single DID definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefinitionEntry {
    /// Data identifier.
    pub did: u16,
    /// Symbolic name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Access level tag.
    pub access: AccessLevel,
    /// Primitive data type tag.
    pub data_type: DataType,
    /// Length or scaling.
    #[serde(flatten)]
    pub layout: ValueLayout,
}

impl DefinitionEntry {
    fn ascii(did: u16, name: &str, description: &str, length: usize) -> Self {
        Self {
            did,
            name: name.to_string(),
            description: description.to_string(),
            access: AccessLevel::Public,
            data_type: DataType::Ascii,
            layout: ValueLayout::Length { length },
        }
    }

    fn scaled(did: u16, name: &str, description: &str, factor: f64, unit: &str) -> Self {
        Self {
            did,
            name: name.to_string(),
            description: description.to_string(),
            access: AccessLevel::Extended,
            data_type: DataType::Uint16,
            layout: ValueLayout::Scaled {
                scaling: Scaling {
                    factor,
                    offset: 0.0,
                    unit: unit.to_string(),
                },
            },
        }
    }
}

/// The seven ISO 14229 identification DIDs every generated store starts with.
#[must_use]
pub fn standard_definitions() -> Vec<DefinitionEntry> {
    vec![
        DefinitionEntry::ascii(0xF190, "vin", "Vehicle Identification Number", 17),
        DefinitionEntry::ascii(0xF187, "part_number", "ECU Part Number", 16),
        DefinitionEntry::ascii(0xF18C, "serial_number", "ECU Serial Number", 16),
        DefinitionEntry::ascii(0xF188, "software_version", "Software Version", 16),
        DefinitionEntry::ascii(0xF189, "hardware_version", "Hardware Version", 16),
        DefinitionEntry::ascii(0xF191, "hardware_part_number", "Hardware Part Number", 16),
        DefinitionEntry::ascii(0xF195, "software_part_number", "Software Part Number", 16),
    ]
}

/// Operational DIDs shown as commented-out templates.
#[must_use]
pub fn example_definitions() -> Vec<DefinitionEntry> {
    vec![
        DefinitionEntry::scaled(0x1000, "engine_speed", "Engine RPM", 0.25, "rpm"),
        DefinitionEntry::scaled(0x1001, "vehicle_speed", "Vehicle Speed", 0.01, "km/h"),
    ]
}

/// A parsed definitions document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefinitionsDocument {
    /// Active entries in file order.
    #[serde(default)]
    pub dids: Vec<DefinitionEntry>,
}

impl DefinitionsDocument {
    /// Parse a definitions document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid definitions document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_public_ascii() {
        let entries = standard_definitions();
        assert_eq!(entries.len(), 7);
        for entry in &entries {
            assert_eq!(entry.access, AccessLevel::Public);
            assert_eq!(entry.data_type, DataType::Ascii);
            assert!(matches!(entry.layout, ValueLayout::Length { .. }));
        }
        assert_eq!(entries[0].did, 0xF190);
        assert_eq!(entries[0].layout, ValueLayout::Length { length: 17 });
    }

    #[test]
    fn examples_carry_scaling() {
        let examples = example_definitions();
        assert_eq!(examples.len(), 2);
        assert!(
            examples
                .iter()
                .all(|e| matches!(e.layout, ValueLayout::Scaled { .. }))
        );
    }

    #[test]
    fn parses_scaled_entry() {
        let yaml = "dids:\n  - did: 0x1000\n    name: engine_speed\n    description: Engine RPM\n    access: extended\n    data_type: uint16\n    scaling:\n      factor: 0.25\n      offset: 0\n      unit: rpm\n";
        let doc = DefinitionsDocument::from_yaml(yaml).expect("parse");
        assert_eq!(doc.dids, vec![example_definitions().remove(0)]);
    }

    #[test]
    fn parses_wide_float_and_string_entries() {
        let yaml = "dids:\n  - did: 0x2000\n    name: fuel_rate\n    description: Fuel rate\n    access: extended\n    data_type: float64\n    length: 8\n  - did: 0x2001\n    name: label\n    description: Free text\n    access: public\n    data_type: string\n    length: 32\n";
        let doc = DefinitionsDocument::from_yaml(yaml).expect("parse");
        assert_eq!(doc.dids[0].data_type, DataType::Float64);
        assert_eq!(doc.dids[1].data_type, DataType::String);
        assert_eq!(doc.dids[1].data_type.to_string(), "string");
    }

    #[test]
    fn rejects_unknown_data_type() {
        let yaml = "dids:\n  - did: 1\n    name: x\n    description: x\n    access: public\n    data_type: quaternion\n    length: 4\n";
        assert!(DefinitionsDocument::from_yaml(yaml).is_err());
    }
}
