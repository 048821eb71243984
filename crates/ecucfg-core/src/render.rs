//! Template rendering for the primary ECU config and the DID definitions.
//!
//! Both renderers are pure formatters: addresses, interface names and
//! identifiers are interpolated verbatim without validation.

use std::fmt::Write as _;

use chrono::{Local, NaiveDateTime};

use crate::config::GeneratorConfig;
use crate::definitions::{DefinitionEntry, ValueLayout, example_definitions, standard_definitions};
use crate::model::{TransportDescriptor, UnitConfig};

/// Prefix of the only line that varies between two renders of the same unit.
pub const GENERATED_LINE_PREFIX: &str = "# Generated: ";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Render the primary TOML configuration for one unit, stamped with the current local time.
#[must_use]
pub fn render_primary_config(unit: &UnitConfig, settings: &GeneratorConfig) -> String {
    render_primary_config_at(unit, settings, Local::now().naive_local())
}

/// Render the primary TOML configuration for one unit with an explicit timestamp.
#[must_use]
pub fn render_primary_config_at(
    unit: &UnitConfig,
    settings: &GeneratorConfig,
    generated_at: NaiveDateTime,
) -> String {
    let id = &unit.identity.id;
    let name = &unit.identity.name;
    let mut out = String::new();

    let _ = write!(
        out,
        r#"# SOVD ECU Configuration
{GENERATED_LINE_PREFIX}{timestamp}

[server]
host = "{host}"
port = {port}

[ecu.{id}]
name = "{name}"
entity_type = "ecu"
description = "Auto-generated configuration for {name}"

"#,
        timestamp = generated_at.format(TIMESTAMP_FORMAT),
        host = settings.server_host,
        port = settings.server_port,
    );

    match &unit.transport {
        Some(TransportDescriptor::SegmentedBus {
            interface,
            tx_id,
            rx_id,
            padding,
        }) => {
            let _ = write!(
                out,
                r#"[ecu.{id}.transport.isotp]
interface = "{interface}"
tx_id = "{tx_id}"
rx_id = "{rx_id}"
padding = 0x{padding:02X}
"#
            );
        }
        Some(TransportDescriptor::Network {
            host,
            port,
            logical_address,
            source_address,
        }) => {
            let _ = write!(
                out,
                r#"[ecu.{id}.transport.doip]
host = "{host}"
port = {port}
logical_address = {logical_address}
source_address = 0x{source_address:04X}
"#
            );
        }
        None => {
            log::debug!("unit {id} has no supported transport, omitting transport block");
        }
    }

    let _ = write!(
        out,
        r#"
# Session timing (optional overrides)
# [ecu.{id}.timing]
# p2_timeout_ms = 50
# p2_star_timeout_ms = 5000

# Security configuration (optional)
# [ecu.{id}.security]
# algorithm = "xor"
# secret = [0x12, 0x34, 0x56, 0x78]

# DID store path
[dids]
store_path = "{store}"
"#,
        store = settings.did_store_path,
    );

    out
}

/// Render the DID definitions YAML.
///
/// The seven standard identification entries are always active. With
/// `include_examples`, two operational entries follow as comments only.
#[must_use]
pub fn render_definitions(include_examples: bool) -> String {
    let mut out = String::from(
        "# DID Definitions\n\
         # Standard identification and operational parameters\n\
         \n\
         dids:\n  \
         # === Standard Identification DIDs ===\n",
    );

    let standard = standard_definitions();
    for (index, entry) in standard.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        write_entry(&mut out, entry, "");
    }

    if include_examples {
        out.push_str(
            "\n  # === Example Operational DIDs ===\n  \
             # Uncomment and modify for your ECU\n",
        );
        for entry in &example_definitions() {
            out.push('\n');
            write_entry(&mut out, entry, "# ");
        }
    }

    out
}

/// Append one sequence item; `comment` is inserted after the list indentation
/// on every line so commented entries keep their shape.
fn write_entry(out: &mut String, entry: &DefinitionEntry, comment: &str) {
    let _ = writeln!(out, "  {comment}- did: 0x{:04X}", entry.did);
    let _ = writeln!(out, "  {comment}  name: {}", entry.name);
    let _ = writeln!(out, "  {comment}  description: {}", entry.description);
    let _ = writeln!(out, "  {comment}  access: {}", entry.access);
    let _ = writeln!(out, "  {comment}  data_type: {}", entry.data_type);
    match &entry.layout {
        ValueLayout::Length { length } => {
            let _ = writeln!(out, "  {comment}  length: {length}");
        }
        ValueLayout::Scaled { scaling } => {
            let _ = writeln!(out, "  {comment}  scaling:");
            let _ = writeln!(out, "  {comment}    factor: {}", scaling.factor);
            let _ = writeln!(out, "  {comment}    offset: {}", scaling.offset);
            let _ = writeln!(out, "  {comment}    unit: {}", scaling.unit);
        }
    }
}
