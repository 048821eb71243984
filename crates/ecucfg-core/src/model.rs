//! Unit identity and transport descriptors for a generated ECU entry.

use std::fmt;

use crate::config::GeneratorConfig;

/// Bus interface used when none is given.
pub const DEFAULT_INTERFACE: &str = "vcan0";

/// Tester-to-ECU CAN id used when a discovered unit carries none.
pub const DEFAULT_TX_ID: &str = "0x7E0";

/// ECU-to-tester CAN id used when a discovered unit carries none.
pub const DEFAULT_RX_ID: &str = "0x7E8";

/// Identity of a single diagnosable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitIdentity {
    /// Section key under `[ecu.*]`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Request address (tester -> ECU).
    pub tx_id: String,
    /// Response address (ECU -> tester).
    pub rx_id: String,
}

impl UnitIdentity {
    /// Build an identity with an explicit identifier.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        tx_id: impl Into<String>,
        rx_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tx_id: tx_id.into(),
            rx_id: rx_id.into(),
        }
    }

    /// Build an identity whose identifier is derived from `name`.
    pub fn from_name(name: &str, tx_id: impl Into<String>, rx_id: impl Into<String>) -> Self {
        Self::new(derive_unit_id(name), name, tx_id, rx_id)
    }
}

/// Normalize a display name into a section key: lower-case, with spaces and
/// hyphens turned into underscores.
#[must_use]
pub fn derive_unit_id(name: &str) -> String {
    name.to_lowercase().replace([' ', '-'], "_")
}

/// Supported transport kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// ISO-TP over CAN.
    #[default]
    IsoTp,
    /// Diagnostics over IP.
    DoIp,
}

impl TransportKind {
    /// Look up a kind by its configuration name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "isotp" => Some(Self::IsoTp),
            "doip" => Some(Self::DoIp),
            _ => None,
        }
    }

    /// Name used as the transport sub-table key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IsoTp => "isotp",
            Self::DoIp => "doip",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport parameters for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportDescriptor {
    /// Segmented transport on a CAN bus.
    SegmentedBus {
        /// CAN interface name.
        interface: String,
        /// Request CAN id, interpolated verbatim.
        tx_id: String,
        /// Response CAN id, interpolated verbatim.
        rx_id: String,
        /// Frame padding byte.
        padding: u8,
    },
    /// Diagnostics over IP.
    Network {
        /// Gateway host.
        host: String,
        /// Gateway TCP port.
        port: u16,
        /// Target logical address, interpolated verbatim.
        logical_address: String,
        /// Tester source address.
        source_address: u16,
    },
}

impl TransportDescriptor {
    /// Build the descriptor for `kind`, filling fixed values from `settings`.
    ///
    /// For DoIP the interface argument names the gateway host and the
    /// request address doubles as the logical address.
    #[must_use]
    pub fn for_kind(
        kind: TransportKind,
        identity: &UnitIdentity,
        interface: &str,
        settings: &GeneratorConfig,
    ) -> Self {
        match kind {
            TransportKind::IsoTp => Self::SegmentedBus {
                interface: interface.to_string(),
                tx_id: identity.tx_id.clone(),
                rx_id: identity.rx_id.clone(),
                padding: settings.isotp_padding,
            },
            TransportKind::DoIp => Self::Network {
                host: interface.to_string(),
                port: settings.doip_port,
                logical_address: identity.tx_id.clone(),
                source_address: settings.doip_source_address,
            },
        }
    }

    /// Kind of this descriptor.
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        match self {
            Self::SegmentedBus { .. } => TransportKind::IsoTp,
            Self::Network { .. } => TransportKind::DoIp,
        }
    }
}

/// Everything needed to render one `[ecu.*]` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitConfig {
    /// Unit identity.
    pub identity: UnitIdentity,
    /// Transport, or `None` for an unsupported kind.
    pub transport: Option<TransportDescriptor>,
}

impl UnitConfig {
    /// Pair an identity with the transport of the given kind.
    #[must_use]
    pub fn new(
        identity: UnitIdentity,
        interface: &str,
        kind: Option<TransportKind>,
        settings: &GeneratorConfig,
    ) -> Self {
        let transport =
            kind.map(|kind| TransportDescriptor::for_kind(kind, &identity, interface, settings));
        Self {
            identity,
            transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_id_from_name() {
        assert_eq!(derive_unit_id("Engine ECU"), "engine_ecu");
        assert_eq!(derive_unit_id("Body-Control Module"), "body_control_module");
        assert_eq!(derive_unit_id("abs"), "abs");
    }

    #[test]
    fn unknown_transport_names_are_unsupported() {
        assert_eq!(TransportKind::from_name("isotp"), Some(TransportKind::IsoTp));
        assert_eq!(TransportKind::from_name("doip"), Some(TransportKind::DoIp));
        assert_eq!(TransportKind::from_name("flexray"), None);
        assert_eq!(TransportKind::from_name("ISOTP"), None);
    }

    #[test]
    fn doip_uses_interface_as_host_and_tx_as_logical_address() {
        let identity = UnitIdentity::from_name("Gateway", "0x0010", "0x0E80");
        let settings = GeneratorConfig::default();
        let transport =
            TransportDescriptor::for_kind(TransportKind::DoIp, &identity, "192.168.0.10", &settings);

        assert_eq!(
            transport,
            TransportDescriptor::Network {
                host: "192.168.0.10".to_string(),
                port: 13400,
                logical_address: "0x0010".to_string(),
                source_address: 0x0E80,
            }
        );
        assert_eq!(transport.kind(), TransportKind::DoIp);
    }

    #[test]
    fn unit_without_kind_has_no_transport() {
        let identity = UnitIdentity::from_name("Engine ECU", "0x7E0", "0x7E8");
        let unit = UnitConfig::new(identity, "vcan0", None, &GeneratorConfig::default());
        assert!(unit.transport.is_none());
        assert_eq!(unit.identity.id, "engine_ecu");
    }
}
