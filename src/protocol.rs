use std::time::Duration;

use strum_macros::{Display, EnumIter};

/// Bound applied to the connect handshake, including service resolution.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Known GATT endpoints on supported peripherals.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIter, Display)]
pub enum EndpointId {
    /// Primary control service.
    #[strum(to_string = "control_service")]
    ControlService,
    /// Characteristic that accepts acknowledged command writes.
    #[strum(to_string = "command_characteristic")]
    CommandCharacteristic,
}

/// Endpoint category in GATT.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
pub(crate) enum EndpointKind {
    /// GATT service endpoint.
    #[strum(to_string = "service")]
    Service,
    /// GATT characteristic endpoint.
    #[strum(to_string = "characteristic")]
    Characteristic,
}

/// Descriptive metadata for one protocol endpoint.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct EndpointMetadata {
    name: &'static str,
    uuid: &'static str,
    kind: EndpointKind,
}

impl EndpointMetadata {
    /// Human-readable endpoint name.
    pub(crate) fn name(self) -> &'static str {
        self.name
    }

    /// Endpoint UUID.
    pub(crate) fn uuid(self) -> &'static str {
        self.uuid
    }

    /// Endpoint kind.
    pub(crate) fn kind(self) -> EndpointKind {
        self.kind
    }
}

/// Returns metadata for one endpoint.
pub(crate) fn endpoint_metadata(endpoint: EndpointId) -> EndpointMetadata {
    match endpoint {
        EndpointId::ControlService => EndpointMetadata {
            name: "peripheral control service",
            uuid: "00001521-3d1c-019e-ab4a-65fd86e87333",
            kind: EndpointKind::Service,
        },
        EndpointId::CommandCharacteristic => EndpointMetadata {
            name: "peripheral command characteristic",
            uuid: "00001523-3d1c-019e-ab4a-65fd86e87333",
            kind: EndpointKind::Characteristic,
        },
    }
}
