use thiserror::Error;

use crate::codec::{DecodeError, RangeError};
use crate::handlers::BrightnessError;
use crate::protocol::{EndpointId, endpoint_metadata};

/// Errors returned by the connect handshake.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("BLE operation failed")]
    Ble(#[from] btleplug::Error),
    #[error("no BLE adapters were found")]
    NoAdapters,
    #[error("connect handshake with `{address}` did not complete within {timeout_secs}s")]
    Timeout { address: String, timeout_secs: u64 },
    #[error(
        "required {kind} `{name}` ({uuid}) was not found on `{address}`",
        kind = endpoint_metadata(*endpoint).kind(),
        name = endpoint_metadata(*endpoint).name(),
        uuid = endpoint_metadata(*endpoint).uuid()
    )]
    MissingEndpoint {
        endpoint: EndpointId,
        address: String,
    },
    #[error("no peripheral `{address}` is scripted in the fake transport fixture")]
    NotScripted { address: String },
    #[error("the fake transport refused to connect to `{address}`")]
    ConnectRefused { address: String },
    #[error("the fake transport refused to disconnect from `{address}`")]
    DisconnectRefused { address: String },
}

/// Errors returned by an acknowledged characteristic write.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("acknowledged write to `{address}` was rejected")]
    Rejected {
        address: String,
        #[source]
        source: btleplug::Error,
    },
    #[error("the fake transport refused the write to `{address}`")]
    WriteRefused { address: String },
    #[error("link to `{address}` was lost before the write completed")]
    LinkLost { address: String },
}

/// Errors detected while translating an inbound command, before any BLE I/O.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("toggle value must be a boolean or 0/1, got {value}")]
    InvalidToggleBit { value: u64 },
}

/// Errors returned when parsing fake transport fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("the fake device fixture is empty")]
    EmptyFixture,
    #[error("fixture records must contain two pipe-delimited fields")]
    InvalidRecordFieldCount,
    #[error("fixture records cannot contain empty fields")]
    EmptyRecordField,
    #[error(
        "unknown fixture outcome `{value}`; expected ok, refuse-connect, refuse-write, or refuse-disconnect"
    )]
    UnknownOutcome { value: String },
}

/// Errors returned by telemetry initialisation.
#[derive(Debug, Error)]
pub(crate) enum TelemetryError {
    #[error("failed to install tracing subscriber")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Top-level gateway errors wrapping module-specific error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Brightness(#[from] BrightnessError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("unexpected gateway failure: {message}")]
    Internal { message: String },
}

impl GatewayError {
    /// Whether the failure was detected before any BLE I/O took place.
    #[must_use]
    pub fn is_pre_radio(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::Range(_) | Self::Brightness(_) | Self::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_endpoint_messages_name_the_endpoint_kind_and_uuid() {
        let service = ConnectionError::MissingEndpoint {
            endpoint: EndpointId::ControlService,
            address: "AA:BB:CC:DD:EE:FF".to_string(),
        };
        assert_eq!(
            "required service `peripheral control service` \
             (00001521-3d1c-019e-ab4a-65fd86e87333) was not found on `AA:BB:CC:DD:EE:FF`",
            service.to_string()
        );

        let characteristic = ConnectionError::MissingEndpoint {
            endpoint: EndpointId::CommandCharacteristic,
            address: "AA:BB:CC:DD:EE:FF".to_string(),
        };
        assert_eq!(
            "required characteristic `peripheral command characteristic` \
             (00001523-3d1c-019e-ab4a-65fd86e87333) was not found on `AA:BB:CC:DD:EE:FF`",
            characteristic.to_string()
        );
    }
}
