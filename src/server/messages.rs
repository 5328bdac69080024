use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::handlers::Toggle;

/// Body of a raw pass-through write command.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWriteRequest {
    /// Hardware address of the target peripheral.
    pub address: String,
    /// Frame as hexadecimal text, optionally `0x`-prefixed.
    pub payload: String,
}

/// Body of a brightness command.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrightnessSetRequest {
    pub address: String,
    /// Sub-device identifier as hexadecimal text.
    pub device_id: String,
    /// Frame prefix as hexadecimal text.
    pub payload_prefix: String,
    /// Brightness percentage, `0..=100`.
    pub value: u8,
}

/// Body of an on/off toggle command.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSetRequest {
    pub address: String,
    pub device_id: String,
    pub payload_prefix: String,
    pub value: ToggleValue,
}

/// Toggle state as accepted on the wire: a boolean, or the numbers 0/1.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ToggleValue {
    Flag(bool),
    Bit(u64),
}

impl ToggleValue {
    /// Converts the wire value into a toggle state.
    ///
    /// # Errors
    ///
    /// Returns an error for numeric values other than 0 and 1.
    pub fn into_toggle(self) -> Result<Toggle, ValidationError> {
        match self {
            Self::Flag(on) => Ok(Toggle::from(on)),
            Self::Bit(0) => Ok(Toggle::Off),
            Self::Bit(1) => Ok(Toggle::On),
            Self::Bit(value) => Err(ValidationError::InvalidToggleBit { value }),
        }
    }
}

/// Acknowledgement body for commands with no result payload.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub result: &'static str,
}

impl OkResponse {
    pub(crate) fn ok() -> Self {
        Self { result: "ok" }
    }
}

/// Error body returned for every failed command.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result body of a bulk disconnect.
#[derive(Debug, Serialize)]
pub struct DisconnectAllResponse {
    pub total_disconnected: usize,
}

/// Result body of a connection count query.
#[derive(Debug, Serialize)]
pub struct ConnectionCountResponse {
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn brightness_request_uses_camel_case_fields() {
        let request: BrightnessSetRequest = serde_json::from_value(serde_json::json!({
            "address": "AA:BB:CC:DD:EE:FF",
            "deviceId": "01",
            "payloadPrefix": "AABB",
            "value": 50,
        }))
        .expect("request body should deserialize");

        assert_eq!("01", request.device_id);
        assert_eq!("AABB", request.payload_prefix);
        assert_eq!(50, request.value);
    }

    #[rstest]
    #[case(serde_json::json!(true), Toggle::On)]
    #[case(serde_json::json!(false), Toggle::Off)]
    #[case(serde_json::json!(1), Toggle::On)]
    #[case(serde_json::json!(0), Toggle::Off)]
    fn toggle_value_accepts_booleans_and_bits(
        #[case] raw: serde_json::Value,
        #[case] expected: Toggle,
    ) {
        let value: ToggleValue =
            serde_json::from_value(raw).expect("toggle value should deserialize");
        let toggle = value.into_toggle().expect("toggle value should convert");
        assert_eq!(expected, toggle);
    }

    #[test]
    fn toggle_value_rejects_other_numbers() {
        let value: ToggleValue =
            serde_json::from_value(serde_json::json!(2)).expect("number should deserialize");
        assert_matches!(
            value.into_toggle(),
            Err(ValidationError::InvalidToggleBit { value: 2 })
        );
    }

    #[test]
    fn ok_response_serialises_to_the_fixed_shape() {
        let body = serde_json::to_value(OkResponse::ok()).expect("response should serialize");
        assert_eq!(serde_json::json!({"result": "ok"}), body);
    }
}
