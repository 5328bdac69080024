use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{info, instrument, warn};

use crate::ble::PeripheralAddress;
use crate::error::GatewayError;
use crate::handlers::{Brightness, BrightnessHandler, RawWriteHandler, ToggleHandler};

use super::AppState;
use super::messages::{
    BrightnessSetRequest, ConnectionCountResponse, DisconnectAllResponse, ErrorResponse,
    OkResponse, RawWriteRequest, ToggleSetRequest,
};

/// Failure surfaced to an HTTP caller.
///
/// Validation failures (malformed JSON, out-of-range values, bad hex) map to
/// 400, radio failures to 502, and anything else to 500; the body always
/// carries `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be decoded into a command.
    Validation(String),
    /// Command translation or the pooled BLE operation failed.
    Gateway(GatewayError),
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        Self::Gateway(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message),
            Self::Gateway(error) if error.is_pre_radio() => {
                (StatusCode::BAD_REQUEST, error.to_string())
            }
            Self::Gateway(error @ GatewayError::Internal { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
            Self::Gateway(error) => (StatusCode::BAD_GATEWAY, error.to_string()),
        };

        warn!(%status, error = %message, "command failed");
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

fn accept<T>(request: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(request) = request.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    Ok(request)
}

/// Liveness check.
pub async fn health() -> &'static str {
    "OK"
}

/// Raw pass-through write: decodes the hex payload and sends it unchanged.
#[instrument(skip_all)]
pub async fn raw_write(
    State(state): State<Arc<AppState>>,
    request: Result<Json<RawWriteRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let request = accept(request)?;
    let address = PeripheralAddress::new(&request.address);

    info!(%address, "raw write command accepted");
    RawWriteHandler::write(&state.pool, &address, &request.payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Brightness command: validates the percentage and sends the encoded frame.
#[instrument(skip_all)]
pub async fn brightness_set(
    State(state): State<Arc<AppState>>,
    request: Result<Json<BrightnessSetRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let request = accept(request)?;
    let address = PeripheralAddress::new(&request.address);
    let brightness = Brightness::new(request.value).map_err(GatewayError::from)?;

    info!(%address, percent = brightness.percent(), "brightness command accepted");
    BrightnessHandler::set(
        &state.pool,
        &address,
        &request.payload_prefix,
        &request.device_id,
        brightness,
    )
    .await?;
    Ok(Json(OkResponse::ok()))
}

/// Toggle command: validates the on/off value and sends the encoded frame.
#[instrument(skip_all)]
pub async fn toggle_set(
    State(state): State<Arc<AppState>>,
    request: Result<Json<ToggleSetRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let request = accept(request)?;
    let address = PeripheralAddress::new(&request.address);
    let toggle = request
        .value
        .into_toggle()
        .map_err(GatewayError::from)?;

    info!(%address, ?toggle, "toggle command accepted");
    ToggleHandler::set(
        &state.pool,
        &address,
        &request.payload_prefix,
        &request.device_id,
        toggle,
    )
    .await?;
    Ok(Json(OkResponse::ok()))
}

/// Disconnects every pooled peripheral, best-effort.
#[instrument(skip_all)]
pub async fn disconnect_all(
    State(state): State<Arc<AppState>>,
) -> Json<DisconnectAllResponse> {
    let total_disconnected = state.pool.disconnect_all().await;
    Json(DisconnectAllResponse { total_disconnected })
}

/// Reports how many peripherals the pool currently tracks.
pub async fn count_connections(
    State(state): State<Arc<AppState>>,
) -> Json<ConnectionCountResponse> {
    let total = state.pool.count_connections().await;
    Json(ConnectionCountResponse { total })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::codec::DecodeError;
    use crate::error::{ConnectionError, WriteError};
    use crate::handlers::BrightnessError;

    use super::*;

    #[rstest]
    #[case(
        ApiError::Validation("missing field `address`".to_string()),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        ApiError::Gateway(GatewayError::Decode(DecodeError::OddLength { len: 3 })),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        ApiError::Gateway(GatewayError::Brightness(BrightnessError::OutOfRange {
            value: 101,
            min: 0,
            max: 100,
        })),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        ApiError::Gateway(GatewayError::Connection(ConnectionError::NoAdapters)),
        StatusCode::BAD_GATEWAY
    )]
    #[case(
        ApiError::Gateway(GatewayError::Write(WriteError::WriteRefused {
            address: "AA:BB".to_string(),
        })),
        StatusCode::BAD_GATEWAY
    )]
    #[case(
        ApiError::Gateway(GatewayError::Internal {
            message: "missing link".to_string(),
        }),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn api_errors_map_to_stable_status_codes(
        #[case] error: ApiError,
        #[case] expected: StatusCode,
    ) {
        let response = error.into_response();
        assert_eq!(expected, response.status());
    }
}
