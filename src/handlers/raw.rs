use crate::ble::{ConnectionPool, PeripheralAddress};
use crate::codec::{decode_hex, strip_hex_marker};
use crate::error::GatewayError;

/// Handler for raw pass-through writes.
///
/// The payload is expected as hexadecimal text, typically copied verbatim
/// from a packet capture (e.g. `adbacd02c0010601`).
pub struct RawWriteHandler;

impl RawWriteHandler {
    /// Decodes the payload and writes it through the connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload is not valid hexadecimal or the
    /// pooled write fails.
    pub async fn write(
        pool: &ConnectionPool,
        address: &PeripheralAddress,
        payload: &str,
    ) -> Result<(), GatewayError> {
        let frame = decode_hex(strip_hex_marker(payload))?;
        pool.write(address, &frame).await
    }
}
