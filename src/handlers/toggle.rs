use crate::ble::{ConnectionPool, PeripheralAddress};
use crate::codec::{RangeError, encode_big_endian, encode_hex};
use crate::error::GatewayError;

use super::FrameBuilder;

/// Base opcode for toggle payloads; the low bit carries the state.
const TOGGLE_OPCODE: u16 = 0x0600;
const TOGGLE_WIDTH: usize = 2;

/// Requested sub-device power state.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Toggle {
    /// Switch the sub-device off.
    Off,
    /// Switch the sub-device on.
    On,
}

impl Toggle {
    fn as_state_bit(self) -> u16 {
        match self {
            Self::Off => 0x00,
            Self::On => 0x01,
        }
    }
}

impl From<bool> for Toggle {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// Handler for on/off toggle commands.
pub struct ToggleHandler;

impl ToggleHandler {
    /// Encodes the 2-byte big-endian toggle payload.
    ///
    /// ```
    /// use blegate::{Toggle, ToggleHandler};
    ///
    /// assert_eq!(vec![0x06, 0x01], ToggleHandler::encode(Toggle::On)?);
    /// assert_eq!(vec![0x06, 0x00], ToggleHandler::encode(Toggle::Off)?);
    /// # Ok::<(), blegate::RangeError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error when the opcode does not fit the payload width; the
    /// fixed opcode always fits.
    pub fn encode(toggle: Toggle) -> Result<Vec<u8>, RangeError> {
        encode_big_endian(u64::from(TOGGLE_OPCODE | toggle.as_state_bit()), TOGGLE_WIDTH)
    }

    /// Sends a toggle command through the connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error when frame assembly fails or the pooled write fails.
    pub async fn set(
        pool: &ConnectionPool,
        address: &PeripheralAddress,
        prefix: &str,
        device_id: &str,
        toggle: Toggle,
    ) -> Result<(), GatewayError> {
        let payload = encode_hex(&Self::encode(toggle)?);
        let frame = FrameBuilder::build(prefix, device_id, &payload)?;
        pool.write(address, &frame).await
    }
}
