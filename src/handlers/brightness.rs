use thiserror::Error;

use crate::ble::{ConnectionPool, PeripheralAddress};
use crate::codec::{RangeError, encode_big_endian, encode_hex};
use crate::error::GatewayError;

use super::FrameBuilder;

const MIN_PERCENT: u8 = 0;
const MAX_PERCENT: u8 = 100;

/// Intensity emitted for 0 % brightness.
const INTENSITY_FLOOR: u32 = 0x0008_0000;
/// Intensity emitted for 100 % brightness.
const INTENSITY_CEIL: u32 = 0x0008_4E20;
const INTENSITY_WIDTH: usize = 3;

/// Errors returned by brightness validation.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum BrightnessError {
    /// The brightness percentage was outside the accepted range.
    #[error("brightness {value} is out of range ({min}..={max})")]
    OutOfRange { value: u8, min: u8, max: u8 },
}

/// Validated brightness percentage in the inclusive range `0..=100`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Brightness(u8);

impl Brightness {
    /// Creates a validated brightness value.
    ///
    /// # Errors
    ///
    /// Returns an error when `value` is outside `0..=100`.
    ///
    /// ```
    /// use blegate::Brightness;
    ///
    /// let value = Brightness::new(42)?;
    /// assert_eq!(42, value.percent());
    /// # Ok::<(), blegate::BrightnessError>(())
    /// ```
    pub fn new(value: u8) -> Result<Self, BrightnessError> {
        if !(MIN_PERCENT..=MAX_PERCENT).contains(&value) {
            return Err(BrightnessError::OutOfRange {
                value,
                min: MIN_PERCENT,
                max: MAX_PERCENT,
            });
        }

        Ok(Self(value))
    }

    /// Returns the underlying percentage.
    #[must_use]
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Returns the raw intensity this percentage maps to.
    ///
    /// The curve interpolates linearly between the firmware's floor and
    /// ceiling intensities, truncating toward zero.
    #[must_use]
    pub fn intensity(self) -> u32 {
        INTENSITY_FLOOR + (INTENSITY_CEIL - INTENSITY_FLOOR) * u32::from(self.0) / 100
    }
}

/// Handler for brightness commands.
pub struct BrightnessHandler;

impl BrightnessHandler {
    /// Encodes the 3-byte big-endian intensity payload.
    ///
    /// ```
    /// use blegate::{Brightness, BrightnessHandler};
    ///
    /// let payload = BrightnessHandler::encode(Brightness::new(100)?)?;
    /// assert_eq!(vec![0x08, 0x4E, 0x20], payload);
    /// # Ok::<(), blegate::GatewayError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error when the intensity does not fit the payload width;
    /// validated percentages always fit.
    pub fn encode(brightness: Brightness) -> Result<Vec<u8>, RangeError> {
        encode_big_endian(u64::from(brightness.intensity()), INTENSITY_WIDTH)
    }

    /// Sends a brightness command through the connection pool.
    ///
    /// The outbound frame is `prefix ++ device_id ++ intensity`, with the
    /// hex inputs taken verbatim from the inbound command.
    ///
    /// # Errors
    ///
    /// Returns an error when frame assembly fails or the pooled write fails.
    pub async fn set(
        pool: &ConnectionPool,
        address: &PeripheralAddress,
        prefix: &str,
        device_id: &str,
        brightness: Brightness,
    ) -> Result<(), GatewayError> {
        let payload = encode_hex(&Self::encode(brightness)?);
        let frame = FrameBuilder::build(prefix, device_id, &payload)?;
        pool.write(address, &frame).await
    }
}
