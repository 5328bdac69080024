use crate::codec::{DecodeError, decode_hex, strip_hex_marker};

/// Assembles outbound command frames from hexadecimal fragments.
pub struct FrameBuilder;

impl FrameBuilder {
    /// Builds a frame as `prefix ++ device_id ++ payload`.
    ///
    /// Each fragment is independently stripped of one leading `0x` marker
    /// before the concatenated text is decoded.
    ///
    /// # Errors
    ///
    /// Returns an error when the concatenated text is not valid hexadecimal.
    ///
    /// ```
    /// use blegate::FrameBuilder;
    ///
    /// let frame = FrameBuilder::build("0xAABB", "01", "0601")?;
    /// assert_eq!(vec![0xAA, 0xBB, 0x01, 0x06, 0x01], frame);
    /// # Ok::<(), blegate::DecodeError>(())
    /// ```
    pub fn build(prefix: &str, device_id: &str, payload: &str) -> Result<Vec<u8>, DecodeError> {
        let prefix = strip_hex_marker(prefix);
        let device_id = strip_hex_marker(device_id);
        let payload = strip_hex_marker(payload);

        let mut combined = String::with_capacity(prefix.len() + device_id.len() + payload.len());
        combined.push_str(prefix);
        combined.push_str(device_id);
        combined.push_str(payload);
        decode_hex(&combined)
    }
}
