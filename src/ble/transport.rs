use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{ConnectionError, WriteError};

use super::model::{LinkId, PeripheralAddress};

/// Transport seam between the connection pool and the radio.
///
/// The pool is written against this trait so it runs unchanged on the real
/// `btleplug` backend and on the scriptable fake.
#[async_trait]
pub trait BleTransport: Send + Sync {
    /// Performs the connect handshake with one peripheral.
    ///
    /// A successful connect has already resolved the fixed control service
    /// and command characteristic; the returned link is ready to write.
    ///
    /// # Errors
    ///
    /// Returns an error when the peripheral cannot be reached or does not
    /// expose the required endpoints.
    async fn connect(
        &self,
        address: &PeripheralAddress,
    ) -> Result<Box<dyn PeripheralLink>, ConnectionError>;

    /// Opens the stream of unsolicited peer-disconnect events.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport cannot observe link events.
    async fn disconnect_events(&self) -> Result<mpsc::Receiver<LinkId>, ConnectionError>;
}

/// One live, exclusively-owned link to a peripheral.
#[async_trait]
pub trait PeripheralLink: Send + Sync {
    /// Identifier matching the transport's disconnect events.
    fn id(&self) -> &LinkId;

    /// Performs an acknowledged write of `frame` to the command
    /// characteristic.
    ///
    /// # Errors
    ///
    /// Returns an error when the peripheral rejects the write or the link
    /// is lost mid-write.
    async fn write(&self, frame: &[u8]) -> Result<(), WriteError>;

    /// Tears the link down.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport fails to release the link.
    async fn disconnect(&self) -> Result<(), ConnectionError>;
}
