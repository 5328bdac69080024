use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::error::{ConnectionError, GatewayError};
use crate::protocol::CONNECT_TIMEOUT;
use crate::utils::format_hex;

use super::model::{ConnectionStatus, LinkId, PeripheralAddress};
use super::transport::{BleTransport, PeripheralLink};

/// One pooled logical connection to a peripheral.
struct Connection {
    address: PeripheralAddress,
    status: ConnectionStatus,
    link: Option<Box<dyn PeripheralLink>>,
}

impl Connection {
    fn disconnected(address: PeripheralAddress) -> Self {
        Self {
            address,
            status: ConnectionStatus::Disconnected,
            link: None,
        }
    }

    fn holds_link(&self, link: &LinkId) -> bool {
        self.status == ConnectionStatus::Connected
            && self.link.as_ref().is_some_and(|held| held.id() == link)
    }
}

/// Registry of reusable peripheral connections, keyed by address.
///
/// One async mutex guards the registry and every BLE operation performed on
/// its entries, so exactly one radio operation is in flight at a time and no
/// two callers race a connect attempt for the same address. Entries are
/// evicted on any connect or write failure and on peer-initiated
/// disconnects; the next write to that address starts from a fresh connect.
pub struct ConnectionPool {
    transport: Arc<dyn BleTransport>,
    entries: Mutex<HashMap<PeripheralAddress, Connection>>,
}

impl ConnectionPool {
    /// Creates an empty pool over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn BleTransport>) -> Self {
        Self {
            transport,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Writes `frame` to the peripheral, connecting first when needed.
    ///
    /// The write is acknowledged; it does not return until the peripheral
    /// link layer confirms receipt. Any failure evicts the address from the
    /// pool before the error is surfaced.
    ///
    /// # Errors
    ///
    /// Returns an error when the connect handshake fails or times out, or
    /// when the acknowledged write is rejected.
    #[instrument(skip(self, frame), level = "debug", fields(%address, frame_len = frame.len()))]
    pub async fn write(
        &self,
        address: &PeripheralAddress,
        frame: &[u8],
    ) -> Result<(), GatewayError> {
        let mut entries = self.entries.lock().await;

        let connection = entries
            .entry(address.clone())
            .or_insert_with(|| Connection::disconnected(address.clone()));
        if let Err(error) = self.ensure_connected(connection).await {
            entries.remove(address);
            return Err(error.into());
        }

        let link = entries
            .get(address)
            .and_then(|connection| connection.link.as_ref());
        let Some(link) = link else {
            entries.remove(address);
            return Err(GatewayError::Internal {
                message: format!("pool entry for `{address}` is connected but holds no link"),
            });
        };

        info!(payload = %format_hex(frame), "sending payload to peripheral");
        if let Err(error) = link.write(frame).await {
            entries.remove(address);
            return Err(error.into());
        }
        Ok(())
    }

    /// Connects an entry that is not yet Connected.
    ///
    /// The fixed connect timeout bounds the handshake; callers evict the
    /// entry on any error returned here.
    async fn ensure_connected(&self, connection: &mut Connection) -> Result<(), ConnectionError> {
        if connection.status == ConnectionStatus::Connected {
            return Ok(());
        }

        connection.status = ConnectionStatus::Connecting;
        match timeout(CONNECT_TIMEOUT, self.transport.connect(&connection.address)).await {
            Ok(Ok(link)) => {
                debug!(address = %connection.address, link = %link.id(), "connected to peripheral");
                connection.link = Some(link);
                connection.status = ConnectionStatus::Connected;
                Ok(())
            }
            Ok(Err(error)) => Err(error),
            Err(_elapsed) => Err(ConnectionError::Timeout {
                address: connection.address.to_string(),
                timeout_secs: CONNECT_TIMEOUT.as_secs(),
            }),
        }
    }

    /// Disconnects every Connected entry, best-effort.
    ///
    /// Entries whose disconnect fails are logged and left in place; the
    /// sweep always runs to completion and never raises. Returns how many
    /// disconnects actually succeeded.
    #[instrument(skip(self), level = "debug")]
    pub async fn disconnect_all(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let addresses: Vec<PeripheralAddress> = entries.keys().cloned().collect();

        let mut disconnected = 0usize;
        for address in addresses {
            let Some(connection) = entries.get(&address) else {
                continue;
            };
            if connection.status != ConnectionStatus::Connected {
                continue;
            }
            let Some(link) = connection.link.as_ref() else {
                continue;
            };

            match link.disconnect().await {
                Ok(()) => {
                    entries.remove(&address);
                    disconnected += 1;
                }
                Err(error) => {
                    warn!(%address, %error, "failed to disconnect pooled peripheral");
                }
            }
        }

        info!(disconnected, "disconnected pooled peripherals");
        disconnected
    }

    /// Returns the current pool size.
    ///
    /// Diagnostic only; the value may be stale by the time the caller
    /// observes it.
    pub async fn count_connections(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns a snapshot of the tracked addresses.
    pub async fn tracked_addresses(&self) -> Vec<PeripheralAddress> {
        self.entries.lock().await.keys().cloned().collect()
    }

    /// Evicts the entry holding the given live link, if any.
    ///
    /// Invoked from the disconnect sweeper when a peripheral tears down its
    /// link unexpectedly. Returns whether an entry was removed; a miss means
    /// the entry was already evicted (e.g. by a failed write racing the
    /// peer disconnect) and the event is a no-op.
    #[instrument(skip(self), level = "debug", fields(%link))]
    pub async fn evict_link(&self, link: &LinkId) -> bool {
        let mut entries = self.entries.lock().await;
        let address = entries.iter().find_map(|(address, connection)| {
            connection.holds_link(link).then(|| address.clone())
        });

        match address {
            Some(address) => {
                entries.remove(&address);
                info!(%address, "evicted pool entry after peer disconnect");
                true
            }
            None => {
                debug!("peer disconnect for untracked link");
                false
            }
        }
    }
}
