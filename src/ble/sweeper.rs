use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::ConnectionError;

use super::pool::ConnectionPool;
use super::transport::BleTransport;

/// Background task that evicts pool entries when peripherals drop their
/// links.
///
/// Without it a peripheral powering off mid-session would leave a stale
/// Connected entry behind, and the next write to that address would fail
/// instead of reconnecting.
pub struct DisconnectSweeper {
    handle: JoinHandle<()>,
}

impl DisconnectSweeper {
    /// Subscribes to the transport's disconnect events and starts sweeping.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport cannot observe link events.
    pub async fn spawn(
        transport: Arc<dyn BleTransport>,
        pool: Arc<ConnectionPool>,
    ) -> Result<Self, ConnectionError> {
        let mut events = transport.disconnect_events().await?;
        let handle = tokio::spawn(async move {
            while let Some(link) = events.recv().await {
                debug!(%link, "observed peer disconnect");
                pool.evict_link(&link).await;
            }
            info!("disconnect event stream closed; sweeper stopping");
        });
        Ok(Self { handle })
    }

    /// Stops the sweeper task.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for DisconnectSweeper {
    fn drop(&mut self) {
        self.abort();
    }
}
