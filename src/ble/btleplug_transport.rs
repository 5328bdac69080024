use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    PeripheralProperties, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tracing::{debug, info, instrument};

use crate::error::{ConnectionError, WriteError};
use crate::protocol::{EndpointId, endpoint_metadata};

use super::model::{LinkId, PeripheralAddress};
use super::transport::{BleTransport, PeripheralLink};

const SCAN_SWEEP_INTERVAL: Duration = Duration::from_millis(250);

/// Transport backed by `btleplug`.
#[derive(Debug)]
pub struct BtleplugTransport {
    manager: Manager,
}

impl BtleplugTransport {
    /// Creates the real BLE transport.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform BLE session cannot be opened.
    pub async fn new() -> Result<Self, ConnectionError> {
        let manager = Manager::new().await?;
        Ok(Self { manager })
    }

    #[instrument(skip(self), level = "trace")]
    async fn adapters(&self) -> Result<Vec<Adapter>, ConnectionError> {
        let adapters = self.manager.adapters().await?;
        if adapters.is_empty() {
            return Err(ConnectionError::NoAdapters);
        }
        Ok(adapters)
    }

    /// Scans until the addressed peripheral appears, then connects.
    ///
    /// The scan itself is unbounded; callers bound the whole handshake with
    /// their own timeout. The scan guard stops the adapters whether the
    /// search succeeds, fails, or is cancelled by that timeout.
    async fn find_and_connect(
        &self,
        address: &PeripheralAddress,
    ) -> Result<Peripheral, ConnectionError> {
        let adapters = self.adapters().await?;
        info!(
            adapter_count = adapters.len(),
            "starting BLE scan for addressed peripheral"
        );

        let scan = ScanGuard::start(adapters).await?;
        let peripheral = loop {
            if let Some(peripheral) = find_matching_peripheral(scan.adapters(), address).await? {
                break peripheral;
            }
            sleep(SCAN_SWEEP_INTERVAL).await;
        };
        scan.stop().await;

        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }
        peripheral.discover_services().await?;
        info!(peripheral_id = %peripheral.id(), "connected to addressed peripheral");
        Ok(peripheral)
    }
}

/// Keeps adapter scans alive only while discovery is in flight.
///
/// Stopped explicitly on the success path; when the search future errors or
/// is cancelled mid-scan, the drop handler stops the scans from a detached
/// task (`stop_scan` is async and cannot run inside `Drop` directly).
struct ScanGuard {
    adapters: Vec<Adapter>,
}

impl ScanGuard {
    async fn start(adapters: Vec<Adapter>) -> Result<Self, ConnectionError> {
        let guard = Self { adapters };
        for adapter in &guard.adapters {
            adapter.start_scan(ScanFilter::default()).await?;
        }
        Ok(guard)
    }

    fn adapters(&self) -> &[Adapter] {
        &self.adapters
    }

    async fn stop(mut self) {
        for adapter in self.adapters.drain(..) {
            stop_scan_quietly(&adapter).await;
        }
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        if self.adapters.is_empty() {
            return;
        }
        let adapters = std::mem::take(&mut self.adapters);
        tokio::spawn(async move {
            for adapter in adapters {
                stop_scan_quietly(&adapter).await;
            }
        });
    }
}

async fn stop_scan_quietly(adapter: &Adapter) {
    if let Err(error) = adapter.stop_scan().await {
        debug!(?error, "failed to stop adapter scan cleanly");
    }
}

async fn find_matching_peripheral(
    adapters: &[Adapter],
    address: &PeripheralAddress,
) -> Result<Option<Peripheral>, ConnectionError> {
    for adapter in adapters {
        for peripheral in adapter.peripherals().await? {
            let Some(properties) = peripheral.properties().await? else {
                continue;
            };
            if matches_address(&properties, &peripheral.id().to_string(), address) {
                return Ok(Some(peripheral));
            }
        }
    }
    Ok(None)
}

#[async_trait]
impl BleTransport for BtleplugTransport {
    #[instrument(skip(self), level = "debug", fields(%address))]
    async fn connect(
        &self,
        address: &PeripheralAddress,
    ) -> Result<Box<dyn PeripheralLink>, ConnectionError> {
        let peripheral = self.find_and_connect(address).await?;

        let characteristic = match command_characteristic(&peripheral, address) {
            Ok(characteristic) => characteristic,
            Err(error) => {
                if let Err(disconnect_error) = peripheral.disconnect().await {
                    debug!(
                        ?disconnect_error,
                        "failed to disconnect after endpoint resolution error"
                    );
                }
                return Err(error);
            }
        };

        let id = LinkId::new(peripheral.id().to_string());
        Ok(Box::new(BtleplugLink {
            id,
            address: address.clone(),
            peripheral,
            characteristic,
        }))
    }

    async fn disconnect_events(&self) -> Result<mpsc::Receiver<LinkId>, ConnectionError> {
        let adapters = self.adapters().await?;
        let (sender, receiver) = mpsc::channel(16);

        for adapter in adapters {
            let mut events = adapter.events().await?;
            let sender = sender.clone();
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    if let CentralEvent::DeviceDisconnected(peripheral_id) = event {
                        let link = LinkId::new(peripheral_id.to_string());
                        if sender.send(link).await.is_err() {
                            break;
                        }
                    }
                }
            });
        }
        Ok(receiver)
    }
}

fn matches_address(
    properties: &PeripheralProperties,
    peripheral_id: &str,
    address: &PeripheralAddress,
) -> bool {
    let reported = properties.address.to_string();
    reported.eq_ignore_ascii_case(address.as_str())
        || peripheral_id.eq_ignore_ascii_case(address.as_str())
}

/// Resolves the acknowledged command characteristic on a connected
/// peripheral.
fn command_characteristic(
    peripheral: &Peripheral,
    address: &PeripheralAddress,
) -> Result<Characteristic, ConnectionError> {
    let service_uuid = endpoint_metadata(EndpointId::ControlService).uuid();
    let characteristic_uuid = endpoint_metadata(EndpointId::CommandCharacteristic).uuid();

    let service = peripheral
        .services()
        .into_iter()
        .find(|service| service.uuid.to_string().eq_ignore_ascii_case(service_uuid))
        .ok_or_else(|| ConnectionError::MissingEndpoint {
            endpoint: EndpointId::ControlService,
            address: address.to_string(),
        })?;

    service
        .characteristics
        .into_iter()
        .find(|characteristic| {
            characteristic
                .uuid
                .to_string()
                .eq_ignore_ascii_case(characteristic_uuid)
                && characteristic.properties.contains(CharPropFlags::WRITE)
        })
        .ok_or_else(|| ConnectionError::MissingEndpoint {
            endpoint: EndpointId::CommandCharacteristic,
            address: address.to_string(),
        })
}

/// Live link bound to a real peripheral.
#[derive(Debug)]
struct BtleplugLink {
    id: LinkId,
    address: PeripheralAddress,
    peripheral: Peripheral,
    characteristic: Characteristic,
}

#[async_trait]
impl PeripheralLink for BtleplugLink {
    fn id(&self) -> &LinkId {
        &self.id
    }

    #[instrument(skip(self, frame), level = "trace", fields(link = %self.id, frame_len = frame.len()))]
    async fn write(&self, frame: &[u8]) -> Result<(), WriteError> {
        self.peripheral
            .write(&self.characteristic, frame, WriteType::WithResponse)
            .await
            .map_err(|source| WriteError::Rejected {
                address: self.address.to_string(),
                source,
            })
    }

    #[instrument(skip(self), level = "debug", fields(link = %self.id))]
    async fn disconnect(&self) -> Result<(), ConnectionError> {
        if self.peripheral.is_connected().await? {
            self.peripheral.disconnect().await?;
        }
        Ok(())
    }
}
