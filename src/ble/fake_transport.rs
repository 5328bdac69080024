use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use strum_macros::EnumString;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::error::{ConnectionError, FixtureError, WriteError};

use super::model::{LinkId, PeripheralAddress};
use super::transport::{BleTransport, PeripheralLink};

/// Scripted behaviour of one fake peripheral.
#[derive(Debug, Clone, Copy, Eq, PartialEq, EnumString)]
#[strum(serialize_all = "kebab-case")]
enum FakeOutcome {
    /// Connects and acknowledges every write.
    Ok,
    /// Rejects the connect handshake.
    RefuseConnect,
    /// Connects, then rejects every write.
    RefuseWrite,
    /// Connects and accepts writes, then rejects explicit disconnects.
    RefuseDisconnect,
}

/// Scripted peripheral set for the fake transport.
///
/// Parsed from semicolon-separated records of pipe-delimited fields:
///
/// ```text
/// AA:BB:CC:DD:EE:FF|ok;11:22:33:44:55:66|refuse-connect
/// ```
#[derive(Debug, Clone)]
pub struct DeviceFixture {
    devices: HashMap<PeripheralAddress, FakeOutcome>,
}

impl DeviceFixture {
    fn outcome(&self, address: &PeripheralAddress) -> Option<FakeOutcome> {
        self.devices.get(address).copied()
    }
}

impl FromStr for DeviceFixture {
    type Err = FixtureError;

    fn from_str(fixture: &str) -> Result<Self, Self::Err> {
        if fixture.trim().is_empty() {
            return Err(FixtureError::EmptyFixture);
        }

        let mut devices = HashMap::new();
        for record in fixture.split(';') {
            let fields: Vec<&str> = record.split('|').map(str::trim).collect();
            let [address, outcome] = fields.as_slice() else {
                return Err(FixtureError::InvalidRecordFieldCount);
            };
            if address.is_empty() || outcome.is_empty() {
                return Err(FixtureError::EmptyRecordField);
            }

            let outcome =
                FakeOutcome::from_str(outcome).map_err(|_| FixtureError::UnknownOutcome {
                    value: (*outcome).to_owned(),
                })?;
            devices.insert(PeripheralAddress::new(address), outcome);
        }
        Ok(Self { devices })
    }
}

/// Configuration of the fake transport.
#[derive(Debug, Clone, Builder)]
pub struct FakeTransportConfig {
    /// Scripted peripherals and their behaviour.
    devices: DeviceFixture,
    /// Optional artificial delay applied to every connect handshake.
    connect_delay: Option<Duration>,
}

/// One frame accepted by a fake peripheral, in arrival order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RecordedWrite {
    pub address: PeripheralAddress,
    pub frame: Vec<u8>,
}

#[derive(Default)]
struct FakeState {
    connect_attempts: HashMap<PeripheralAddress, usize>,
    writes: Vec<RecordedWrite>,
    live_links: HashMap<PeripheralAddress, LinkId>,
    next_link: u64,
    disconnect_tx: Option<mpsc::Sender<LinkId>>,
}

/// In-memory transport driven entirely by a scripted fixture.
///
/// No radio is touched; connect handshakes and acknowledged writes resolve
/// against the fixture, and every accepted frame is recorded for
/// inspection. Used by the test suites and by the gateway's fake runtime
/// mode.
pub struct FakeTransport {
    config: FakeTransportConfig,
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    /// Creates a fake transport over the given configuration.
    #[must_use]
    pub fn new(config: FakeTransportConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Number of connect handshakes attempted against `address`.
    #[must_use]
    pub fn connect_attempts(&self, address: &PeripheralAddress) -> usize {
        self.state()
            .connect_attempts
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Every frame accepted so far, in arrival order.
    #[must_use]
    pub fn recorded_writes(&self) -> Vec<RecordedWrite> {
        self.state().writes.clone()
    }

    /// Identifier of the live link to `address`, if one is up.
    #[must_use]
    pub fn live_link(&self, address: &PeripheralAddress) -> Option<LinkId> {
        self.state().live_links.get(address).cloned()
    }

    /// Simulates the peripheral tearing its link down.
    ///
    /// Emits the link's identifier on the disconnect event stream, if one
    /// was opened. Returns the identifier of the dropped link, or `None`
    /// when no link to `address` is up.
    pub async fn inject_peer_disconnect(
        &self,
        address: &PeripheralAddress,
    ) -> Option<LinkId> {
        let (link, sender) = {
            let mut state = self.state();
            let link = state.live_links.remove(address)?;
            (link, state.disconnect_tx.clone())
        };

        if let Some(sender) = sender {
            // Receiver may already be gone during shutdown.
            let _ = sender.send(link.clone()).await;
        }
        Some(link)
    }
}

#[async_trait]
impl BleTransport for FakeTransport {
    #[instrument(skip(self), level = "debug", fields(%address))]
    async fn connect(
        &self,
        address: &PeripheralAddress,
    ) -> Result<Box<dyn PeripheralLink>, ConnectionError> {
        if let Some(delay) = self.config.connect_delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = {
            let mut state = self.state();
            *state.connect_attempts.entry(address.clone()).or_insert(0) += 1;
            self.config.devices.outcome(address)
        };

        match outcome {
            None => Err(ConnectionError::NotScripted {
                address: address.to_string(),
            }),
            Some(FakeOutcome::RefuseConnect) => Err(ConnectionError::ConnectRefused {
                address: address.to_string(),
            }),
            Some(outcome) => {
                let link = {
                    let mut state = self.state();
                    state.next_link += 1;
                    let link = LinkId::new(format!("fake-link-{}", state.next_link));
                    state.live_links.insert(address.clone(), link.clone());
                    link
                };
                debug!(%link, "fake connect handshake complete");
                Ok(Box::new(FakeLink {
                    id: link,
                    address: address.clone(),
                    refuse_writes: outcome == FakeOutcome::RefuseWrite,
                    refuse_disconnects: outcome == FakeOutcome::RefuseDisconnect,
                    state: Arc::clone(&self.state),
                }))
            }
        }
    }

    async fn disconnect_events(&self) -> Result<mpsc::Receiver<LinkId>, ConnectionError> {
        let (sender, receiver) = mpsc::channel(16);
        self.state().disconnect_tx = Some(sender);
        Ok(receiver)
    }
}

struct FakeLink {
    id: LinkId,
    address: PeripheralAddress,
    refuse_writes: bool,
    refuse_disconnects: bool,
    state: Arc<Mutex<FakeState>>,
}

impl FakeLink {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl PeripheralLink for FakeLink {
    fn id(&self) -> &LinkId {
        &self.id
    }

    async fn write(&self, frame: &[u8]) -> Result<(), WriteError> {
        let mut state = self.state();
        let live = state
            .live_links
            .get(&self.address)
            .is_some_and(|held| held == &self.id);
        if !live {
            return Err(WriteError::LinkLost {
                address: self.address.to_string(),
            });
        }
        if self.refuse_writes {
            return Err(WriteError::WriteRefused {
                address: self.address.to_string(),
            });
        }

        state.writes.push(RecordedWrite {
            address: self.address.clone(),
            frame: frame.to_vec(),
        });
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ConnectionError> {
        if self.refuse_disconnects {
            return Err(ConnectionError::DisconnectRefused {
                address: self.address.to_string(),
            });
        }

        self.state().live_links.remove(&self.address);
        Ok(())
    }
}
