mod btleplug_transport;
mod fake_transport;
mod model;
mod pool;
mod sweeper;
mod transport;

pub use self::btleplug_transport::BtleplugTransport;
pub use self::fake_transport::{DeviceFixture, FakeTransport, FakeTransportConfig, RecordedWrite};
pub use self::model::{ConnectionStatus, LinkId, PeripheralAddress};
pub use self::pool::ConnectionPool;
pub use self::sweeper::DisconnectSweeper;
pub use self::transport::{BleTransport, PeripheralLink};
