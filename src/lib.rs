mod app;
mod ble;
mod cli;
mod codec;
mod error;
mod handlers;
mod protocol;
mod server;
mod telemetry;
mod utils;

pub use app::run;
pub use ble::{
    BleTransport, BtleplugTransport, ConnectionPool, ConnectionStatus, DeviceFixture,
    DisconnectSweeper, FakeTransport, FakeTransportConfig, LinkId, PeripheralAddress,
    PeripheralLink, RecordedWrite,
};
pub use cli::{Args, LogLevel};
pub use codec::{DecodeError, RangeError, decode_hex, encode_big_endian, encode_hex, strip_hex_marker};
pub use error::{ConnectionError, FixtureError, GatewayError, ValidationError, WriteError};
pub use handlers::{
    Brightness, BrightnessError, BrightnessHandler, FrameBuilder, RawWriteHandler, Toggle,
    ToggleHandler,
};
pub use protocol::EndpointId;
pub use server::{
    ApiError, AppState, BrightnessSetRequest, ConnectionCountResponse, DisconnectAllResponse,
    ErrorResponse, OkResponse, RawWriteRequest, ToggleSetRequest, ToggleValue, create_router,
};
