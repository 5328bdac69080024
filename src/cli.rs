use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::ble::DeviceFixture;

/// Command-line options for the BLE gateway.
#[derive(Debug, Parser)]
#[command(
    name = "blegate",
    about = "Expose BLE peripheral control through HTTP commands."
)]
pub struct Args {
    /// Socket address the HTTP listener binds to.
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,
    /// Default log level when RUST_LOG is not set.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
    /// Uses the fake BLE transport with fixture-driven peripherals.
    #[arg(long)]
    fake: bool,
    /// Fake peripheral fixtures in the form `address|outcome;...`.
    #[arg(long, requires = "fake", required_if_eq("fake", "true"))]
    fake_devices: Option<DeviceFixture>,
    /// Artificial fake connect delay (e.g. `250ms`, `2s`).
    #[arg(long, requires = "fake", value_parser = parse_duration)]
    fake_connect_delay: Option<Duration>,
}

impl Args {
    pub(crate) fn bind(&self) -> SocketAddr {
        self.bind
    }

    pub(crate) fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub(crate) fn fake(&self) -> bool {
        self.fake
    }

    pub(crate) fn fake_devices(&self) -> Option<&DeviceFixture> {
        self.fake_devices.as_ref()
    }

    pub(crate) fn fake_connect_delay(&self) -> Option<Duration> {
        self.fake_connect_delay
    }
}

/// Log verbosity applied when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub(crate) fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_bind_to_localhost() {
        let args = Args::try_parse_from(["blegate"]).expect("bare invocation should parse");
        assert_eq!("127.0.0.1:8000".parse::<SocketAddr>().ok(), Some(args.bind()));
        assert_eq!(LogLevel::Info, args.log_level());
        assert!(!args.fake());
    }

    #[test]
    fn fake_mode_requires_device_fixtures() {
        let error = Args::try_parse_from(["blegate", "--fake"])
            .expect_err("fake mode without fixtures should be rejected");
        assert_matches!(error.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn fake_fixture_flags_parse() {
        let args = Args::try_parse_from([
            "blegate",
            "--fake",
            "--fake-devices",
            "AA:BB:CC:DD:EE:FF|ok",
            "--fake-connect-delay",
            "250ms",
        ])
        .expect("fake invocation should parse");

        assert!(args.fake());
        assert!(args.fake_devices().is_some());
        assert_eq!(Some(Duration::from_millis(250)), args.fake_connect_delay());
    }

    #[test]
    fn fixture_flags_are_rejected_without_fake_mode() {
        let error =
            Args::try_parse_from(["blegate", "--fake-devices", "AA:BB|ok"])
                .expect_err("fixtures without fake mode should be rejected");
        assert_matches!(error.kind(), ErrorKind::MissingRequiredArgument);
    }
}
