use std::sync::Arc;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use blegate::{
    BleTransport, Brightness, BrightnessHandler, ConnectionError, ConnectionPool, FakeTransport,
    FakeTransportConfig, GatewayError, PeripheralAddress, RawWriteHandler, Toggle, ToggleHandler,
};

const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

fn fake_gateway(fixture: &str) -> anyhow::Result<(Arc<FakeTransport>, Arc<ConnectionPool>)> {
    let config = FakeTransportConfig::builder()
        .devices(fixture.parse()?)
        .build();
    let transport = Arc::new(FakeTransport::new(config));
    let pool = Arc::new(ConnectionPool::new(
        Arc::clone(&transport) as Arc<dyn BleTransport>
    ));
    Ok((transport, pool))
}

fn recorded_frames(transport: &FakeTransport) -> Vec<Vec<u8>> {
    transport
        .recorded_writes()
        .into_iter()
        .map(|write| write.frame)
        .collect()
}

#[tokio::test]
async fn raw_write_sends_the_captured_frame_verbatim() -> anyhow::Result<()> {
    let (transport, pool) = fake_gateway("AA:BB:CC:DD:EE:FF|ok")?;
    let address = PeripheralAddress::new(ADDRESS);

    RawWriteHandler::write(&pool, &address, "adbacd02c0010601").await?;

    assert_eq!(
        vec![vec![0xAD, 0xBA, 0xCD, 0x02, 0xC0, 0x01, 0x06, 0x01]],
        recorded_frames(&transport)
    );
    assert_eq!(address, transport.recorded_writes()[0].address);
    Ok(())
}

#[tokio::test]
async fn raw_write_accepts_a_hex_marker_prefix() -> anyhow::Result<()> {
    let (transport, pool) = fake_gateway("AA:BB:CC:DD:EE:FF|ok")?;
    let address = PeripheralAddress::new(ADDRESS);

    RawWriteHandler::write(&pool, &address, "0x0601").await?;

    assert_eq!(vec![vec![0x06, 0x01]], recorded_frames(&transport));
    Ok(())
}

#[tokio::test]
async fn brightness_command_builds_the_expected_frame() -> anyhow::Result<()> {
    let (transport, pool) = fake_gateway("AA:BB:CC:DD:EE:FF|ok")?;
    let address = PeripheralAddress::new(ADDRESS);

    BrightnessHandler::set(&pool, &address, "AABB", "01", Brightness::new(50)?).await?;

    assert_eq!(
        vec![vec![0xAA, 0xBB, 0x01, 0x08, 0x27, 0x10]],
        recorded_frames(&transport)
    );
    Ok(())
}

#[tokio::test]
async fn toggle_commands_build_the_expected_frames() -> anyhow::Result<()> {
    let (transport, pool) = fake_gateway("AA:BB:CC:DD:EE:FF|ok")?;
    let address = PeripheralAddress::new(ADDRESS);

    ToggleHandler::set(&pool, &address, "AABB", "01", Toggle::On).await?;
    ToggleHandler::set(&pool, &address, "AABB", "01", Toggle::Off).await?;

    assert_eq!(
        vec![
            vec![0xAA, 0xBB, 0x01, 0x06, 0x01],
            vec![0xAA, 0xBB, 0x01, 0x06, 0x00],
        ],
        recorded_frames(&transport)
    );
    // Both commands reuse one pooled connection.
    assert_eq!(1, transport.connect_attempts(&address));
    Ok(())
}

#[tokio::test]
async fn malformed_payloads_fail_before_any_radio_traffic() -> anyhow::Result<()> {
    let (transport, pool) = fake_gateway("AA:BB:CC:DD:EE:FF|ok")?;
    let address = PeripheralAddress::new(ADDRESS);

    let odd_length = RawWriteHandler::write(&pool, &address, "abc").await;
    assert_matches!(odd_length, Err(error) if error.is_pre_radio());

    let bad_character = RawWriteHandler::write(&pool, &address, "zz").await;
    assert_matches!(bad_character, Err(GatewayError::Decode(_)));

    assert_eq!(0, transport.connect_attempts(&address));
    assert_eq!(0, pool.count_connections().await);
    Ok(())
}

#[tokio::test]
async fn writes_to_unknown_peripherals_surface_a_connection_error() -> anyhow::Result<()> {
    let (_transport, pool) = fake_gateway("AA:BB:CC:DD:EE:FF|ok")?;
    let unknown = PeripheralAddress::new("11:22:33:44:55:66");

    let result = RawWriteHandler::write(&pool, &unknown, "0601").await;
    assert_matches!(
        result,
        Err(GatewayError::Connection(ConnectionError::NotScripted { .. }))
    );
    assert_eq!(0, pool.count_connections().await);
    Ok(())
}

#[tokio::test]
async fn pool_lifecycle_reports_counts_through_disconnect_all() -> anyhow::Result<()> {
    let (_transport, pool) = fake_gateway("AA:BB:CC:DD:EE:01|ok;AA:BB:CC:DD:EE:02|ok")?;
    assert_eq!(0, pool.count_connections().await);

    ToggleHandler::set(
        &pool,
        &PeripheralAddress::new("AA:BB:CC:DD:EE:01"),
        "AABB",
        "01",
        Toggle::On,
    )
    .await?;
    ToggleHandler::set(
        &pool,
        &PeripheralAddress::new("AA:BB:CC:DD:EE:02"),
        "AABB",
        "02",
        Toggle::On,
    )
    .await?;
    assert_eq!(2, pool.count_connections().await);

    assert_eq!(2, pool.disconnect_all().await);
    assert_eq!(0, pool.count_connections().await);
    Ok(())
}
