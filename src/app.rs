use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::ble::{
    BleTransport, BtleplugTransport, ConnectionPool, DisconnectSweeper, FakeTransport,
    FakeTransportConfig,
};
use crate::cli::Args;
use crate::server::{AppState, create_router};
use crate::telemetry;

/// Runs the gateway until a shutdown signal arrives.
///
/// The pool is torn down whenever the server loop ends, cleanly or not, so
/// no radio links are leaked on the failure path.
///
/// # Errors
///
/// Returns an error when telemetry, the transport, or the HTTP listener
/// fails to initialise, or when the server loop fails.
pub async fn run(args: Args) -> anyhow::Result<()> {
    telemetry::initialise_tracing(args.log_level().as_directive())
        .map_err(|error| anyhow::anyhow!("{error}"))?;

    let transport = build_transport(&args).await?;
    let pool = Arc::new(ConnectionPool::new(Arc::clone(&transport)));
    let sweeper = DisconnectSweeper::spawn(Arc::clone(&transport), Arc::clone(&pool)).await?;

    let state = Arc::new(AppState {
        pool: Arc::clone(&pool),
    });
    let router = create_router(state);

    let listener = TcpListener::bind(args.bind())
        .await
        .with_context(|| format!("failed to bind {}", args.bind()))?;
    info!(bind = %args.bind(), fake = args.fake(), "gateway listening");

    let serve_result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    finish_with_teardown(serve_result, &sweeper, &pool).await?;
    info!("gateway shut down");
    Ok(())
}

/// Tears the pool down, then surfaces the server loop's outcome.
///
/// Teardown is unconditional: a server loop that dies with an error must
/// still release every pooled radio link before the error propagates.
async fn finish_with_teardown(
    serve_result: std::io::Result<()>,
    sweeper: &DisconnectSweeper,
    pool: &ConnectionPool,
) -> anyhow::Result<()> {
    sweeper.abort();
    let disconnected = pool.disconnect_all().await;
    info!(disconnected, "pool teardown complete");

    serve_result.context("gateway server loop failed")?;
    Ok(())
}

async fn build_transport(args: &Args) -> anyhow::Result<Arc<dyn BleTransport>> {
    if args.fake() {
        let devices = args
            .fake_devices()
            .cloned()
            .context("fake mode requires --fake-devices")?;
        let config = FakeTransportConfig::builder()
            .devices(devices)
            .maybe_connect_delay(args.fake_connect_delay())
            .build();
        info!("using fake BLE transport");
        Ok(Arc::new(FakeTransport::new(config)))
    } else {
        let transport = BtleplugTransport::new()
            .await
            .context("failed to open the platform BLE session")?;
        Ok(Arc::new(transport))
    }
}

/// Resolves when the process is asked to stop: Ctrl+C everywhere, plus
/// SIGTERM on Unix so supervisor-driven stops also drain and tear down.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(signal_error) = tokio::signal::ctrl_c().await {
            error!(?signal_error, "failed to listen for interrupt signal");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(signal_error) => {
                error!(?signal_error, "failed to install terminate signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::ble::PeripheralAddress;

    use super::*;

    async fn connected_gateway() -> (Arc<ConnectionPool>, DisconnectSweeper) {
        let config = FakeTransportConfig::builder()
            .devices(
                "AA:BB:CC:DD:EE:FF|ok"
                    .parse()
                    .expect("fixture should parse"),
            )
            .build();
        let transport = Arc::new(FakeTransport::new(config));
        let pool = Arc::new(ConnectionPool::new(
            Arc::clone(&transport) as Arc<dyn BleTransport>
        ));
        let sweeper = DisconnectSweeper::spawn(
            Arc::clone(&transport) as Arc<dyn BleTransport>,
            Arc::clone(&pool),
        )
        .await
        .expect("sweeper should start");

        pool.write(&PeripheralAddress::new("AA:BB:CC:DD:EE:FF"), &[0x06, 0x01])
            .await
            .expect("pooled write should succeed");
        (pool, sweeper)
    }

    #[tokio::test]
    async fn teardown_runs_even_when_the_server_loop_fails() {
        let (pool, sweeper) = connected_gateway().await;
        assert_eq!(1, pool.count_connections().await);

        let failure = Err(std::io::Error::other("listener died"));
        let result = finish_with_teardown(failure, &sweeper, &pool).await;

        assert!(result.is_err(), "the server loop error must propagate");
        assert_eq!(0, pool.count_connections().await);
    }

    #[tokio::test]
    async fn teardown_runs_on_clean_shutdown() {
        let (pool, sweeper) = connected_gateway().await;

        finish_with_teardown(Ok(()), &sweeper, &pool)
            .await
            .expect("clean shutdown should succeed");
        assert_eq!(0, pool.count_connections().await);
    }
}
