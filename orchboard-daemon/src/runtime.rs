use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::error::{io_err, DaemonError};
use crate::http::{self, AppState};
use crate::watcher::{watcher_task, ChangeWatcher};

/// Start the dashboard runtime and block the current thread until it exits.
pub fn start_blocking(config: ServerConfig) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the watcher, HTTP server and signal handler until one of them stops.
pub async fn run(config: ServerConfig) -> Result<(), DaemonError> {
    let broadcaster = Broadcaster::new();
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    tracing::info!(
        file = %config.file.display(),
        bind = %config.bind,
        claims_enabled = config.claim_token.is_some(),
        "starting orchestrator dashboard",
    );
    if config.claim_token.is_none() {
        tracing::warn!("no claim token configured; every claim will be rejected");
    }

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|e| io_err(config.bind.to_string(), e))?;

    let watcher_handle = {
        let shutdown = shutdown_tx.clone();
        let watcher = ChangeWatcher::new(config.file.clone());
        let broadcaster = broadcaster.clone();
        let interval = config.poll_interval;
        tokio::spawn(async move {
            let result = watcher_task(watcher, broadcaster, interval, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let server_handle = {
        let shutdown = shutdown_tx.clone();
        let state = AppState::new(config, broadcaster);
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            let result = http::serve(listener, state, async move {
                let _ = shutdown_rx.recv().await;
            })
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down dashboard");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (watcher_result, server_result, signal_result) =
        tokio::join!(watcher_handle, server_handle, signal_handle);

    handle_join("watcher", watcher_result)?;
    handle_join("http_server", server_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
