mod args;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tracing::info;

use args::Args;
use mr_coordinator::core::{CoordinatorServer, MRCoordinator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let socket = args.socket.unwrap_or_else(common::utils::coordinator_socket);

    let coordinator = MRCoordinator::new(
        args.input_files,
        args.n_reduce,
        Duration::from_secs(args.task_timeout),
    );
    let monitor = coordinator.start_monitor(Duration::from_secs(1));
    let state = coordinator.state();

    // A previous run may have left its socket file behind.
    if socket.exists() {
        std::fs::remove_file(&socket)
            .with_context(|| format!("cannot remove stale socket {}", socket.display()))?;
    }
    let listener = UnixListener::bind(&socket)
        .with_context(|| format!("cannot bind {}", socket.display()))?;
    info!("coordinator listening on {}", socket.display());

    // Poll for job completion and shut the server down once every task
    // has completed, mirroring the external Done() polling contract.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if state.lock().await.done() {
                let _ = shutdown_tx.send(());
                break;
            }
        }
    });

    Server::builder()
        .add_service(CoordinatorServer::new(coordinator))
        .serve_with_incoming_shutdown(UnixListenerStream::new(listener), async {
            let _ = shutdown_rx.await;
        })
        .await?;

    monitor.abort();
    let _ = std::fs::remove_file(&socket);
    info!("job complete, coordinator exiting");
    Ok(())
}
