use std::{net::SocketAddr, sync::Arc};

use anyhow::anyhow;
use depot_node::version::depot_node_version;
use depot_rpc_relay::start_relay_server;
use depot_tasks::{
    ReconciliationTaskLoop,
    config::{DEPOSIT_DATA_FILE, TaskConfig},
    restarter::{CommandRestarter, NoopRestarter, OperatorRestarter},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{cli::daemon::DaemonConfig, commands::build_services};

pub async fn run_daemon(config: DaemonConfig) -> anyhow::Result<()> {
    info!(
        version = depot_node_version(),
        network = %config.node.network.network,
        vault = %config.node.network.vault,
        "Starting daemon"
    );

    if config.metrics {
        let metrics_address = SocketAddr::new(config.metrics_address, config.metrics_port);
        prometheus_exporter::start(metrics_address)
            .map_err(|err| anyhow!("Failed to start metrics exporter: {err}"))?;
        info!(%metrics_address, "Started metrics exporter");
    }

    let services = build_services(&config.node)?;
    if let Err(err) = services.wallet.ensure_ready() {
        error!("Node wallet is not ready, requests will fail until it is: {err}");
    }

    let restarter: Arc<dyn OperatorRestarter> = match config.operator_restart_command {
        Some(command) => Arc::new(CommandRestarter::new(command)),
        None => Arc::new(NoopRestarter),
    };
    let task_config = TaskConfig {
        cooldown: config.task_cooldown,
        interval: config.task_interval,
        verify_deposits_root: config.verify_deposits_root,
        ..TaskConfig::new(
            config
                .deposit_data_path
                .unwrap_or_else(|| config.node.data_dir.join(DEPOSIT_DATA_FILE)),
        )
    };

    let cancellation = CancellationToken::new();
    let task_loop = tokio::spawn(
        ReconciliationTaskLoop::new(
            services.clone(),
            task_config,
            restarter,
            cancellation.clone(),
        )
        .start(),
    );

    let http_socket_address = SocketAddr::new(config.http_address, config.http_port);
    let server = start_relay_server(http_socket_address, services)?;
    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);
    info!(%http_socket_address, "Relay server listening");

    let result = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            result.map_err(|err| anyhow!("Failed to listen for Ctrl-C: {err}"))
        }
        result = &mut server_task => match result {
            Ok(Ok(())) => Err(anyhow!("Relay server stopped unexpectedly")),
            Ok(Err(err)) => Err(anyhow!("Relay server failed: {err}")),
            Err(err) => Err(anyhow!("Relay server task panicked: {err}")),
        },
    };

    cancellation.cancel();
    server_handle.stop(true).await;
    if let Err(err) = task_loop.await {
        error!("Reconciliation task loop panicked: {err}");
    }
    info!("Daemon stopped");
    result
}
