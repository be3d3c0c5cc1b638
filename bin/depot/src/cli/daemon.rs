use std::{net::IpAddr, path::PathBuf, time::Duration};

use clap::Parser;

use crate::cli::{
    constants::{
        DEFAULT_HTTP_ADDRESS, DEFAULT_HTTP_PORT, DEFAULT_METRICS_ADDRESS, DEFAULT_METRICS_ENABLED,
        DEFAULT_METRICS_PORT, DEFAULT_TASK_COOLDOWN, DEFAULT_TASK_INTERVAL,
    },
    node::{NodeConfig, duration_parser},
};

#[derive(Debug, Parser)]
pub struct DaemonConfig {
    #[command(flatten)]
    pub node: NodeConfig,

    #[arg(long, help = "Set HTTP address of the relay server", default_value_t = DEFAULT_HTTP_ADDRESS)]
    pub http_address: IpAddr,

    #[arg(long, help = "Set HTTP port of the relay server", default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    #[arg(long, help = "Enable the Prometheus metrics exporter", default_value_t = DEFAULT_METRICS_ENABLED)]
    pub metrics: bool,

    #[arg(long, help = "Set metrics address", default_value_t = DEFAULT_METRICS_ADDRESS)]
    pub metrics_address: IpAddr,

    #[arg(long, help = "Set metrics port", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    #[arg(
        long,
        help = "Check fetched deposit data against the vault's validators root before saving it"
    )]
    pub verify_deposits_root: bool,

    #[arg(
        long,
        help = "Shell command that restarts the Operator after new deposit data is saved"
    )]
    pub operator_restart_command: Option<String>,

    #[arg(
        long,
        help = "Where to export the deposit data for the Operator. Defaults to <data-dir>/deposit_data.json"
    )]
    pub deposit_data_path: Option<PathBuf>,

    #[arg(long, help = "Seconds to wait between the two reconciliation jobs", default_value = DEFAULT_TASK_COOLDOWN, value_parser = duration_parser)]
    pub task_cooldown: Duration,

    #[arg(long, help = "Seconds to wait between reconciliation rounds", default_value = DEFAULT_TASK_INTERVAL, value_parser = duration_parser)]
    pub task_interval: Duration,
}
