use std::process;

use clap::Parser;
use depot::{
    cli::{Cli, Commands, verbosity::Verbosity},
    commands::{
        daemon::run_daemon, generate_keys::run_generate_keys, init_wallet::run_init_wallet,
        upload_deposit_data::run_upload_deposit_data,
    },
};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbosity);

    if let Err(err) = run(cli.command) {
        error!("{err:#}");
        process::exit(1);
    }
}

fn init_tracing(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn run(command: Commands) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match command {
        Commands::Daemon(config) => runtime.block_on(run_daemon(*config)),
        Commands::InitWallet(config) => run_init_wallet(config),
        Commands::GenerateKeys(config) => runtime.block_on(run_generate_keys(*config)),
        Commands::UploadDepositData(config) => {
            runtime.block_on(run_upload_deposit_data(*config))
        }
    }
}
