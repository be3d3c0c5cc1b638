pub mod constants;
pub mod daemon;
pub mod generate_keys;
pub mod init_wallet;
pub mod node;
pub mod upload_deposit_data;
pub mod verbosity;

use clap::{Parser, Subcommand};
use depot_node::version::DEPOT_VERSION;

use crate::cli::{
    constants::DEFAULT_VERBOSITY,
    daemon::DaemonConfig,
    generate_keys::GenerateKeysConfig,
    init_wallet::InitWalletConfig,
    upload_deposit_data::UploadDepositDataConfig,
    verbosity::{Verbosity, verbosity_parser},
};

#[derive(Debug, Parser)]
#[command(author, version = DEPOT_VERSION, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (1=error, 2=warn, 3=info, 4=debug, 5=trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, default_value = DEFAULT_VERBOSITY, value_parser = verbosity_parser)]
    pub verbosity: Verbosity,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the relay server and the reconciliation task loop
    #[command(name = "daemon")]
    Daemon(Box<DaemonConfig>),

    /// Create the node wallet
    #[command(name = "init-wallet")]
    InitWallet(InitWalletConfig),

    /// Generate validator keys and start tracking them
    #[command(name = "generate-keys")]
    GenerateKeys(Box<GenerateKeysConfig>),

    /// Upload deposit data for the keys the node balance can pay for
    #[command(name = "upload-deposit-data")]
    UploadDepositData(Box<UploadDepositDataConfig>),
}
