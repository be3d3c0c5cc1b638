use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
pub struct InitWalletConfig {
    #[arg(long, help = "The directory for the wallet, validator keys and database")]
    pub data_dir: PathBuf,
}
