use clap::Parser;

use crate::cli::node::NodeConfig;

#[derive(Debug, Parser)]
pub struct UploadDepositDataConfig {
    #[command(flatten)]
    pub node: NodeConfig,
}
