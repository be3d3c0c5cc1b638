use clap::Parser;

use crate::cli::node::NodeConfig;

#[derive(Debug, Parser)]
pub struct GenerateKeysConfig {
    #[command(flatten)]
    pub node: NodeConfig,

    #[arg(long, help = "Number of validator keys to generate", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: u64,
}
