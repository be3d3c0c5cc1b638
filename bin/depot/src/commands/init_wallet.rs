use tracing::info;

use crate::{cli::init_wallet::InitWalletConfig, commands::node_wallet};

pub fn run_init_wallet(config: InitWalletConfig) -> anyhow::Result<()> {
    let address = node_wallet(&config.data_dir, None).initialize_node_wallet()?;
    info!(%address, "Node wallet created, register this address with NodeSet");
    Ok(())
}
