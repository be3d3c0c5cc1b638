pub mod daemon;
pub mod generate_keys;
pub mod init_wallet;
pub mod upload_deposit_data;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use depot_beacon_client::BeaconApiClient;
use depot_execution_client::ExecutionRpcClient;
use depot_node::ServiceProvider;
use depot_nodeset::{NodeSetClient, NodeSetConfig};
use depot_storage::db::DepotDB;
use depot_wallet::Wallet;

use crate::cli::node::NodeConfig;

pub const WALLET_DIRECTORY: &str = "wallet";
pub const DATABASE_DIRECTORY: &str = "db";

pub fn node_wallet(data_dir: &Path, parent_dir: Option<PathBuf>) -> Wallet {
    Wallet::new(data_dir.join(WALLET_DIRECTORY), parent_dir)
}

/// Connects every collaborator named in `config`. Opening the database takes its file lock,
/// so only one command can hold a `ServiceProvider` for a data directory at a time.
pub fn build_services(config: &NodeConfig) -> anyhow::Result<Arc<ServiceProvider>> {
    let network_spec = config.network.clone();
    let wallet = node_wallet(&config.data_dir, config.wallet_parent_dir.clone());

    let consensus = Arc::new(BeaconApiClient::new(
        config.beacon_api_endpoint.clone(),
        config.request_timeout,
    )?);
    let execution = Arc::new(ExecutionRpcClient::new(
        config.execution_api_endpoint.clone(),
        config.request_timeout,
    )?);
    let authorization = Arc::new(NodeSetClient::new(
        NodeSetConfig {
            api_url: config.nodeset_api_url.clone(),
            network: network_spec.network.to_string(),
            deployment: network_spec.deployment.clone(),
            vault: network_spec.vault,
            request_timeout: config.request_timeout,
        },
        wallet.clone(),
    )?);
    let db = DepotDB::new(config.data_dir.join(DATABASE_DIRECTORY))?;

    let services =
        ServiceProvider::new(network_spec, db, wallet, consensus, execution, authorization)?
            .with_encryption_public_key(config.encryption_public_key.clone());
    Ok(Arc::new(services))
}
