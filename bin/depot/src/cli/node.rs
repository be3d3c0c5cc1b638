use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use depot_network_spec::{cli::network_parser, networks::NetworkSpec};
use url::Url;

use crate::cli::constants::{
    DEFAULT_BEACON_API_ENDPOINT, DEFAULT_EXECUTION_API_ENDPOINT, DEFAULT_NETWORK,
    DEFAULT_NODESET_API_URL, DEFAULT_REQUEST_TIMEOUT,
};

/// Options every command needs to reach the wallet, the database and the three services.
#[derive(Debug, Parser)]
pub struct NodeConfig {
    #[arg(
        long,
        help = "Choose mainnet, holesky, hoodi, dev or provide a path to a YAML config file",
        default_value = DEFAULT_NETWORK,
        value_parser = network_parser
    )]
    pub network: Arc<NetworkSpec>,

    #[arg(long, help = "The directory for the wallet, validator keys and database")]
    pub data_dir: PathBuf,

    #[arg(
        long,
        help = "Directory to copy node_wallet.json and node_password from when they are missing"
    )]
    pub wallet_parent_dir: Option<PathBuf>,

    #[arg(long, help = "Set HTTP url of the beacon api endpoint", default_value = DEFAULT_BEACON_API_ENDPOINT)]
    pub beacon_api_endpoint: Url,

    #[arg(long, help = "Set HTTP url of the execution client JSON-RPC endpoint", default_value = DEFAULT_EXECUTION_API_ENDPOINT)]
    pub execution_api_endpoint: Url,

    #[arg(long, help = "Set base url of the NodeSet API", default_value = DEFAULT_NODESET_API_URL)]
    pub nodeset_api_url: Url,

    #[arg(long, help = "Set HTTP request timeout in seconds for outgoing calls", default_value = DEFAULT_REQUEST_TIMEOUT, value_parser = duration_parser)]
    pub request_timeout: Duration,

    #[arg(
        long,
        help = "Compressed secp256k1 public key exit messages are encrypted to. Overrides the network preset"
    )]
    pub encryption_public_key: Option<String>,
}

pub fn duration_parser(duration_string: &str) -> Result<Duration, String> {
    Ok(Duration::from_secs(duration_string.parse().map_err(
        |err| format!("Could not parse the duration in seconds: {err:?}"),
    )?))
}
