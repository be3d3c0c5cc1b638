use std::{
    fmt,
    sync::{Arc, LazyLock},
};

use alloy_primitives::{Address, address, aliases::B32, fixed_bytes};
use depot_consensus::misc::checksummed_address;
use serde::{Deserialize, Serialize, Serializer};

/// Multicall3 is deployed at the same address on every supported chain.
pub const MULTICALL3_ADDRESS: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Holesky,
    Hoodi,
    Dev,
    Custom(String),
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Holesky => write!(f, "holesky"),
            Network::Hoodi => write!(f, "hoodi"),
            Network::Dev => write!(f, "dev"),
            Network::Custom(name) => write!(f, "{name}"),
        }
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match String::deserialize(deserializer)?.as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "holesky" => Ok(Network::Holesky),
            "hoodi" => Ok(Network::Hoodi),
            "dev" => Ok(Network::Dev),
            custom => Ok(Network::Custom(custom.to_string())),
        }
    }
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Chain and deployment parameters the relay needs to sign for, and talk about, one network.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct NetworkSpec {
    #[serde(rename = "CONFIG_NAME")]
    pub network: Network,

    // Deposit contract
    #[serde(with = "checksummed_address")]
    pub deposit_contract_address: Address,

    // Forking
    #[serde(with = "crate::b32_hex")]
    pub genesis_fork_version: B32,
    #[serde(with = "crate::b32_hex")]
    pub capella_fork_version: B32,

    #[serde(with = "checksummed_address", default = "default_multicall_address")]
    pub multicall_address: Address,

    // Deployment
    #[serde(with = "checksummed_address")]
    pub vault: Address,
    pub deployment: String,
    /// Compressed secp256k1 key exit messages are encrypted to before they leave the node.
    #[serde(default)]
    pub encryption_public_key: Option<String>,
}

fn default_multicall_address() -> Address {
    MULTICALL3_ADDRESS
}

pub static MAINNET: LazyLock<Arc<NetworkSpec>> = LazyLock::new(|| {
    NetworkSpec {
        network: Network::Mainnet,
        deposit_contract_address: address!("0x00000000219ab540356cBB839Cbe05303d7705Fa"),
        genesis_fork_version: fixed_bytes!("0x00000000"),
        capella_fork_version: fixed_bytes!("0x03000000"),
        multicall_address: MULTICALL3_ADDRESS,
        vault: address!("0xE2AEECC76839692AEa35a8D119181b14ebf411c9"),
        deployment: "mainnet".to_string(),
        encryption_public_key: None,
    }
    .into()
});

pub static HOLESKY: LazyLock<Arc<NetworkSpec>> = LazyLock::new(|| {
    NetworkSpec {
        network: Network::Holesky,
        deposit_contract_address: address!("0x4242424242424242424242424242424242424242"),
        genesis_fork_version: fixed_bytes!("0x01017000"),
        capella_fork_version: fixed_bytes!("0x04017000"),
        multicall_address: MULTICALL3_ADDRESS,
        vault: address!("0x646F5285D195e08E309cF9A5aDFDF68D6Fcc51C4"),
        deployment: "holesky".to_string(),
        encryption_public_key: None,
    }
    .into()
});

pub static HOODI: LazyLock<Arc<NetworkSpec>> = LazyLock::new(|| {
    NetworkSpec {
        network: Network::Hoodi,
        deposit_contract_address: address!("0x00000000219ab540356cBB839Cbe05303d7705Fa"),
        genesis_fork_version: fixed_bytes!("0x10000910"),
        capella_fork_version: fixed_bytes!("0x40000910"),
        multicall_address: MULTICALL3_ADDRESS,
        vault: Address::ZERO,
        deployment: "hoodi".to_string(),
        encryption_public_key: None,
    }
    .into()
});

pub static DEV: LazyLock<Arc<NetworkSpec>> = LazyLock::new(|| {
    NetworkSpec {
        network: Network::Dev,
        deposit_contract_address: address!("0x00000000219ab540356cBB839Cbe05303d7705Fa"),
        genesis_fork_version: fixed_bytes!("0x00000000"),
        capella_fork_version: fixed_bytes!("0x03000000"),
        multicall_address: MULTICALL3_ADDRESS,
        vault: address!("0xf8763855473ce978232bBa37ef90fcFc8aAE10d1"),
        deployment: "devnet".to_string(),
        encryption_public_key: None,
    }
    .into()
});
