pub mod beacon_api_client;
pub mod error;
pub mod http_client;
pub mod mock;

use std::collections::HashMap;

use alloy_primitives::{B256, aliases::B32};
use async_trait::async_trait;
use depot_api_types::beacon::{Genesis, ValidatorData};
use depot_bls::PublicKey;
use depot_consensus::{constants::DOMAIN_VOLUNTARY_EXIT, misc::compute_domain};

pub use crate::{beacon_api_client::BeaconApiClient, error::ClientError};

/// The consensus-layer view the relay and the task loop depend on.
#[async_trait]
pub trait ConsensusClient: Send + Sync {
    /// Registry entries for the given keys, as of the head state. Keys the chain has never
    /// seen are simply absent from the map.
    async fn validator_statuses(
        &self,
        public_keys: &[PublicKey],
    ) -> Result<HashMap<PublicKey, ValidatorData>, ClientError>;

    async fn is_synced(&self) -> Result<bool, ClientError>;

    async fn finalized_epoch(&self) -> Result<u64, ClientError>;

    async fn genesis(&self) -> Result<Genesis, ClientError>;

    /// Exits are always signed against the Capella fork version (EIP-7044).
    async fn voluntary_exit_domain(&self, capella_fork_version: B32) -> Result<B256, ClientError> {
        let genesis = self.genesis().await?;
        Ok(compute_domain(
            DOMAIN_VOLUNTARY_EXIT,
            Some(capella_fork_version),
            Some(genesis.genesis_validators_root),
        ))
    }
}
