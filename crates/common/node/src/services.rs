use std::sync::Arc;

use anyhow::anyhow;
use depot_beacon_client::ConsensusClient;
use depot_execution_client::{ContractRegistry, ExecutionClient};
use depot_key_manager::{AvailableKeyManager, KeyManagerError};
use depot_network_spec::networks::NetworkSpec;
use depot_nodeset::AuthorizationService;
use depot_storage::db::DepotDB;
use depot_wallet::Wallet;

/// Everything the relay and the task loop share. Built once at startup.
pub struct ServiceProvider {
    pub network_spec: Arc<NetworkSpec>,
    pub registry: ContractRegistry,
    pub db: DepotDB,
    pub wallet: Wallet,
    pub consensus: Arc<dyn ConsensusClient>,
    pub execution: Arc<dyn ExecutionClient>,
    pub authorization: Arc<dyn AuthorizationService>,
    pub key_manager: Arc<AvailableKeyManager>,
    encryption_public_key: Option<String>,
}

impl ServiceProvider {
    pub fn new(
        network_spec: Arc<NetworkSpec>,
        db: DepotDB,
        wallet: Wallet,
        consensus: Arc<dyn ConsensusClient>,
        execution: Arc<dyn ExecutionClient>,
        authorization: Arc<dyn AuthorizationService>,
    ) -> Result<Self, KeyManagerError> {
        let registry = ContractRegistry::new(&network_spec);
        let key_manager = Arc::new(AvailableKeyManager::new(
            &db,
            wallet.clone(),
            consensus.clone(),
            execution.clone(),
            registry.clone(),
        )?);
        let encryption_public_key = network_spec.encryption_public_key.clone();

        Ok(Self {
            network_spec,
            registry,
            db,
            wallet,
            consensus,
            execution,
            authorization,
            key_manager,
            encryption_public_key,
        })
    }

    /// Overrides the exit-encryption key the network preset carries.
    pub fn with_encryption_public_key(mut self, encryption_public_key: Option<String>) -> Self {
        if encryption_public_key.is_some() {
            self.encryption_public_key = encryption_public_key;
        }
        self
    }

    pub fn encryption_public_key(&self) -> anyhow::Result<&str> {
        self.encryption_public_key
            .as_deref()
            .ok_or_else(|| anyhow!("No exit message encryption key configured for this network"))
    }
}
