use std::{path::Path, sync::Arc};

use alloy_primitives::B256;
use depot_beacon_client::mock::MockConsensusClient;
use depot_bls::PublicKey;
use depot_execution_client::{ContractRegistry, mock::MockExecutionClient};
use depot_keystore::envelope::{random_secret_key, recipient_hex};
use depot_network_spec::networks::{DEV, NetworkSpec};
use depot_nodeset::mock::MockAuthorizationService;
use depot_storage::db::DepotDB;
use depot_wallet::Wallet;

use crate::services::ServiceProvider;

pub const MOCK_KDF_ITERATIONS: u32 = 16;
pub const MOCK_HEAD_BLOCK: u64 = 100_000;
pub const MOCK_DEPOSIT_ROOT: B256 = B256::repeat_byte(0xd0);

/// A `ServiceProvider` over in-memory collaborators rooted in `data_dir`, with handles to
/// steer each of them. The node wallet is initialized.
pub struct MockServices {
    pub provider: Arc<ServiceProvider>,
    pub consensus: Arc<MockConsensusClient>,
    pub execution: Arc<MockExecutionClient>,
    pub authorization: Arc<MockAuthorizationService>,
}

impl MockServices {
    pub fn new(data_dir: &Path) -> anyhow::Result<Self> {
        let network_spec = Arc::new(NetworkSpec {
            encryption_public_key: Some(recipient_hex(&random_secret_key())),
            ..(**DEV).clone()
        });
        let registry = ContractRegistry::new(&network_spec);
        let consensus = Arc::new(MockConsensusClient::new());
        let execution = Arc::new(MockExecutionClient::new(registry));
        execution.set_block_number(MOCK_HEAD_BLOCK);
        execution.set_deposit_root(MOCK_DEPOSIT_ROOT);
        let authorization = Arc::new(MockAuthorizationService::new());

        let wallet =
            Wallet::new(data_dir.join("wallet"), None).with_kdf_iterations(MOCK_KDF_ITERATIONS);
        wallet.initialize_node_wallet()?;
        let db = DepotDB::new(data_dir.join("db"))?;
        let provider = ServiceProvider::new(
            network_spec,
            db,
            wallet,
            consensus.clone(),
            execution.clone(),
            authorization.clone(),
        )?;

        Ok(Self {
            provider: Arc::new(provider),
            consensus,
            execution,
            authorization,
        })
    }

    /// Generates `count` validator keys and starts tracking them.
    pub async fn generate_keys(&self, count: usize) -> anyhow::Result<Vec<PublicKey>> {
        let mut public_keys = Vec::with_capacity(count);
        for _ in 0..count {
            let private_key = self.provider.wallet.generate_validator_key()?;
            self.provider.key_manager.add_new_key(&private_key).await?;
            public_keys.push(private_key.public_key()?);
        }
        Ok(public_keys)
    }
}
