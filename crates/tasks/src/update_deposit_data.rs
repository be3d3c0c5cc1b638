use std::{path::PathBuf, sync::Arc};

use anyhow::anyhow;
use depot_node::ServiceProvider;
use depot_nodeset::NodeSetError;
use depot_storage::tables::{deposit_data::StoredDepositData, field::Field};
use depot_validator::{deposit::ExtendedDepositData, deposit_set::deposit_data_set_root};
use tracing::{info, warn};

use crate::restarter::OperatorRestarter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate,
    NotRegistered,
    /// The fetched set does not hash to the vault's root and was not saved.
    RootMismatch,
    Updated { version: u64 },
}

/// Keeps the local deposit-data set in step with the authorization service.
pub struct UpdateDepositDataTask {
    services: Arc<ServiceProvider>,
    restarter: Arc<dyn OperatorRestarter>,
    verify_deposits_root: bool,
    deposit_data_path: PathBuf,
}

impl UpdateDepositDataTask {
    pub fn new(
        services: Arc<ServiceProvider>,
        restarter: Arc<dyn OperatorRestarter>,
        verify_deposits_root: bool,
        deposit_data_path: PathBuf,
    ) -> Self {
        Self {
            services,
            restarter,
            verify_deposits_root,
            deposit_data_path,
        }
    }

    pub async fn run(&self) -> anyhow::Result<UpdateOutcome> {
        info!("Checking version of NodeSet data on disk");
        let authorization = &self.services.authorization;
        let remote_version = match authorization.deposit_data_version().await {
            Ok(version) => version,
            Err(NodeSetError::NotRegistered) => {
                warn!("Node is not registered with the NodeSet server yet");
                return Ok(UpdateOutcome::NotRegistered);
            }
            Err(err) => return Err(anyhow!("Failed to get deposit data version: {err}")),
        };

        let field = self.services.db.deposit_data_provider();
        let local_version = field.get()?.version;
        if local_version == remote_version {
            info!(version = local_version, "Local deposit data is up to date");
            return Ok(UpdateOutcome::UpToDate);
        }

        info!(
            local_version,
            remote_version, "Deposit data is out of date, retrieving latest data"
        );
        let set = authorization
            .deposit_data_set()
            .await
            .map_err(|err| anyhow!("Failed to get deposit data set: {err}"))?;

        if self.verify_deposits_root && !self.deposits_root_matches(&set.deposit_data).await? {
            return Ok(UpdateOutcome::RootMismatch);
        }

        // The version is committed last so a failed export or restart is retried.
        let contents = serde_json::to_vec_pretty(&set.deposit_data)
            .map_err(|err| anyhow!("Failed to serialize deposit data: {err}"))?;
        if let Some(parent) = self.deposit_data_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.deposit_data_path, contents)
            .await
            .map_err(|err| {
                anyhow!(
                    "Failed to write {}: {err}",
                    self.deposit_data_path.display()
                )
            })?;
        info!(path = %self.deposit_data_path.display(), "Saved deposit data");

        self.restarter.restart().await?;
        field.insert(StoredDepositData {
            version: set.version,
            deposit_data: set.deposit_data,
        })?;
        info!(version = set.version, "Deposit data is now up to date");
        Ok(UpdateOutcome::Updated {
            version: set.version,
        })
    }

    async fn deposits_root_matches(
        &self,
        deposit_data: &[ExtendedDepositData],
    ) -> anyhow::Result<bool> {
        let local_root = deposit_data_set_root(deposit_data)?;
        info!(%local_root, "Computed Merkle root");
        let contract_root = self
            .services
            .registry
            .validators_root(self.services.execution.as_ref())
            .await
            .map_err(|err| anyhow!("Failed to get validators root from the vault: {err}"))?;
        info!(%contract_root, "Retrieved vault Merkle root");

        if local_root != contract_root {
            warn!(
                "Locally computed deposit data root does not match the vault, refusing to save it"
            );
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy_primitives::B256;
    use async_trait::async_trait;
    use depot_bls::PrivateKey;
    use depot_node::mock::MockServices;
    use depot_nodeset::types::RegistrationStatus;
    use depot_validator::deposit::generate_deposit_data;
    use tempdir::TempDir;

    use super::*;
    use crate::restarter::CommandRestarter;

    #[derive(Debug, Default)]
    pub(crate) struct CountingRestarter {
        pub(crate) restarts: AtomicUsize,
    }

    #[async_trait]
    impl OperatorRestarter for CountingRestarter {
        async fn restart(&self) -> anyhow::Result<()> {
            self.restarts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    pub(crate) fn deposit_data(services: &MockServices, count: usize) -> Vec<ExtendedDepositData> {
        let network_spec = &services.provider.network_spec;
        (0..count)
            .map(|_| {
                generate_deposit_data(
                    &PrivateKey::generate().unwrap(),
                    network_spec.vault,
                    network_spec,
                )
                .unwrap()
            })
            .collect()
    }

    fn task(
        dir: &TempDir,
        services: &MockServices,
        restarter: Arc<CountingRestarter>,
        verify_deposits_root: bool,
    ) -> UpdateDepositDataTask {
        UpdateDepositDataTask::new(
            services.provider.clone(),
            restarter,
            verify_deposits_root,
            dir.path().join("operator").join("deposit_data.json"),
        )
    }

    #[tokio::test]
    async fn test_new_version_is_saved_and_exported() {
        let dir = TempDir::new("tasks").unwrap();
        let services = MockServices::new(dir.path()).unwrap();
        let data = deposit_data(&services, 2);
        services.authorization.set_deposit_data(3, data.clone());
        let restarter = Arc::new(CountingRestarter::default());
        let task = task(&dir, &services, restarter.clone(), false);

        assert_eq!(
            task.run().await.unwrap(),
            UpdateOutcome::Updated { version: 3 }
        );
        let stored = services.provider.db.deposit_data_provider().get().unwrap();
        assert_eq!(stored.version, 3);
        assert_eq!(stored.deposit_data, data);
        let exported: Vec<ExtendedDepositData> = serde_json::from_slice(
            &std::fs::read(dir.path().join("operator").join("deposit_data.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(exported, data);
        assert_eq!(restarter.restarts.load(Ordering::SeqCst), 1);

        assert_eq!(task.run().await.unwrap(), UpdateOutcome::UpToDate);
        assert_eq!(restarter.restarts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_export_is_retried() {
        let dir = TempDir::new("tasks").unwrap();
        let services = MockServices::new(dir.path()).unwrap();
        let data = deposit_data(&services, 1);
        services.authorization.set_deposit_data(3, data.clone());
        let restarter = Arc::new(CountingRestarter::default());
        let task = task(&dir, &services, restarter.clone(), false);
        let path = dir.path().join("operator").join("deposit_data.json");
        std::fs::create_dir_all(&path).unwrap();

        assert!(task.run().await.is_err());
        let stored = services.provider.db.deposit_data_provider().get().unwrap();
        assert_eq!(stored.version, 0);
        assert_eq!(restarter.restarts.load(Ordering::SeqCst), 0);

        std::fs::remove_dir_all(&path).unwrap();
        assert_eq!(
            task.run().await.unwrap(),
            UpdateOutcome::Updated { version: 3 }
        );
        let exported: Vec<ExtendedDepositData> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(exported, data);
        assert_eq!(restarter.restarts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_restart_is_retried() {
        let dir = TempDir::new("tasks").unwrap();
        let services = MockServices::new(dir.path()).unwrap();
        services
            .authorization
            .set_deposit_data(5, deposit_data(&services, 1));
        let failing = UpdateDepositDataTask::new(
            services.provider.clone(),
            Arc::new(CommandRestarter::new("exit 1".to_string())),
            false,
            dir.path().join("deposit_data.json"),
        );

        assert!(failing.run().await.is_err());
        let stored = services.provider.db.deposit_data_provider().get().unwrap();
        assert_eq!(stored.version, 0);

        let restarter = Arc::new(CountingRestarter::default());
        assert_eq!(
            task(&dir, &services, restarter.clone(), false)
                .run()
                .await
                .unwrap(),
            UpdateOutcome::Updated { version: 5 }
        );
        assert_eq!(restarter.restarts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_root_mismatch_is_not_saved() {
        let dir = TempDir::new("tasks").unwrap();
        let services = MockServices::new(dir.path()).unwrap();
        services
            .authorization
            .set_deposit_data(1, deposit_data(&services, 2));
        services
            .execution
            .set_validators_root(B256::repeat_byte(0xee));
        let restarter = Arc::new(CountingRestarter::default());
        let task = task(&dir, &services, restarter.clone(), true);

        assert_eq!(task.run().await.unwrap(), UpdateOutcome::RootMismatch);
        let stored = services.provider.db.deposit_data_provider().get().unwrap();
        assert_eq!(stored.version, 0);
        assert_eq!(restarter.restarts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_matching_root_is_saved() {
        let dir = TempDir::new("tasks").unwrap();
        let services = MockServices::new(dir.path()).unwrap();
        let data = deposit_data(&services, 3);
        services
            .execution
            .set_validators_root(deposit_data_set_root(&data).unwrap());
        services.authorization.set_deposit_data(2, data);
        let restarter = Arc::new(CountingRestarter::default());

        assert_eq!(
            task(&dir, &services, restarter, true).run().await.unwrap(),
            UpdateOutcome::Updated { version: 2 }
        );
    }

    #[tokio::test]
    async fn test_unregistered_node_skips_update() {
        let dir = TempDir::new("tasks").unwrap();
        let services = MockServices::new(dir.path()).unwrap();
        services
            .authorization
            .set_registration_status(RegistrationStatus::Unregistered);
        let restarter = Arc::new(CountingRestarter::default());

        assert_eq!(
            task(&dir, &services, restarter, false).run().await.unwrap(),
            UpdateOutcome::NotRegistered
        );
    }
}
