use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

use alloy_primitives::{B256, aliases::B32};
use async_trait::async_trait;
use depot_api_types::beacon::{Genesis, Validator, ValidatorData};
use depot_bls::PublicKey;
use depot_consensus::constants::{DEPOSIT_AMOUNT_GWEI, FAR_FUTURE_EPOCH};

use crate::{ConsensusClient, error::ClientError};

/// In-memory beacon node: a registry that can be edited between calls.
#[derive(Debug, Default)]
pub struct MockConsensusClient {
    validators: Mutex<HashMap<PublicKey, ValidatorData>>,
    not_synced: AtomicBool,
    unreachable: AtomicBool,
    finalized_epoch: AtomicU64,
    status_queries: AtomicUsize,
}

impl MockConsensusClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_validator(&self, public_key: PublicKey, index: u64) {
        let data = ValidatorData {
            index,
            balance: DEPOSIT_AMOUNT_GWEI,
            status: "pending_initialized".to_string(),
            validator: Validator {
                pubkey: public_key.clone(),
                withdrawal_credentials: B256::ZERO,
                effective_balance: DEPOSIT_AMOUNT_GWEI,
                slashed: false,
                activation_eligibility_epoch: FAR_FUTURE_EPOCH,
                activation_epoch: FAR_FUTURE_EPOCH,
                exit_epoch: FAR_FUTURE_EPOCH,
                withdrawable_epoch: FAR_FUTURE_EPOCH,
            },
        };
        if let Ok(mut validators) = self.validators.lock() {
            validators.insert(public_key, data);
        }
    }

    pub fn set_synced(&self, synced: bool) {
        self.not_synced.store(!synced, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_finalized_epoch(&self, epoch: u64) {
        self.finalized_epoch.store(epoch, Ordering::SeqCst);
    }

    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), ClientError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ClientError::InvalidResponse(
                "beacon node unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ConsensusClient for MockConsensusClient {
    async fn validator_statuses(
        &self,
        public_keys: &[PublicKey],
    ) -> Result<HashMap<PublicKey, ValidatorData>, ClientError> {
        self.check_reachable()?;
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        let validators = self
            .validators
            .lock()
            .map_err(|err| ClientError::InvalidResponse(err.to_string()))?;
        Ok(public_keys
            .iter()
            .filter_map(|key| validators.get(key).map(|data| (key.clone(), data.clone())))
            .collect())
    }

    async fn is_synced(&self) -> Result<bool, ClientError> {
        self.check_reachable()?;
        Ok(!self.not_synced.load(Ordering::SeqCst))
    }

    async fn finalized_epoch(&self) -> Result<u64, ClientError> {
        self.check_reachable()?;
        Ok(self.finalized_epoch.load(Ordering::SeqCst))
    }

    async fn genesis(&self) -> Result<Genesis, ClientError> {
        self.check_reachable()?;
        Ok(Genesis {
            genesis_time: 1606824023,
            genesis_validators_root: B256::repeat_byte(0x4b),
            genesis_fork_version: B32::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use depot_bls::PrivateKey;

    use super::*;

    #[tokio::test]
    async fn test_unknown_keys_are_absent() {
        let client = MockConsensusClient::new();
        let known = PrivateKey::generate().unwrap().public_key().unwrap();
        let unknown = PrivateKey::generate().unwrap().public_key().unwrap();
        client.add_validator(known.clone(), 7);

        let statuses = client
            .validator_statuses(&[known.clone(), unknown.clone()])
            .await
            .unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[&known].index, 7);
        assert!(!statuses.contains_key(&unknown));
    }

    #[tokio::test]
    async fn test_exit_domain_uses_capella_version() {
        let client = MockConsensusClient::new();
        let capella = client
            .voluntary_exit_domain(alloy_primitives::fixed_bytes!("0x03000000"))
            .await
            .unwrap();
        let genesis = client.voluntary_exit_domain(B32::ZERO).await.unwrap();
        assert_eq!(&capella[..4], &[4, 0, 0, 0]);
        assert_ne!(capella, genesis);
    }
}
