use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
    time::Instant,
};

use alloy_primitives::B256;
use depot_beacon_client::ConsensusClient;
use depot_bls::{PrivateKey, PublicKey};
use depot_execution_client::{ContractRegistry, ExecutionClient, ExecutionError};
use depot_metrics::{
    AVAILABLE_KEYS, KEY_FILTER_TIME, set_int_gauge_vec, start_timer_vec, stop_timer,
};
use depot_storage::{
    db::DepotDB,
    tables::{
        available_keys::{AvailableKey, AvailableKeyList, AvailableKeysField},
        field::Field,
    },
};
use depot_wallet::{Wallet, WalletError};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::KeyManagerError;

/// Blocks requested per `eth_getLogs` call.
pub const INTERVAL_SIZE: u64 = 5040;

/// How far behind the head a deposit can land and still be missing from the beacon state.
pub const DEPOSIT_EVENT_LOOKBACK_LIMIT: u64 = 50400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IneligibleReason {
    NoPrivateKey,
    LookbackScanRequired,
    OnBeacon,
    HasDepositEvent,
    AlreadyUsedDepositRoot,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            IneligibleReason::NoPrivateKey => "no_private_key",
            IneligibleReason::LookbackScanRequired => "lookback_scan_required",
            IneligibleReason::OnBeacon => "on_beacon",
            IneligibleReason::HasDepositEvent => "has_deposit_event",
            IneligibleReason::AlreadyUsedDepositRoot => "already_used_deposit_root",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetAvailableKeysOptions {
    /// The caller already confirmed both clients are synced.
    pub skip_sync_check: bool,
    /// Scan the whole lookback window instead of resuming at the scan marker, and mark
    /// every scanned key as covered.
    pub do_lookback_scan: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableKeys {
    /// Eligible keys, in the order they were generated.
    pub available: Vec<PublicKey>,
    pub ineligible: HashMap<PublicKey, IneligibleReason>,
}

#[derive(Debug, Default)]
struct KeyState {
    list: AvailableKeyList,
    private_keys: HashMap<PublicKey, PrivateKey>,
    keys_loaded: bool,
}

#[derive(Debug, Default)]
struct DepositScan {
    deposited: HashSet<PublicKey>,
    next_block_to_scan: u64,
    error: Option<ExecutionError>,
}

/// Tracks every generated key that may still be handed out, and decides which of them are
/// safe to deposit against a given deposit root.
pub struct AvailableKeyManager {
    state: Mutex<KeyState>,
    field: AvailableKeysField,
    wallet: Wallet,
    consensus: Arc<dyn ConsensusClient>,
    execution: Arc<dyn ExecutionClient>,
    registry: ContractRegistry,
}

impl AvailableKeyManager {
    pub fn new(
        db: &DepotDB,
        wallet: Wallet,
        consensus: Arc<dyn ConsensusClient>,
        execution: Arc<dyn ExecutionClient>,
        registry: ContractRegistry,
    ) -> Result<Self, KeyManagerError> {
        let field = db.available_keys_provider();
        let list = field.get()?;
        debug!(
            keys = list.keys.len(),
            next_block_to_scan = list.next_block_to_scan,
            "Loaded available keys"
        );

        Ok(Self {
            state: Mutex::new(KeyState {
                list,
                ..Default::default()
            }),
            field,
            wallet,
            consensus,
            execution,
            registry,
        })
    }

    fn persist(&self, list: &AvailableKeyList) -> Result<(), KeyManagerError> {
        self.field.insert(list.clone())?;
        Ok(())
    }

    async fn lock_state(&self) -> MutexGuard<'_, KeyState> {
        let start = Instant::now();
        let state = self.state.lock().await;
        debug!(elapsed = ?start.elapsed(), "Acquired key manager lock");
        state
    }

    pub async fn has_loaded_keys(&self) -> bool {
        self.state.lock().await.keys_loaded
    }

    pub async fn has_key_candidates(&self) -> bool {
        !self.state.lock().await.list.keys.is_empty()
    }

    pub async fn key_count(&self) -> usize {
        self.state.lock().await.list.keys.len()
    }

    /// Decrypts the private key of every tracked key. Returns how many were found.
    pub async fn load_private_keys(&self) -> Result<usize, KeyManagerError> {
        let mut state = self.lock_state().await;
        self.load_private_keys_locked(&mut state).await
    }

    async fn load_private_keys_locked(
        &self,
        state: &mut KeyState,
    ) -> Result<usize, KeyManagerError> {
        let start = Instant::now();
        let wallet = self.wallet.clone();
        let public_keys = state
            .list
            .keys
            .iter()
            .map(|key| key.public_key.clone())
            .collect::<Vec<_>>();
        let private_keys = tokio::task::spawn_blocking(move || wallet.validator_keys(&public_keys))
            .await
            .map_err(|err| KeyManagerError::KeyLoading(err.to_string()))??;

        for key in &state.list.keys {
            if !private_keys.contains_key(&key.public_key) {
                warn!(
                    public_key = ?key.public_key,
                    "Private key not found in the wallet, key is ineligible until it is restored"
                );
            }
        }
        info!(
            loaded = private_keys.len(),
            tracked = state.list.keys.len(),
            elapsed = ?start.elapsed(),
            "Loaded private keys"
        );

        state.private_keys = private_keys;
        state.keys_loaded = true;
        Ok(state.private_keys.len())
    }

    /// Private keys for `public_keys`, in the same order.
    pub async fn private_keys(
        &self,
        public_keys: &[PublicKey],
    ) -> Result<Vec<PrivateKey>, KeyManagerError> {
        let state = self.state.lock().await;
        public_keys
            .iter()
            .map(|public_key| {
                state
                    .private_keys
                    .get(public_key)
                    .cloned()
                    .ok_or_else(|| KeyManagerError::MissingPrivateKey(public_key.clone()))
            })
            .collect()
    }

    /// Starts tracking a freshly generated key. Keys already tracked are left untouched.
    pub async fn add_new_key(&self, private_key: &PrivateKey) -> Result<(), KeyManagerError> {
        let public_key = private_key.public_key().map_err(WalletError::from)?;
        let mut state = self.lock_state().await;
        if state
            .list
            .keys
            .iter()
            .any(|key| key.public_key == public_key)
        {
            debug!(?public_key, "Key is already tracked");
            return Ok(());
        }

        let mut list = state.list.clone();
        list.keys.push(AvailableKey::new(public_key.clone()));
        self.persist(&list)?;
        state.list = list;
        state.private_keys.insert(public_key, private_key.clone());
        Ok(())
    }

    /// Records that `public_keys` were just handed out against `deposit_root`.
    pub async fn set_last_deposit_root(
        &self,
        public_keys: &[PublicKey],
        deposit_root: B256,
    ) -> Result<(), KeyManagerError> {
        let wanted = public_keys.iter().collect::<HashSet<_>>();
        let mut state = self.lock_state().await;
        let mut list = state.list.clone();
        let mut updated = 0;
        for key in list
            .keys
            .iter_mut()
            .filter(|key| wanted.contains(&key.public_key))
        {
            key.last_deposit_root = Some(deposit_root);
            updated += 1;
        }
        if updated != wanted.len() {
            warn!(
                requested = wanted.len(),
                updated, "Some keys were no longer tracked when setting their deposit root"
            );
        }

        self.persist(&list)?;
        state.list = list;
        Ok(())
    }

    /// True while some usable key has never been covered by a full lookback scan, or when the
    /// scan marker has fallen out of the lookback window.
    pub async fn requires_lookback_scan(&self, current_block: u64) -> bool {
        let state = self.state.lock().await;
        let mut usable = state
            .list
            .keys
            .iter()
            .filter(|key| !state.keys_loaded || state.private_keys.contains_key(&key.public_key))
            .peekable();
        if usable.peek().is_none() {
            return false;
        }

        usable.any(|key| !key.has_lookback_scanned)
            || current_block.saturating_sub(state.list.next_block_to_scan)
                > DEPOSIT_EVENT_LOOKBACK_LIMIT
    }

    /// Re-reads the tracked keys from storage. Private keys are loaded again on next use.
    pub async fn reload(&self) -> Result<(), KeyManagerError> {
        let list = self.field.get()?;
        let mut state = self.lock_state().await;
        debug!(keys = list.keys.len(), "Reloaded available keys");
        *state = KeyState {
            list,
            ..Default::default()
        };
        Ok(())
    }

    /// Classifies every tracked key against the chain.
    ///
    /// Keys already on the beacon chain or with a deposit event in the scanned window are
    /// dropped for good. Keys last handed out against `current_deposit_root` are skipped but
    /// kept, and become eligible again once the deposit root moves.
    pub async fn get_available_keys(
        &self,
        current_deposit_root: B256,
        current_block: u64,
        options: GetAvailableKeysOptions,
    ) -> Result<AvailableKeys, KeyManagerError> {
        let start = Instant::now();
        if !options.skip_sync_check {
            if !self.consensus.is_synced().await? {
                return Err(KeyManagerError::BeaconNodeNotSynced);
            }
            if !self.execution.is_synced().await? {
                return Err(KeyManagerError::ExecutionClientNotSynced);
            }
        }

        let mut state = self.lock_state().await;
        if !state.keys_loaded {
            self.load_private_keys_locked(&mut state).await?;
        }

        let mut ineligible = HashMap::new();
        let mut candidates = vec![];
        for key in &state.list.keys {
            if !state.private_keys.contains_key(&key.public_key) {
                ineligible.insert(key.public_key.clone(), IneligibleReason::NoPrivateKey);
            } else if !options.do_lookback_scan && !key.has_lookback_scanned {
                ineligible.insert(
                    key.public_key.clone(),
                    IneligibleReason::LookbackScanRequired,
                );
            } else {
                candidates.push(key.public_key.clone());
            }
        }
        let scanned = candidates.iter().cloned().collect::<HashSet<_>>();

        let on_beacon = self.keys_on_beacon(&candidates).await?;
        candidates.retain(|public_key| !on_beacon.contains(public_key));

        let scan = self
            .scan_deposit_events(
                &candidates,
                state.list.next_block_to_scan,
                current_block,
                options.do_lookback_scan,
            )
            .await;

        let mut list = state.list.clone();
        list.keys.retain(|key| {
            !on_beacon.contains(&key.public_key) && !scan.deposited.contains(&key.public_key)
        });
        list.next_block_to_scan = scan.next_block_to_scan;
        if options.do_lookback_scan && scan.error.is_none() {
            for key in list
                .keys
                .iter_mut()
                .filter(|key| scanned.contains(&key.public_key))
            {
                key.has_lookback_scanned = true;
            }
        }
        self.persist(&list)?;
        state.list = list;
        for public_key in on_beacon.iter().chain(scan.deposited.iter()) {
            state.private_keys.remove(public_key);
        }
        if let Some(err) = scan.error {
            return Err(err.into());
        }

        for public_key in &on_beacon {
            ineligible.insert(public_key.clone(), IneligibleReason::OnBeacon);
        }
        for public_key in &scan.deposited {
            ineligible.insert(public_key.clone(), IneligibleReason::HasDepositEvent);
        }

        let remaining = candidates
            .iter()
            .filter(|public_key| !scan.deposited.contains(*public_key))
            .collect::<HashSet<_>>();
        let mut available = vec![];
        for key in state
            .list
            .keys
            .iter()
            .filter(|key| remaining.contains(&key.public_key))
        {
            if key.last_deposit_root == Some(current_deposit_root) {
                ineligible.insert(
                    key.public_key.clone(),
                    IneligibleReason::AlreadyUsedDepositRoot,
                );
            } else {
                available.push(key.public_key.clone());
            }
        }

        set_int_gauge_vec(&AVAILABLE_KEYS, available.len() as i64, &[]);
        debug!(
            available = available.len(),
            ineligible = ineligible.len(),
            next_block_to_scan = state.list.next_block_to_scan,
            elapsed = ?start.elapsed(),
            "Filtered available keys"
        );
        Ok(AvailableKeys {
            available,
            ineligible,
        })
    }

    async fn keys_on_beacon(
        &self,
        candidates: &[PublicKey],
    ) -> Result<HashSet<PublicKey>, KeyManagerError> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }

        let timer = start_timer_vec(&KEY_FILTER_TIME, &["beacon"]);
        let statuses = self.consensus.validator_statuses(candidates).await?;
        stop_timer(timer);
        Ok(candidates
            .iter()
            .filter(|public_key| statuses.contains_key(*public_key))
            .cloned()
            .collect())
    }

    /// Walks `[start, current_block]` in `INTERVAL_SIZE` chunks. On a failed chunk the
    /// marker stops at that chunk so the next call resumes there.
    async fn scan_deposit_events(
        &self,
        candidates: &[PublicKey],
        next_block_to_scan: u64,
        current_block: u64,
        do_lookback_scan: bool,
    ) -> DepositScan {
        let mut scan = DepositScan {
            next_block_to_scan,
            ..Default::default()
        };
        if candidates.is_empty() {
            return scan;
        }

        let lookback_start = current_block.saturating_sub(DEPOSIT_EVENT_LOOKBACK_LIMIT);
        let start_block = if do_lookback_scan {
            lookback_start
        } else {
            next_block_to_scan.max(lookback_start)
        };
        let wanted = candidates.iter().collect::<HashSet<_>>();
        debug!(from = start_block, to = current_block, "Scanning deposit events");

        let timer = start_timer_vec(&KEY_FILTER_TIME, &["deposit_events"]);
        let mut chunk_start = start_block;
        while chunk_start <= current_block {
            let chunk_end = chunk_start
                .saturating_add(INTERVAL_SIZE - 1)
                .min(current_block);
            match self
                .registry
                .deposit_events(self.execution.as_ref(), chunk_start, chunk_end)
                .await
            {
                Ok(events) => {
                    for event in events {
                        if wanted.contains(&event.public_key) {
                            debug!(
                                public_key = ?event.public_key,
                                block = ?event.block_number,
                                "Found deposit for tracked key"
                            );
                            scan.deposited.insert(event.public_key);
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        from = chunk_start,
                        to = chunk_end,
                        "Deposit event scan interrupted: {err}"
                    );
                    scan.next_block_to_scan = chunk_start;
                    scan.error = Some(err);
                    return scan;
                }
            }
            chunk_start = chunk_end + 1;
        }
        stop_timer(timer);

        scan.next_block_to_scan = current_block + 1;
        scan
    }
}

#[cfg(test)]
mod tests {
    use depot_beacon_client::mock::MockConsensusClient;
    use depot_execution_client::mock::MockExecutionClient;
    use depot_network_spec::networks::DEV;
    use tempdir::TempDir;

    use super::*;

    const HEAD: u64 = 100_000;

    struct Harness {
        _dir: TempDir,
        db: DepotDB,
        wallet: Wallet,
        consensus: Arc<MockConsensusClient>,
        execution: Arc<MockExecutionClient>,
        manager: AvailableKeyManager,
    }

    fn harness() -> Harness {
        let dir = TempDir::new("key_manager").unwrap();
        let db = DepotDB::new(dir.path().join("db")).unwrap();
        let wallet = Wallet::new(dir.path().join("wallet"), None).with_kdf_iterations(16);
        let registry = ContractRegistry::new(&DEV);
        let consensus = Arc::new(MockConsensusClient::new());
        let execution = Arc::new(MockExecutionClient::new(registry.clone()));
        execution.set_block_number(HEAD);
        let manager = AvailableKeyManager::new(
            &db,
            wallet.clone(),
            consensus.clone(),
            execution.clone(),
            registry,
        )
        .unwrap();

        Harness {
            _dir: dir,
            db,
            wallet,
            consensus,
            execution,
            manager,
        }
    }

    async fn new_key(harness: &Harness) -> PublicKey {
        let private_key = harness.wallet.generate_validator_key().unwrap();
        harness.manager.add_new_key(&private_key).await.unwrap();
        private_key.public_key().unwrap()
    }

    fn lookback() -> GetAvailableKeysOptions {
        GetAvailableKeysOptions {
            skip_sync_check: false,
            do_lookback_scan: true,
        }
    }

    fn stored(harness: &Harness) -> AvailableKeyList {
        harness.db.available_keys_provider().get().unwrap()
    }

    #[tokio::test]
    async fn test_new_keys_need_lookback_scan() {
        let harness = harness();
        let first = new_key(&harness).await;
        let second = new_key(&harness).await;
        assert!(harness.manager.requires_lookback_scan(HEAD).await);

        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, GetAvailableKeysOptions::default())
            .await
            .unwrap();
        assert!(keys.available.is_empty());
        assert_eq!(
            keys.ineligible[&first],
            IneligibleReason::LookbackScanRequired
        );
        assert_eq!(
            keys.ineligible[&second],
            IneligibleReason::LookbackScanRequired
        );

        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();
        assert_eq!(keys.available, vec![first, second]);
        assert!(keys.ineligible.is_empty());
        assert!(!harness.manager.requires_lookback_scan(HEAD).await);

        let list = stored(&harness);
        assert_eq!(list.next_block_to_scan, HEAD + 1);
        assert!(list.keys.iter().all(|key| key.has_lookback_scanned));
    }

    #[tokio::test]
    async fn test_keys_on_beacon_are_dropped() {
        let harness = harness();
        let first = new_key(&harness).await;
        let second = new_key(&harness).await;
        harness.consensus.add_validator(first.clone(), 7);

        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();
        assert_eq!(keys.available, vec![second.clone()]);
        assert_eq!(keys.ineligible[&first], IneligibleReason::OnBeacon);

        harness.manager.reload().await.unwrap();
        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, GetAvailableKeysOptions::default())
            .await
            .unwrap();
        assert_eq!(keys.available, vec![second]);
        assert!(!keys.ineligible.contains_key(&first));
        assert_eq!(stored(&harness).keys.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_with_deposit_events_are_dropped() {
        let harness = harness();
        let first = new_key(&harness).await;
        let second = new_key(&harness).await;
        harness.execution.add_deposit(&first, HEAD - 10);

        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();
        assert_eq!(keys.available, vec![second.clone()]);
        assert_eq!(keys.ineligible[&first], IneligibleReason::HasDepositEvent);

        let list = stored(&harness);
        assert_eq!(list.keys.len(), 1);
        assert_eq!(list.keys[0].public_key, second);
    }

    #[tokio::test]
    async fn test_deposits_outside_the_window_are_not_scanned() {
        let harness = harness();
        let key = new_key(&harness).await;
        harness
            .execution
            .add_deposit(&key, HEAD - DEPOSIT_EVENT_LOOKBACK_LIMIT - 1);

        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();
        assert_eq!(keys.available, vec![key]);
    }

    #[tokio::test]
    async fn test_incremental_scan_resumes_at_marker() {
        let harness = harness();
        let first = new_key(&harness).await;
        let second = new_key(&harness).await;
        harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();
        let queries = harness.execution.log_queries();

        harness.execution.add_deposit(&second, HEAD + 50);
        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD + 100, GetAvailableKeysOptions::default())
            .await
            .unwrap();
        assert_eq!(keys.available, vec![first]);
        assert_eq!(keys.ineligible[&second], IneligibleReason::HasDepositEvent);
        assert_eq!(harness.execution.log_queries(), queries + 1);
        assert_eq!(stored(&harness).next_block_to_scan, HEAD + 101);
    }

    #[tokio::test]
    async fn test_deposit_root_exclusion_is_temporary() {
        let harness = harness();
        let first = new_key(&harness).await;
        let second = new_key(&harness).await;
        let root = B256::repeat_byte(0x11);
        harness
            .manager
            .get_available_keys(root, HEAD, lookback())
            .await
            .unwrap();

        harness
            .manager
            .set_last_deposit_root(std::slice::from_ref(&first), root)
            .await
            .unwrap();
        let keys = harness
            .manager
            .get_available_keys(root, HEAD, GetAvailableKeysOptions::default())
            .await
            .unwrap();
        assert_eq!(keys.available, vec![second.clone()]);
        assert_eq!(
            keys.ineligible[&first],
            IneligibleReason::AlreadyUsedDepositRoot
        );

        let keys = harness
            .manager
            .get_available_keys(
                B256::repeat_byte(0x22),
                HEAD,
                GetAvailableKeysOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(keys.available, vec![first.clone(), second]);
        assert_eq!(stored(&harness).keys[0].last_deposit_root, Some(root));
    }

    #[tokio::test]
    async fn test_zero_deposit_root_still_excludes_used_keys() {
        let harness = harness();
        let first = new_key(&harness).await;
        let second = new_key(&harness).await;
        harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();

        harness
            .manager
            .set_last_deposit_root(std::slice::from_ref(&first), B256::ZERO)
            .await
            .unwrap();
        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, GetAvailableKeysOptions::default())
            .await
            .unwrap();
        assert_eq!(keys.available, vec![second]);
        assert_eq!(
            keys.ineligible[&first],
            IneligibleReason::AlreadyUsedDepositRoot
        );
        assert_eq!(stored(&harness).keys[0].last_deposit_root, Some(B256::ZERO));
    }

    #[tokio::test]
    async fn test_repeated_calls_are_stable() {
        let harness = harness();
        new_key(&harness).await;
        new_key(&harness).await;
        let first = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();
        let second = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, GetAvailableKeysOptions::default())
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_key_without_private_key_is_kept() {
        let harness = harness();
        let stored_key = new_key(&harness).await;
        let orphan = PrivateKey::generate().unwrap();
        harness.manager.add_new_key(&orphan).await.unwrap();
        let orphan = orphan.public_key().unwrap();

        harness.manager.reload().await.unwrap();
        assert!(!harness.manager.has_loaded_keys().await);
        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();
        assert!(harness.manager.has_loaded_keys().await);
        assert_eq!(keys.available, vec![stored_key.clone()]);
        assert_eq!(keys.ineligible[&orphan], IneligibleReason::NoPrivateKey);
        assert_eq!(stored(&harness).keys.len(), 2);
        assert!(!harness.manager.requires_lookback_scan(HEAD).await);

        assert!(harness.manager.private_keys(&[stored_key]).await.is_ok());
        assert!(matches!(
            harness.manager.private_keys(&[orphan]).await,
            Err(KeyManagerError::MissingPrivateKey(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_chunk_keeps_partial_progress() {
        let harness = harness();
        let first = new_key(&harness).await;
        let second = new_key(&harness).await;
        let window_start = HEAD - DEPOSIT_EVENT_LOOKBACK_LIMIT;
        let failing_chunk = window_start + 2 * INTERVAL_SIZE;
        harness.execution.add_deposit(&first, window_start + 10);
        harness.execution.fail_logs_from_block(Some(failing_chunk));

        let result = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await;
        assert!(matches!(result, Err(KeyManagerError::Execution(_))));

        let list = stored(&harness);
        assert_eq!(list.next_block_to_scan, failing_chunk);
        assert_eq!(list.keys.len(), 1);
        assert_eq!(list.keys[0].public_key, second);
        assert!(!list.keys[0].has_lookback_scanned);

        harness.execution.fail_logs_from_block(None);
        let keys = harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();
        assert_eq!(keys.available, vec![second]);
    }

    #[tokio::test]
    async fn test_stale_marker_requires_lookback_scan() {
        let harness = harness();
        assert!(!harness.manager.requires_lookback_scan(HEAD).await);

        new_key(&harness).await;
        harness
            .manager
            .get_available_keys(B256::ZERO, HEAD, lookback())
            .await
            .unwrap();
        assert!(
            !harness
                .manager
                .requires_lookback_scan(HEAD + DEPOSIT_EVENT_LOOKBACK_LIMIT)
                .await
        );
        assert!(
            harness
                .manager
                .requires_lookback_scan(HEAD + DEPOSIT_EVENT_LOOKBACK_LIMIT + 2)
                .await
        );
    }

    #[tokio::test]
    async fn test_unsynced_clients_are_reported() {
        let harness = harness();
        new_key(&harness).await;

        harness.consensus.set_synced(false);
        assert!(matches!(
            harness
                .manager
                .get_available_keys(B256::ZERO, HEAD, lookback())
                .await,
            Err(KeyManagerError::BeaconNodeNotSynced)
        ));
        let options = GetAvailableKeysOptions {
            skip_sync_check: true,
            do_lookback_scan: true,
        };
        assert!(
            harness
                .manager
                .get_available_keys(B256::ZERO, HEAD, options)
                .await
                .is_ok()
        );

        harness.consensus.set_synced(true);
        harness.execution.set_synced(false);
        assert!(matches!(
            harness
                .manager
                .get_available_keys(B256::ZERO, HEAD, lookback())
                .await,
            Err(KeyManagerError::ExecutionClientNotSynced)
        ));
    }

    #[tokio::test]
    async fn test_adding_a_tracked_key_is_a_no_op() {
        let harness = harness();
        let private_key = harness.wallet.generate_validator_key().unwrap();
        harness.manager.add_new_key(&private_key).await.unwrap();
        harness.manager.add_new_key(&private_key).await.unwrap();
        assert_eq!(harness.manager.key_count().await, 1);
        assert!(harness.manager.has_key_candidates().await);
    }
}
