use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use alloy_primitives::B256;
use depot_key_manager::GetAvailableKeysOptions;
use depot_node::ServiceProvider;
use tracing::{error, info};

/// Shared by every relay worker.
pub struct RelayState {
    pub services: Arc<ServiceProvider>,
    busy: AtomicBool,
    loading_keys: Arc<AtomicBool>,
    lookback_running: Arc<AtomicBool>,
}

/// Holds the relay's single request slot until dropped.
pub struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Clears a background-task flag when the task ends, however it ends.
struct FlagGuard(Arc<AtomicBool>);

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RelayState {
    pub fn new(services: Arc<ServiceProvider>) -> Self {
        Self {
            services,
            busy: AtomicBool::new(false),
            loading_keys: Arc::new(AtomicBool::new(false)),
            lookback_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claims the request slot, or `None` when another request holds it.
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { busy: &self.busy })
    }

    pub fn is_loading_keys(&self) -> bool {
        self.loading_keys.load(Ordering::Acquire)
    }

    pub fn is_lookback_running(&self) -> bool {
        self.lookback_running.load(Ordering::Acquire)
    }

    /// Loads private keys in the background. No-op while a load is already running.
    pub fn start_key_loading(&self) {
        if self
            .loading_keys
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let flag = FlagGuard(self.loading_keys.clone());
        let key_manager = self.services.key_manager.clone();
        tokio::spawn(async move {
            let _flag = flag;
            match key_manager.load_private_keys().await {
                Ok(loaded) => info!(loaded, "Private keys loaded"),
                Err(err) => error!("Failed to load private keys: {err}"),
            }
        });
    }

    /// Runs a full lookback scan in the background. Returns false when one is already
    /// running.
    pub fn start_lookback_scan(&self, deposit_root: B256, current_block: u64) -> bool {
        if self
            .lookback_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let flag = FlagGuard(self.lookback_running.clone());
        let key_manager = self.services.key_manager.clone();
        tokio::spawn(async move {
            let _flag = flag;
            info!(current_block, "Starting deposit event lookback scan");
            let options = GetAvailableKeysOptions {
                skip_sync_check: false,
                do_lookback_scan: true,
            };
            match key_manager
                .get_available_keys(deposit_root, current_block, options)
                .await
            {
                Ok(keys) => info!(
                    available = keys.available.len(),
                    ineligible = keys.ineligible.len(),
                    "Lookback scan complete"
                ),
                Err(err) => error!("Lookback scan failed: {err}"),
            }
        });
        true
    }
}
