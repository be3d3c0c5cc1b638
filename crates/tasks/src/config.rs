use std::{path::PathBuf, time::Duration};

/// Pause between the two jobs of one iteration.
pub const DEFAULT_TASK_COOLDOWN: Duration = Duration::from_secs(5);

/// Pause after both jobs before the next iteration.
pub const DEFAULT_TASK_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Pause before checking readiness again.
pub const NOT_READY_SLEEP: Duration = Duration::from_secs(15);

pub const LOGIN_ATTEMPTS: usize = 3;
pub const LOGIN_RETRY_DELAY: Duration = Duration::from_secs(1);

pub const DEPOSIT_DATA_FILE: &str = "deposit_data.json";

#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub cooldown: Duration,
    pub interval: Duration,
    pub not_ready_sleep: Duration,
    pub login_retry_delay: Duration,
    /// Check fetched deposit data against the vault's on-chain root before saving it.
    pub verify_deposits_root: bool,
    /// Where the accepted deposit-data set is exported for the Operator.
    pub deposit_data_path: PathBuf,
}

impl TaskConfig {
    pub fn new(deposit_data_path: PathBuf) -> Self {
        Self {
            cooldown: DEFAULT_TASK_COOLDOWN,
            interval: DEFAULT_TASK_INTERVAL,
            not_ready_sleep: NOT_READY_SLEEP,
            login_retry_delay: LOGIN_RETRY_DELAY,
            verify_deposits_root: false,
            deposit_data_path,
        }
    }
}
