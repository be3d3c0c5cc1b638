pub mod config;
pub mod restarter;
pub mod send_exit_data;
pub mod task_loop;
pub mod update_deposit_data;

use std::{future::Future, time::Duration};

pub use task_loop::ReconciliationTaskLoop;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless cancelled first. Returns true when cancelled.
pub async fn sleep_with_cancel(cancellation: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancellation.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

/// Drives `job` to completion unless cancelled first. Returns `None` when cancelled.
pub async fn run_with_cancel<T>(
    cancellation: &CancellationToken,
    job: impl Future<Output = T>,
) -> Option<T> {
    tokio::select! {
        _ = cancellation.cancelled() => None,
        outcome = job => Some(outcome),
    }
}
