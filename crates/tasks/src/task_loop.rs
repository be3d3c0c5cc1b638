use std::sync::Arc;

use depot_metrics::{TASK_RUNS, inc_int_counter_vec};
use depot_node::ServiceProvider;
use depot_nodeset::types::RegistrationStatus;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::{LOGIN_ATTEMPTS, TaskConfig},
    restarter::OperatorRestarter,
    run_with_cancel,
    send_exit_data::SendExitDataTask,
    sleep_with_cancel,
    update_deposit_data::UpdateDepositDataTask,
};

/// Periodically syncs deposit data from the authorization service and uploads missing
/// exit messages, until cancelled.
pub struct ReconciliationTaskLoop {
    services: Arc<ServiceProvider>,
    config: TaskConfig,
    update_deposit_data: UpdateDepositDataTask,
    send_exit_data: SendExitDataTask,
    cancellation: CancellationToken,
}

impl ReconciliationTaskLoop {
    pub fn new(
        services: Arc<ServiceProvider>,
        config: TaskConfig,
        restarter: Arc<dyn OperatorRestarter>,
        cancellation: CancellationToken,
    ) -> Self {
        let update_deposit_data = UpdateDepositDataTask::new(
            services.clone(),
            restarter,
            config.verify_deposits_root,
            config.deposit_data_path.clone(),
        );
        let send_exit_data = SendExitDataTask::new(services.clone());
        Self {
            services,
            config,
            update_deposit_data,
            send_exit_data,
            cancellation,
        }
    }

    pub async fn start(self) {
        info!("Starting reconciliation task loop");
        if self.login_with_retries().await {
            info!("Reconciliation task loop stopped");
            return;
        }

        loop {
            if self.wait_until_ready().await {
                break;
            }

            let Some(outcome) =
                run_with_cancel(&self.cancellation, self.update_deposit_data.run()).await
            else {
                break;
            };
            record_run("update_deposit_data", outcome.map(|_| ()));
            if sleep_with_cancel(&self.cancellation, self.config.cooldown).await {
                break;
            }

            let Some(outcome) =
                run_with_cancel(&self.cancellation, self.send_exit_data.run()).await
            else {
                break;
            };
            record_run("send_exit_data", outcome.map(|_| ()));
            if sleep_with_cancel(&self.cancellation, self.config.interval).await {
                break;
            }
        }
        info!("Reconciliation task loop stopped");
    }

    /// Returns true when cancelled.
    async fn login_with_retries(&self) -> bool {
        let authorization = &self.services.authorization;
        for attempt in 1..=LOGIN_ATTEMPTS {
            let Some(status) =
                run_with_cancel(&self.cancellation, authorization.registration_status()).await
            else {
                return true;
            };
            match status {
                Ok(RegistrationStatus::Registered) => {
                    info!("Logged into the NodeSet server");
                    return false;
                }
                Ok(RegistrationStatus::NoWallet) => {
                    info!("Node wallet is not initialized yet, skipping login");
                    return false;
                }
                Ok(RegistrationStatus::Unregistered) => {
                    info!("Node is not registered with the NodeSet server yet");
                    return false;
                }
                Ok(RegistrationStatus::Unknown) => {
                    warn!(attempt, "NodeSet registration status is unknown")
                }
                Err(err) => warn!(attempt, "Failed to log into the NodeSet server: {err}"),
            }
            if attempt < LOGIN_ATTEMPTS
                && sleep_with_cancel(&self.cancellation, self.config.login_retry_delay).await
            {
                return true;
            }
        }
        warn!("Giving up on login, the loop will retry on its next request");
        false
    }

    /// Returns true when cancelled.
    async fn wait_until_ready(&self) -> bool {
        loop {
            if self.cancellation.is_cancelled() {
                return true;
            }
            match self.services.wallet.ensure_ready() {
                Ok(()) => return false,
                Err(err) => error!("Node wallet is not ready: {err}"),
            }
            if sleep_with_cancel(&self.cancellation, self.config.not_ready_sleep).await {
                return true;
            }
        }
    }
}

fn record_run(job: &str, outcome: anyhow::Result<()>) {
    match outcome {
        Ok(()) => inc_int_counter_vec(&TASK_RUNS, &[job, "success"]),
        Err(err) => {
            error!(job, "Task failed: {err:#}");
            inc_int_counter_vec(&TASK_RUNS, &[job, "failure"]);
        }
    }
}
