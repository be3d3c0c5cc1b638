use anyhow::{anyhow, ensure};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

/// Restarts the Operator so it picks up a new deposit-data file.
#[async_trait]
pub trait OperatorRestarter: Send + Sync {
    async fn restart(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct NoopRestarter;

#[async_trait]
impl OperatorRestarter for NoopRestarter {
    async fn restart(&self) -> anyhow::Result<()> {
        info!("No operator restart command configured, restart the Operator to load new data");
        Ok(())
    }
}

/// Runs a shell command, e.g. `docker restart stakewise-operator`.
#[derive(Debug)]
pub struct CommandRestarter {
    command: String,
}

impl CommandRestarter {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

#[async_trait]
impl OperatorRestarter for CommandRestarter {
    async fn restart(&self) -> anyhow::Result<()> {
        info!(command = %self.command, "Restarting Operator");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .status()
            .await
            .map_err(|err| anyhow!("Failed to run `{}`: {err}", self.command))?;
        ensure!(status.success(), "`{}` exited with {status}", self.command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_exit_status_is_checked() {
        assert!(CommandRestarter::new("true".to_string()).restart().await.is_ok());
        assert!(CommandRestarter::new("exit 3".to_string()).restart().await.is_err());
        assert!(NoopRestarter.restart().await.is_ok());
    }
}
