use alloy_primitives::Address;
use depot_api_types::error::ApiError;
use depot_key_manager::KeyManagerError;
use depot_nodeset::NodeSetError;
use depot_wallet::WalletError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Another request is already being processed")]
    Busy,

    #[error("Validator keys are still being loaded")]
    KeysLoading,

    #[error("Deposit event lookback scan required, scan started")]
    LookbackScanRequired,

    #[error("Deposit event lookback scan is still running")]
    LookbackScanRunning,

    #[error("Node wallet is not ready: {0}")]
    WalletNotReady(#[from] WalletError),

    #[error("Execution client is not synced")]
    ExecutionClientNotSynced,

    #[error("Beacon node is not synced")]
    BeaconNodeNotSynced,

    #[error("Requested vault {requested} does not match the configured vault {configured}")]
    VaultMismatch {
        requested: Address,
        configured: Address,
    },

    #[error("Validator indices starting at {start_index} overflow")]
    ValidatorIndexOverflow { start_index: u64 },

    #[error("Node is not registered with NodeSet")]
    NotRegistered,

    #[error("Node does not have permission to register validators with this deployment")]
    InvalidPermissions,

    #[error("NodeSet cannot find vault {vault} on deployment {deployment}")]
    VaultNotFound { vault: Address, deployment: String },

    #[error("Key manager error: {0}")]
    KeyManager(KeyManagerError),

    #[error("NodeSet error: {0}")]
    NodeSet(NodeSetError),

    #[error("{0}")]
    Internal(String),
}

impl From<KeyManagerError> for RelayError {
    fn from(err: KeyManagerError) -> Self {
        match err {
            KeyManagerError::BeaconNodeNotSynced => RelayError::BeaconNodeNotSynced,
            KeyManagerError::ExecutionClientNotSynced => RelayError::ExecutionClientNotSynced,
            err => RelayError::KeyManager(err),
        }
    }
}

impl From<NodeSetError> for RelayError {
    fn from(err: NodeSetError) -> Self {
        match err {
            NodeSetError::NotRegistered => RelayError::NotRegistered,
            err => RelayError::NodeSet(err),
        }
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::Internal(err.to_string())
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        let message = err.to_string();
        match err {
            RelayError::Busy => ApiError::Busy,
            RelayError::KeysLoading
            | RelayError::LookbackScanRequired
            | RelayError::LookbackScanRunning => ApiError::Unavailable(message),
            RelayError::WalletNotReady(_)
            | RelayError::ExecutionClientNotSynced
            | RelayError::BeaconNodeNotSynced
            | RelayError::VaultMismatch { .. }
            | RelayError::ValidatorIndexOverflow { .. }
            | RelayError::NotRegistered
            | RelayError::VaultNotFound { .. } => ApiError::Unprocessable(message),
            RelayError::InvalidPermissions => ApiError::Unauthorized(message),
            RelayError::KeyManager(_) | RelayError::NodeSet(_) | RelayError::Internal(_) => {
                ApiError::InternalError(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{ResponseError, http::StatusCode};

    use super::*;

    fn status(err: RelayError) -> StatusCode {
        ApiError::from(err).status_code()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status(RelayError::Busy), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status(RelayError::LookbackScanRequired),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(KeyManagerError::ExecutionClientNotSynced.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(NodeSetError::NotRegistered.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(RelayError::ValidatorIndexOverflow {
                start_index: u64::MAX
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(RelayError::InvalidPermissions),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(NodeSetError::InvalidResponse("boom".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
