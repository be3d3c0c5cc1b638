use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Request failed with status code: {status_code}")]
    RequestFailed { status_code: reqwest::StatusCode },

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("JSON-RPC error: {0}")]
    RpcError(Value),

    #[error("Contract call failed: {0}")]
    ContractCall(String),

    #[error("Failed to decode ABI data: {0}")]
    AbiDecode(#[from] alloy_sol_types::Error),
}
