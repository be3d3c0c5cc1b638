use depot_wallet::WalletError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeSetError {
    #[error("Node is not registered with the NodeSet server")]
    NotRegistered,

    #[error("Node wallet is not usable: {0}")]
    Wallet(#[from] WalletError),

    #[error("NodeSet server responded with {status}: {message}")]
    RequestFailed { status: StatusCode, message: String },

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
