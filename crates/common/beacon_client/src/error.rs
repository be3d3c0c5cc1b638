use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Beacon node answered with status {status_code}")]
    RequestFailed { status_code: reqwest::StatusCode },

    #[error("Beacon node request failed: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Invalid beacon node url: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unexpected beacon node response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
