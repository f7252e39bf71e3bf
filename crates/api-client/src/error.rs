#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Parse(#[source] reqwest::Error),
    #[error("batch response is missing results for ids {missing:?}")]
    IncompleteBatch { missing: Vec<u64> },
}

impl ApiError {
    /// True for a 404 from the backend.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404, .. })
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
