#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("search engine request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search engine returned malformed response: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("document not found in index: {0}")]
    NotFound(String),
}
