use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ComparatorError {
    #[error("comparator binary not configured")]
    NotConfigured,

    #[error("failed to spawn comparator at {path}: {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("comparator at {path} timed out after {timeout_secs}s")]
    Timeout { path: PathBuf, timeout_secs: u64 },

    #[error("comparator exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },

    #[error("comparator output matrix is not valid JSON: {0}")]
    MalformedMatrix(#[from] serde_json::Error),

    #[error("comparator cell has malformed ComparedDocs field: {0:?}")]
    MalformedComparedDocs(String),
}
