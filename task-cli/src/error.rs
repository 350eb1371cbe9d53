use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of the task store. Missing or corrupt files are repaired, not reported.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write tasks to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize tasks")]
    Serialize(#[from] serde_json::Error),
}
