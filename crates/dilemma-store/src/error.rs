use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bias profile not found: {0}")]
    ProfileNotFound(std::path::PathBuf),

    #[error("nation name must be non-empty and alphanumeric, got {0:?}")]
    InvalidNation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("{0}")]
    Other(String),
}
