use thiserror::Error;

/// Canonical result for the metadata layer.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] floe_core::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid JSON: {0}")]
    Json(String),

    /// The metadata pointer moved under a compare-and-swap commit. Callers
    /// may rebuild their update against the new base and retry.
    #[error("Commit conflict: {0}")]
    CommitConflict(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn json(msg: impl Into<String>) -> Self {
        Error::Json(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}
