use thiserror::Error;

/// Canonical result for the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised on user input: bad schema edits, unresolvable column names,
/// literals that cannot be converted to a field's type, illegal promotions.
///
/// Programmer errors (bucketing a boolean, out-of-range decimal table
/// lookups) and internal invariant failures panic instead; they are not
/// meant to be caught.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}
