use thiserror::Error;

/// A raw record could not be turned into a `BusinessRecord`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Failures from the persistence layer. Never retried locally.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record has an empty place_id")]
    MissingKey,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
