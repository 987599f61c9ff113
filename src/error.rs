use thiserror::Error;

#[derive(Error, Debug)]
pub enum HindsightError {
    /// Business-logic storage errors (open failure, commit failure, etc.)
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An internal invariant broke, e.g. a keyterm row whose scenario is
    /// gone. Unreachable under transactional writes, but never swallowed.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw database errors from rusqlite
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Date parse errors from chrono
    #[error("Date parse error: {0}")]
    DateParse(#[from] chrono::ParseError),
}

pub type HindsightResult<T> = Result<T, HindsightError>;
