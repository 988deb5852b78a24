use crate::llm::LlmError;
use serde::Serialize;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The embedding or generation provider is throttled or out of quota.
    #[error("provider quota exceeded")]
    QuotaExceeded,
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("message {message_id} not found in conversation {conversation_id}")]
    MessageNotFound {
        conversation_id: String,
        message_id: i64,
    },
    #[error("source document not found at {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("unsupported file type: .{0}")]
    UnsupportedFile(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Llm(LlmError),
    #[error("config error: {0}")]
    Config(String),
    #[error("password hashing failed: {0}")]
    Password(String),
}

impl Error {
    /// Quota errors are recovered locally by callers; everything else is a failure.
    pub fn is_quota(&self) -> bool {
        matches!(self, Error::QuotaExceeded)
    }
}

impl From<LlmError> for Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::QuotaExceeded => Error::QuotaExceeded,
            other => Error::Llm(other),
        }
    }
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
