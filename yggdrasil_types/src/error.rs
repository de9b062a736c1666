use std::io;
use thiserror::Error;

/// Everything that can go wrong while writing or reading a stream, or while
/// setting up an engine.
#[derive(Error, Debug)]
pub enum YggError {
    /// The bytes do not follow the tag/length/reference grammar, or a field
    /// mismatch went unhandled. The stream must be discarded.
    #[error("stream corrupted: {0}")]
    StreamCorrupted(String),

    /// A value's type has no identifier, no serializer and no construction path.
    #[error("not serializable: {0}")]
    NotSerializable(String),

    /// Colliding identifiers, duplicate field ids and similar programmer errors.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(io::Error),

    /// Failure raised from inside a serializer plugin or field handler.
    #[error(transparent)]
    Plugin(#[from] anyhow::Error),
}

impl YggError {
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::StreamCorrupted(msg.into())
    }
    pub fn not_serializable(msg: impl Into<String>) -> Self {
        Self::NotSerializable(msg.into())
    }
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_corrupted(&self) -> bool {
        matches!(self, Self::StreamCorrupted(_))
    }
    pub fn is_not_serializable(&self) -> bool {
        matches!(self, Self::NotSerializable(_))
    }
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/* A stream that ends in the middle of a value is a malformed stream, not an I/O failure. */
impl From<io::Error> for YggError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::StreamCorrupted(format!("premature end of stream: {e}"))
        } else {
            Self::Io(e)
        }
    }
}

pub type Result<T, E = YggError> = std::result::Result<T, E>;
