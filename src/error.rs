use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CnkError {
    /// Source or destination could not be opened.
    #[error("failed to open '{}': {source}", path.display())]
    IoOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reader ran dry before the declared number of bytes arrived.
    #[error("truncated input: expected {expected} bytes, got {actual}")]
    TruncatedInput { expected: u64, actual: u64 },

    /// The writer accepted fewer bytes than it was handed.
    #[error("short write: expected to write {expected} bytes, wrote {written}")]
    ShortWrite { expected: u64, written: u64 },

    /// Codec parameters were rejected for the chosen direction.
    #[error("codec init failed: {0}")]
    CodecInit(String),

    /// The codec reported a status other than continue or stream end.
    #[error("codec failed with status {code}: {msg}")]
    Codec { code: i32, msg: String },

    /// Unknown transfer mode.
    #[error("invalid mode '{0}'")]
    InvalidMode(String),

    /// A size does not fit the container's 32-bit fields.
    #[error("size {0} does not fit in a 32-bit container field")]
    SizeOverflow(u64),

    /// Stored and observed sizes disagree.
    #[error("{field} mismatch: container says {expected}, found {actual}")]
    SizeMismatch {
        field: &'static str,
        expected: u64,
        actual: u64,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CnkError {
    /// zlib-style code for a codec that cannot make progress.
    pub const BUF_ERROR: i32 = -5;
    /// zlib-style code for an inconsistent compressor state.
    pub const STREAM_ERROR: i32 = -2;
    /// zlib-style code for a corrupt compressed stream.
    pub const DATA_ERROR: i32 = -3;
}

pub type Result<T> = std::result::Result<T, CnkError>;
