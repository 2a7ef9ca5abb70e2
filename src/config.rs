use crate::error::{CnkError, Result};

/// Default staging buffer size for each direction (1 MiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;
/// Largest staging buffer size accepted for each direction (1 GiB).
pub const MAX_BUFFER_CAPACITY: usize = 1024 * 1024 * 1024;
/// Default deflate level.
pub const DEFAULT_LEVEL: u32 = 6;

/// Runtime configuration for a single transfer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity of the input and output staging buffers in bytes.
    pub buffer_capacity: usize,
    /// Compression level passed to the codec (0..=9).
    pub level: u32,
    /// Check the trailer and decoded length against the leading size field.
    pub verify_sizes: bool,
    /// Leave a partially written destination behind when a transfer fails.
    pub keep_partial: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            level: DEFAULT_LEVEL,
            verify_sizes: true,
            keep_partial: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        check_capacity(self.buffer_capacity)
    }
}

/// Staging buffers must be non-empty and no larger than
/// [`MAX_BUFFER_CAPACITY`].
pub fn check_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(CnkError::Config("buffer capacity must be non-zero".into()));
    }
    if capacity > MAX_BUFFER_CAPACITY {
        return Err(CnkError::Config(format!(
            "buffer capacity {capacity} exceeds the {MAX_BUFFER_CAPACITY} byte limit"
        )));
    }
    Ok(())
}
