//! CNK chunk container compression.
//!
//! A CNK file is an 8-byte pass-through header followed by a size record,
//! a deflate payload and a byte-swapped size trailer. See [`container`] for
//! the exact layout and [`stream`] for the bounded-buffer pump that moves
//! payload bytes through the codec.

pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod io_utils;
pub mod stream;
pub mod transfer;

pub use codec::{Codec, CodecParams, DeflateCodec, Direction, Feed, StreamStatus};
pub use config::Config;
pub use container::{
    read_container, write_container, CompressionRecord, ContainerHeader, ContainerReport,
};
pub use error::{CnkError, Result};
pub use stream::{StreamEngine, Transfer};
pub use transfer::{
    compress_file, decompress_file, transfer, transfer_many, Job, Mode, TransferReport,
};
