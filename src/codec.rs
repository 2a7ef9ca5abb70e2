//! Block codec state machines driven by the streaming engine.
//!
//! A [`Codec`] is fed slices of input and a slice of free output space and
//! reports how much of each it used. The engine never looks inside the
//! compressed representation; everything it needs is in [`Feed`].

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use tracing::trace;

use crate::error::{CnkError, Result};

/// Which way bytes flow through the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Direction {
    Encode,
    Decode,
}

/// Parameters handed to the codec at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecParams {
    /// Compression level, 0 (store) to 9 (best).
    pub level: u32,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            level: crate::config::DEFAULT_LEVEL,
        }
    }
}

/// Non-error outcome of a single feed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Continue,
    StreamEnd,
}

/// Result of one [`Codec::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feed {
    pub consumed: usize,
    pub produced: usize,
    pub status: StreamStatus,
}

pub trait Codec {
    /// Push `input` through the codec, writing into `output`.
    ///
    /// `end_of_input` tells the codec no bytes will follow the ones it has
    /// been given so far, so it must flush its final block.
    fn feed(&mut self, input: &[u8], output: &mut [u8], end_of_input: bool) -> Result<Feed>;

    /// Release codec state after a completed stream.
    ///
    /// Abort paths release state through `Drop` instead.
    fn finish(&mut self) -> Result<()>;
}

enum Engine {
    Encoder(Compress),
    Decoder(Decompress),
}

/// zlib-framed deflate codec backed by `flate2`.
pub struct DeflateCodec {
    engine: Engine,
    ended: bool,
    finished: bool,
}

impl DeflateCodec {
    /// Create a codec for `direction`.
    ///
    /// # Errors
    /// Returns [`CnkError::CodecInit`] if `params.level` is outside `0..=9`.
    pub fn new(direction: Direction, params: CodecParams) -> Result<Self> {
        let engine = match direction {
            Direction::Encode => {
                if params.level > 9 {
                    return Err(CnkError::CodecInit(format!(
                        "compression level {} out of range 0..=9",
                        params.level
                    )));
                }
                Engine::Encoder(Compress::new(Compression::new(params.level), true))
            }
            Direction::Decode => Engine::Decoder(Decompress::new(true)),
        };
        Ok(Self {
            engine,
            ended: false,
            finished: false,
        })
    }
}

impl Codec for DeflateCodec {
    fn feed(&mut self, input: &[u8], output: &mut [u8], end_of_input: bool) -> Result<Feed> {
        let (consumed, produced, status) = match &mut self.engine {
            Engine::Encoder(c) => {
                let (in0, out0) = (c.total_in(), c.total_out());
                let flush = if end_of_input {
                    FlushCompress::Finish
                } else {
                    FlushCompress::None
                };
                let status = c.compress(input, output, flush).map_err(|e| CnkError::Codec {
                    code: CnkError::STREAM_ERROR,
                    msg: e.to_string(),
                })?;
                (c.total_in() - in0, c.total_out() - out0, status)
            }
            Engine::Decoder(d) => {
                let (in0, out0) = (d.total_in(), d.total_out());
                let status = d
                    .decompress(input, output, FlushDecompress::Sync)
                    .map_err(|e| CnkError::Codec {
                        code: CnkError::DATA_ERROR,
                        msg: e.to_string(),
                    })?;
                (d.total_in() - in0, d.total_out() - out0, status)
            }
        };
        let (consumed, produced) = (consumed as usize, produced as usize);

        let status = match status {
            Status::StreamEnd => {
                self.ended = true;
                StreamStatus::StreamEnd
            }
            Status::Ok | Status::BufError if consumed > 0 || produced > 0 => StreamStatus::Continue,
            Status::Ok | Status::BufError => {
                return Err(CnkError::Codec {
                    code: CnkError::BUF_ERROR,
                    msg: if end_of_input {
                        "no progress possible, compressed stream ends early".into()
                    } else {
                        "no progress possible".into()
                    },
                });
            }
        };
        trace!(consumed, produced, ?status, "codec feed");
        Ok(Feed {
            consumed,
            produced,
            status,
        })
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Err(CnkError::Codec {
                code: CnkError::STREAM_ERROR,
                msg: "codec finished twice".into(),
            });
        }
        self.finished = true;
        if !self.ended {
            return Err(CnkError::Codec {
                code: CnkError::STREAM_ERROR,
                msg: "stream finished before end of stream".into(),
            });
        }
        Ok(())
    }
}
