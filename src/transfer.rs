//! File-level encode and decode.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread;

use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::container::{read_container, write_container, ContainerReport, HEADER_LEN};
use crate::error::{CnkError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Encode,
    Decode,
}

impl FromStr for Mode {
    type Err = CnkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "compress" => Ok(Mode::Encode),
            "d" | "decompress" => Ok(Mode::Decode),
            _ => Err(CnkError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Encode => f.write_str("compress"),
            Mode::Decode => f.write_str("decompress"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub mode: Mode,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub container: ContainerReport,
}

/// One unit of work for [`transfer_many`].
#[derive(Debug, Clone)]
pub struct Job {
    pub mode: Mode,
    pub source: PathBuf,
    pub destination: PathBuf,
}

pub fn compress_file(src: &Path, dst: &Path, config: &Config) -> Result<TransferReport> {
    transfer(Mode::Encode, src, dst, config)
}

pub fn decompress_file(src: &Path, dst: &Path, config: &Config) -> Result<TransferReport> {
    transfer(Mode::Decode, src, dst, config)
}

/// Run one complete file transfer.
///
/// Both files are closed before this returns, whether or not the transfer
/// succeeded. A failed transfer removes the destination unless
/// `config.keep_partial` is set, and only if this call created it.
/// Writing a file onto itself is refused before anything is opened for
/// writing.
pub fn transfer(mode: Mode, src: &Path, dst: &Path, config: &Config) -> Result<TransferReport> {
    let span = info_span!("transfer", %mode, src = %src.display(), dst = %dst.display());
    let _guard = span.enter();
    config.validate()?;

    let mut input = File::open(src).map_err(|source| CnkError::IoOpen {
        path: src.to_path_buf(),
        source,
    })?;
    if same_file(src, dst)? {
        return Err(CnkError::Config(format!(
            "source and destination are the same file: '{}'",
            src.display()
        )));
    }
    let (mut output, created) = open_destination(dst)?;

    let result = match mode {
        Mode::Encode => encode_open(&mut input, &mut output, config),
        Mode::Decode => read_container(&mut input, &mut output, config),
    }
    .and_then(|report| {
        output.sync_all()?;
        Ok(report)
    });
    drop(output);
    drop(input);

    match result {
        Ok(container) => {
            info!(
                total_in = container.transfer.total_in,
                total_out = container.transfer.total_out,
                "transfer complete"
            );
            Ok(TransferReport {
                mode,
                source: src.to_path_buf(),
                destination: dst.to_path_buf(),
                container,
            })
        }
        Err(e) => {
            if created && !config.keep_partial {
                if let Err(rm) = fs::remove_file(dst) {
                    warn!(error = %rm, "could not remove partial output");
                }
            }
            Err(e)
        }
    }
}

/// Open `dst` for writing, reporting whether it was created by this call.
fn open_destination(dst: &Path) -> Result<(File, bool)> {
    let open_err = |source: std::io::Error| CnkError::IoOpen {
        path: dst.to_path_buf(),
        source,
    };
    match OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(dst)
    {
        Ok(file) => Ok((file, true)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .truncate(true)
                .open(dst)
                .map_err(open_err)?;
            Ok((file, false))
        }
        Err(e) => Err(open_err(e)),
    }
}

/// Whether `src` and `dst` name the same file. `src` must exist; `dst`
/// may not exist yet, in which case its parent is resolved instead.
fn same_file(src: &Path, dst: &Path) -> Result<bool> {
    let src = fs::canonicalize(src).map_err(|source| CnkError::IoOpen {
        path: src.to_path_buf(),
        source,
    })?;
    let dst = match fs::canonicalize(dst) {
        Ok(p) => p,
        Err(_) => {
            let parent = match dst.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            match (fs::canonicalize(parent), dst.file_name()) {
                (Ok(dir), Some(name)) => dir.join(name),
                _ => return Ok(false),
            }
        }
    };
    Ok(src == dst)
}

fn encode_open(input: &mut File, output: &mut File, config: &Config) -> Result<ContainerReport> {
    let source_len = input.metadata()?.len();
    if source_len < HEADER_LEN {
        return Err(CnkError::TruncatedInput {
            expected: HEADER_LEN,
            actual: source_len,
        });
    }
    let payload_len = source_len - HEADER_LEN;
    info!(payload_len, "input file size");
    write_container(input, output, payload_len, config)
}

/// Run independent transfers on worker threads.
///
/// Every job gets its own buffers and codec. Results come back in the
/// order the jobs were given.
pub fn transfer_many(jobs: &[Job], config: &Config) -> Vec<Result<TransferReport>> {
    thread::scope(|s| {
        let handles: Vec<_> = jobs
            .iter()
            .map(|job| s.spawn(move || transfer(job.mode, &job.source, &job.destination, config)))
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    Err(CnkError::Io(std::io::Error::new(
                        ErrorKind::Other,
                        "transfer worker panicked",
                    )))
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing_is_case_insensitive() {
        assert_eq!("c".parse::<Mode>().unwrap(), Mode::Encode);
        assert_eq!("C".parse::<Mode>().unwrap(), Mode::Encode);
        assert_eq!("d".parse::<Mode>().unwrap(), Mode::Decode);
        assert_eq!("D".parse::<Mode>().unwrap(), Mode::Decode);
        assert_eq!("Decompress".parse::<Mode>().unwrap(), Mode::Decode);
        assert!(matches!("x".parse::<Mode>(), Err(CnkError::InvalidMode(_))));
        assert!("".parse::<Mode>().is_err());
    }
}
