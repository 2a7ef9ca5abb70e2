//! Turning library errors into messages for the `cnkdec` command line.

use std::fmt;
use std::io;
use std::path::Path;

use crate::CnkError;

/// Error reported by the binary: a one-line message with a hint, plus the
/// library error it came from.
#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Describe an I/O failure on `path` and suggest what to check.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    use io::ErrorKind::*;
    let suggestion = match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        UnexpectedEof => "File appears truncated or corrupted.",
        WriteZero => "Disk may be full. Free up space and try again.",
        Other if err.raw_os_error() == Some(28) => "Disk may be full. Free up space and try again.",
        _ => "Check permissions or free up disk space.",
    };
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        suggestion
    )
}

/// CLI error with no underlying cause.
pub fn simple_cli_error(msg: &str) -> CliError {
    CliError {
        msg: msg.to_string(),
        source: None,
    }
}

/// Convert a library error into a CLI error with a hint.
pub fn cnk_cli_error(context: &str, err: CnkError) -> CliError {
    CliError {
        msg: format!("{}: {}", context, cli_hint(&err)),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for a library error variant.
pub fn cli_hint(err: &CnkError) -> String {
    use CnkError::*;
    match err {
        IoOpen { path, source } => format_io_error("opening", path, source),
        TruncatedInput { expected, actual } => format!(
            "input ended after {actual} of {expected} bytes. File appears truncated or corrupted."
        ),
        ShortWrite { expected, written } => format!(
            "only {written} of {expected} bytes written. Disk may be full. Free up space and try again."
        ),
        CodecInit(msg) => format!("{msg}. Check the compression level."),
        Codec { code, msg } => {
            format!("codec status {code}: {msg}. Verify the file is an intact compressed CNK.")
        }
        InvalidMode(m) => format!("invalid mode '{m}'. Use c to compress or d to decompress."),
        SizeOverflow(n) => format!("{n} bytes does not fit a CNK size field (4 GiB limit)."),
        SizeMismatch { .. } => format!("{err}. Verify the file is intact."),
        Config(msg) => format!("{msg}. Invalid configuration."),
        Io(io) => format!("{io}"),
    }
}
