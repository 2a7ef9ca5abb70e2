use std::path::PathBuf;

use clap::{ArgAction, Parser};
use cnk::io_utils::{cnk_cli_error, simple_cli_error};
use cnk::{transfer, Config, Mode};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Compress or decompress a CNK terrain chunk.
#[derive(Parser)]
#[command(name = "cnkdec", version)]
struct Args {
    /// c to compress, d to decompress (case-insensitive)
    mode: String,
    /// Input file
    input: PathBuf,
    /// Output file
    output: PathBuf,
    /// Compression level, 0-9
    #[arg(long, default_value_t = cnk::config::DEFAULT_LEVEL)]
    level: u32,
    /// Staging buffer size in bytes
    #[arg(long, default_value_t = cnk::config::DEFAULT_BUFFER_CAPACITY)]
    buffer_size: usize,
    /// Skip checking the size trailer when decompressing
    #[arg(long)]
    no_verify: bool,
    /// Keep a partially written output file on failure
    #[arg(long)]
    keep_partial: bool,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    if let Err(e) = run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mode: Mode = args
        .mode
        .parse()
        .map_err(|e| cnk_cli_error("bad arguments", e))?;
    let config = Config {
        buffer_capacity: args.buffer_size,
        level: args.level,
        verify_sizes: !args.no_verify,
        keep_partial: args.keep_partial,
    };
    info!(
        %mode,
        input = %args.input.display(),
        output = %args.output.display(),
        "CNK compressor/decompressor using deflate"
    );

    let report = transfer(mode, &args.input, &args.output, &config)
        .map_err(|e| cnk_cli_error(&format!("{mode} failed"), e))?;

    if args.json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| simple_cli_error(&format!("failed to render report: {e}")))?;
        println!("{out}");
    } else {
        println!("Total input bytes: {}", report.container.transfer.total_in);
        println!("Total output bytes: {}", report.container.transfer.total_out);
        println!("Success.");
    }
    Ok(())
}
