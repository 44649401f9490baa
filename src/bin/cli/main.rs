//! CLI tool recreating a ZIM archive.

mod exit_codes;
mod progress;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use std::time::Instant;
use zimrecreate::progress::{format_bytes_iec, format_duration};
use zimrecreate::{Archive, Compression, RecreateOptions, Recreator};

use exit_codes::ExitCode;
use progress::CliProgress;

/// Recreate a ZIM archive from an existing one
#[derive(Parser)]
#[command(name = "zimrecreate")]
#[command(version, about = "Recreate a ZIM archive from an existing one", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Print help
    #[arg(short = 'h', long, short_alias = 'H', action = ArgAction::Help)]
    help: Option<bool>,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Compress clusters with zstd instead of xz
    #[arg(short = 'z', long)]
    zstd: bool,

    /// Suppress progress output
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Archive to read
    #[arg(value_name = "ORIGIN_FILE")]
    origin: PathBuf,

    /// Archive to create
    #[arg(value_name = "OUTPUT_FILE")]
    output: PathBuf,
}

fn parse() -> Result<Cli, ExitCode> {
    Cli::try_parse().map_err(|err| {
        // help and version print to stdout and are not failures
        let _ = err.print();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
            _ => ExitCode::BadArgs,
        }
    })
}

/// Returns `true` if both paths resolve to the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn run(cli: &Cli) -> ExitCode {
    // the output is truncated before the source is fully read
    if same_file(&cli.origin, &cli.output) {
        eprintln!(
            "Error: {} is both ORIGIN_FILE and OUTPUT_FILE",
            cli.origin.display()
        );
        return ExitCode::BadArgs;
    }

    let source = match Archive::open_path(&cli.origin) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", cli.origin.display(), e);
            return exit_codes::error_to_exit_code(&e);
        }
    };

    let compression = if cli.zstd {
        Compression::Zstd
    } else {
        Compression::Lzma
    };
    let options = RecreateOptions::new().compression(compression);
    let mut progress = CliProgress::new(u64::from(source.entry_count()), cli.quiet);
    let start = Instant::now();

    let mut recreator = Recreator::new(source, &options);
    match recreator.run(&cli.output, &mut progress) {
        Ok(result) => {
            progress.finish_with_message("Done");
            if !cli.quiet {
                let summary = &result.summary;
                println!(
                    "Recreated {} entries ({} redirects, {} dropped) in {}",
                    result.entries_submitted,
                    summary.redirects_written,
                    summary.redirects_dropped,
                    format_duration(start.elapsed())
                );
                println!(
                    "Wrote {} in {} clusters ({} of content, ratio {:.2})",
                    format_bytes_iec(summary.file_size),
                    summary.clusters_written,
                    format_bytes_iec(summary.total_size),
                    summary.compression_ratio()
                );
            }
            ExitCode::Success
        }
        Err(e) => {
            progress.abandon();
            eprintln!(
                "Error: recreation failed (state: {}): {}",
                recreator.state(),
                e
            );
            exit_codes::error_to_exit_code(&e)
        }
    }
}

fn main() {
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted");
        std::process::exit(exit_codes::USER_INTERRUPT);
    })
    .ok();

    let exit_code = match parse() {
        Ok(cli) => run(&cli),
        Err(code) => code,
    };

    std::process::exit(exit_code.code());
}
