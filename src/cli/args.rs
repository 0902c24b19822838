//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

use crate::log;

/// Worker count used when none (or an invalid one) is given.
pub const DEFAULT_WORKERS: usize = 1;

/// Batch-convert SVG files to square PNG images.
///
/// Reads one request per line, `source.svg;dest.png;size`, from INPUT
/// or stdin.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, allow_negative_numbers = true)]
pub struct Cli {
    /// Number of worker threads (invalid values fall back to 1)
    #[arg(value_name = "WORKERS")]
    pub workers: Option<String>,

    /// Request file, or `-` for stdin
    #[arg(value_name = "INPUT", value_hint = clap::ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Config file path (optional)
    #[arg(short = 'C', long, default_value = "svgbatch.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Directory holding the dedup ledger
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub scope_dir: Option<PathBuf>,

    /// Assumed native width of every source SVG, in user units
    #[arg(short, long)]
    pub reference_width: Option<f32>,

    /// Reuse encoded output for identical sources within this run
    #[arg(short, long)]
    pub memory_cache: bool,

    /// How long an idle worker waits before re-checking for shutdown
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Convert each line as it is read, without the pool or the ledger
    #[arg(long)]
    pub immediate: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Worker count given on the command line, if any.
    ///
    /// Unparsable or non-positive values resolve to [`DEFAULT_WORKERS`]
    /// with a warning.
    pub fn worker_count(&self) -> Option<usize> {
        self.workers.as_deref().map(parse_worker_count)
    }
}

fn parse_worker_count(raw: &str) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => usize::try_from(n).unwrap_or(DEFAULT_WORKERS),
        _ => {
            log!("warning"; "incorrect number of threads ({}), setting to {}", raw, DEFAULT_WORKERS);
            DEFAULT_WORKERS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["svgbatch", "-v", "-m", "-s", "out"]);
        assert!(cli.verbose);
        assert!(cli.memory_cache);
        assert_eq!(cli.scope_dir, Some(PathBuf::from("out")));

        let err = Cli::try_parse_from(["svgbatch", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::parse_from(["svgbatch", "4", "requests.txt"]);
        assert_eq!(cli.worker_count(), Some(4));
        assert_eq!(cli.input, Some(PathBuf::from("requests.txt")));
    }

    #[test]
    fn test_no_arguments() {
        let cli = Cli::parse_from(["svgbatch"]);
        assert_eq!(cli.worker_count(), None);
        assert!(cli.input.is_none());
        assert!(!cli.memory_cache);
    }

    #[test]
    fn test_invalid_worker_count_defaults() {
        assert_eq!(parse_worker_count("abc"), DEFAULT_WORKERS);
        assert_eq!(parse_worker_count("0"), DEFAULT_WORKERS);
        assert_eq!(parse_worker_count("-3"), DEFAULT_WORKERS);
        assert_eq!(parse_worker_count(" 8 "), 8);
    }

    #[test]
    fn test_options() {
        let cli = Cli::parse_from([
            "svgbatch",
            "2",
            "-",
            "--scope-dir",
            "out/output",
            "--reference-width",
            "24",
            "--memory-cache",
            "--immediate",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("-")));
        assert_eq!(cli.scope_dir, Some(PathBuf::from("out/output")));
        assert_eq!(cli.reference_width, Some(24.0));
        assert!(cli.memory_cache);
        assert!(cli.immediate);
    }
}
