//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for diagnostic lines (stderr) with colored prefixes
//! - `info!` macro for informational lines (stdout)
//! - `debug!` macro for lines only shown with `--verbose`
//!
//! # Example
//!
//! ```ignore
//! log!("convert"; "running for {}", path.display());
//! info!("pool"; "number of active threads: {}", n);
//! debug!("ledger"; "appended \"{}\"", identity);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream, Style};
use std::{
    io::{IsTerminal, Write, stderr, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Apply the `--color` choice to every colored prefix.
pub fn set_color_choice(choice: clap::ColorChoice) {
    match choice {
        clap::ColorChoice::Always => owo_colors::set_override(true),
        clap::ColorChoice::Never => owo_colors::set_override(false),
        clap::ColorChoice::Auto => owo_colors::unset_override(), // per-stream TTY detection
    }
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a diagnostic message with a colored module prefix (stderr)
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log an informational message with a colored module prefix (stdout)
#[macro_export]
macro_rules! info {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::info($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Write one diagnostic line to stderr.
///
/// The stderr lock is held for the whole line so lines coming from
/// different workers never interleave.
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase(), Stream::Stderr);
    let is_tty = stderr().is_terminal();

    let mut stderr = stderr().lock();
    if is_tty {
        execute!(stderr, Clear(ClearType::UntilNewLine)).ok();
    }
    writeln!(stderr, "{prefix} {message}").ok();
    stderr.flush().ok();
}

/// Write one informational line to stdout.
#[inline]
pub fn info(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase(), Stream::Stdout);

    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
///
/// Colors only when `stream` supports them (or `--color always`).
#[inline]
fn colorize_prefix(module: &str, module_lower: &str, stream: Stream) -> String {
    let style = match module_lower {
        "error" => Style::new().bright_red(),
        "warning" => Style::new().bright_magenta(),
        "pool" | "input" => Style::new().bright_blue(),
        "ledger" | "cache" => Style::new().bright_green(),
        _ => Style::new().bright_yellow(),
    }
    .bold();
    let prefix = format!("[{module}]");
    prefix.if_supports_color(stream, |p| p.style(style)).to_string()
}

// ============================================================================
// Tests
// ============================================================================
