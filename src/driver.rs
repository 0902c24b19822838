//! Input driver: read request lines and feed the pool, or run each one
//! right away.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::convert::{Conversion, Converter};
use crate::core::is_shutdown;
use crate::pool::WorkerPool;
use crate::request;
use crate::{debug, log};

/// Where request lines come from.
pub enum InputSource {
    Stdin,
    File(BufReader<File>),
}

impl InputSource {
    /// Open the input argument.
    ///
    /// `None` or `-` selects stdin. A file that cannot be opened falls
    /// back to stdin with a warning.
    pub fn open(arg: Option<&Path>) -> Self {
        match arg {
            Some(path) if path != Path::new("-") => match File::open(path) {
                Ok(file) => {
                    log!("input"; "using {}...", path.display());
                    Self::File(BufReader::new(file))
                }
                Err(e) => {
                    log!(
                        "warning";
                        "cannot open '{}' ({}), using stdin (press CTRL-D for EOF)",
                        path.display(),
                        e
                    );
                    Self::Stdin
                }
            },
            _ => {
                log!("input"; "using stdin (press CTRL-D for EOF)");
                Self::Stdin
            }
        }
    }

    #[cfg(test)]
    pub fn is_stdin(&self) -> bool {
        matches!(self, Self::Stdin)
    }

    /// Feed every line to `pool`; see [`feed`].
    pub fn feed(self, pool: &WorkerPool) -> usize {
        match self {
            Self::Stdin => feed(io::stdin().lock(), pool),
            Self::File(reader) => feed(reader, pool),
        }
    }

    /// Convert every line on this thread; see [`run_each`].
    pub fn run_each(self, converter: &dyn Converter) -> usize {
        match self {
            Self::Stdin => run_each(io::stdin().lock(), converter),
            Self::File(reader) => run_each(reader, converter),
        }
    }
}

/// Hand each non-empty line of `reader` to the pool until end of input.
///
/// Stops early on a read error or a shutdown request. Returns the
/// number of lines read.
pub fn feed(reader: impl BufRead, pool: &WorkerPool) -> usize {
    for_each_line(reader, |line| {
        pool.enqueue_line(line);
    })
}

/// Convert each non-empty line of `reader` as soon as it is read.
///
/// Returns the number of successful conversions.
pub fn run_each(reader: impl BufRead, converter: &dyn Converter) -> usize {
    let mut converted = 0;
    for_each_line(reader, |line| {
        if run_line(converter, line) {
            converted += 1;
        }
    });
    converted
}

/// Parse one request and convert it on the calling thread.
///
/// Nothing is queued and the ledger is not consulted. Returns true if
/// the conversion succeeded.
pub fn run_line(converter: &dyn Converter, line: &str) -> bool {
    let Ok(request) = request::parse(line) else {
        return false;
    };

    log!("convert"; "running for {}...", request.source_path.display());
    match converter.convert(&request) {
        Ok(Conversion::Rendered { bytes } | Conversion::Cached { bytes }) => {
            log!("convert"; "done for {} ({} bytes)", request.source_path.display(), bytes);
            true
        }
        Err(e) => {
            log!(
                "error";
                "failed processing {}: {:#}",
                request.source_path.display(),
                anyhow::Error::new(e)
            );
            false
        }
    }
}

/// Call `f` with each non-empty line, without its `\r`, until end of
/// input, a read error or a shutdown request.
fn for_each_line(reader: impl BufRead, mut f: impl FnMut(&str)) -> usize {
    let mut count = 0;
    for line in reader.lines() {
        if is_shutdown() {
            debug!("input"; "shutdown requested, no more input");
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log!("error"; "failed to read input: {}", e);
                break;
            }
        };
        count += 1;

        let line = line.strip_suffix('\r').unwrap_or(&line);
        if !line.is_empty() {
            f(line);
        }
    }
    count
}
