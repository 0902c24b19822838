//! Conversion request parsing.
//!
//! One input line describes one request:
//!
//! ```text
//! source_path;dest_path;target_size
//! ```
//!
//! Fields beyond the third are ignored.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::log;

/// Field separator of an input line.
pub const SEPARATOR: char = ';';

/// One validated unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// SVG file to read.
    pub source_path: PathBuf,
    /// Where the PNG is written.
    pub dest_path: PathBuf,
    /// Edge length in pixels of the square output.
    pub target_size: u32,
}

impl ConversionRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        dest_path: impl Into<PathBuf>,
        target_size: u32,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            dest_path: dest_path.into(),
            target_size,
        }
    }

    /// Ledger key of this request: source base name without extension.
    pub fn identity(&self) -> String {
        source_identity(&self.source_path)
    }
}

impl fmt::Display for ConversionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}px)",
            self.source_path.display(),
            self.dest_path.display(),
            self.target_size
        )
    }
}

/// Reduce a source path to its base name without extension.
///
/// `assets/icons/home.svg` → `home`. Falls back to the full path text
/// when there is no file stem (e.g. `..`).
pub fn source_identity(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Why a line was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 3 `;`-separated fields, found {found}")]
    MissingFields { found: usize },

    #[error("target size `{0}` is not a number")]
    InvalidSize(String),

    #[error("target size must be positive")]
    ZeroSize,
}

/// Parse one input line into a request.
///
/// Rejections are reported on the diagnostic stream together with the
/// original line and its length.
pub fn parse(line: &str) -> Result<ConversionRequest, ParseError> {
    parse_fields(line).inspect_err(|err| {
        log!("error"; "wrong line format: {} (size: {}): {}", line, line.len(), err);
    })
}

fn parse_fields(line: &str) -> Result<ConversionRequest, ParseError> {
    let fields: Vec<&str> = line.split(SEPARATOR).collect();
    let [source, dest, size, ..] = fields.as_slice() else {
        return Err(ParseError::MissingFields {
            found: fields.len(),
        });
    };

    let size = size.trim();
    let target_size: u32 = size
        .parse()
        .map_err(|_| ParseError::InvalidSize(size.to_string()))?;
    if target_size == 0 {
        return Err(ParseError::ZeroSize);
    }

    Ok(ConversionRequest::new(*source, *dest, target_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_fields() {
        let req = parse("icon.svg;out/icon.png;96").unwrap();
        assert_eq!(req.source_path, PathBuf::from("icon.svg"));
        assert_eq!(req.dest_path, PathBuf::from("out/icon.png"));
        assert_eq!(req.target_size, 96);
    }

    #[test]
    fn test_parse_ignores_trailing_fields() {
        let req = parse("a/b.svg;c/d.png;32;extra;more").unwrap();
        assert_eq!(req, ConversionRequest::new("a/b.svg", "c/d.png", 32));
    }

    #[test]
    fn test_parse_keeps_fields_verbatim() {
        // Only the size is trimmed, paths are taken as-is
        let req = parse(" spaced name.svg; out dir/x.png ; 64 ").unwrap();
        assert_eq!(req.source_path, PathBuf::from(" spaced name.svg"));
        assert_eq!(req.dest_path, PathBuf::from(" out dir/x.png "));
        assert_eq!(req.target_size, 64);
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert_eq!(
            parse("onlyonefield"),
            Err(ParseError::MissingFields { found: 1 })
        );
        assert_eq!(parse("a.svg;b.png"), Err(ParseError::MissingFields { found: 2 }));
    }

    #[test]
    fn test_parse_rejects_non_numeric_size() {
        assert_eq!(
            parse("a.svg;b.png;big"),
            Err(ParseError::InvalidSize("big".into()))
        );
        assert_eq!(
            parse("a.svg;b.png;-4"),
            Err(ParseError::InvalidSize("-4".into()))
        );
    }

    #[test]
    fn test_parse_rejects_zero_size() {
        assert_eq!(parse("a.svg;b.png;0"), Err(ParseError::ZeroSize));
    }

    #[test]
    fn test_source_identity() {
        assert_eq!(source_identity(Path::new("assets/icons/home.svg")), "home");
        assert_eq!(source_identity(Path::new("icon")), "icon");
        assert_eq!(source_identity(Path::new("archive.tar.svg")), "archive.tar");
    }
}
