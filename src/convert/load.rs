//! Source loading: read the SVG file and parse it with usvg.

use std::fs;
use std::path::Path;

use super::ConvertError;

/// Unit hint for the parser: user units are CSS pixels at 96 DPI.
const PX_DPI: f32 = 96.0;

/// Read the raw source bytes.
pub fn read_source(path: &Path) -> Result<Vec<u8>, ConvertError> {
    fs::read(path).map_err(|e| ConvertError::Read(path.to_path_buf(), e))
}

/// Parse SVG bytes into a render tree.
///
/// `path` is only used for error reporting.
pub fn parse_svg(data: &[u8], path: &Path) -> Result<usvg::Tree, ConvertError> {
    let options = usvg::Options {
        dpi: PX_DPI,
        ..Default::default()
    };
    usvg::Tree::from_data(data, &options).map_err(|e| ConvertError::Parse(path.to_path_buf(), e))
}
