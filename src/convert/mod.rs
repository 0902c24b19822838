//! SVG → PNG conversion.
//!
//! ```text
//! ┌──────┐   ┌───────────┐   ┌────────┐   ┌───────┐
//! │ load │ ► │ rasterize │ ► │ encode │ ► │ write │
//! └──────┘   └───────────┘   └────────┘   └───────┘
//!     │            ▲ skipped on memory-cache hit     ▲
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`load`]: read and parse the source with usvg
//! - [`render`]: rasterize with resvg
//! - [`encode`]: PNG compression with a sink callback
//! - [`write`]: replace the destination file
//! - [`cache`]: optional in-memory cache of encoded output

pub mod cache;
pub mod encode;
pub mod load;
pub mod render;
pub mod write;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::debug;
use crate::request::ConversionRequest;
use cache::{CacheKey, MemoryCache};
use render::CHANNELS;

/// Assumed native width, in user units, of every source asset.
pub const REFERENCE_WIDTH: f32 = 48.0;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot read `{}`", .0.display())]
    Read(PathBuf, #[source] io::Error),

    #[error("cannot parse `{}`", .0.display())]
    Parse(PathBuf, #[source] usvg::Error),

    #[error("cannot allocate a {width}x{height} canvas")]
    Raster { width: u32, height: u32 },

    #[error("unsupported channel count: {0}")]
    Channels(usize),

    #[error("pixel buffer too short: need {expected} bytes, got {actual}")]
    Buffer { expected: usize, actual: usize },

    #[error("png encoding failed")]
    Encode(#[source] image::ImageError),

    #[error("encoder finished without output")]
    NoOutput,

    #[error("cannot write `{}`", .0.display())]
    Write(PathBuf, #[source] io::Error),
}

/// What a successful conversion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Rendered and encoded from scratch.
    Rendered { bytes: usize },
    /// Encoded bytes reused from the memory cache.
    Cached { bytes: usize },
}

/// Runs one request end to end.
///
/// Implementations hold no per-request state; one instance is shared by
/// every worker.
pub trait Converter: Send + Sync {
    fn convert(&self, request: &ConversionRequest) -> Result<Conversion, ConvertError>;
}

/// Production converter: usvg + resvg + PNG.
pub struct SvgConverter {
    reference_width: f32,
    cache: Option<MemoryCache>,
}

impl SvgConverter {
    pub fn new(reference_width: f32) -> Self {
        Self {
            reference_width,
            cache: None,
        }
    }

    /// Put a memory cache in front of rendering.
    pub fn with_memory_cache(mut self) -> Self {
        self.cache = Some(MemoryCache::new());
        self
    }

    #[cfg(test)]
    pub fn cache(&self) -> Option<&MemoryCache> {
        self.cache.as_ref()
    }

    /// Render and encode source bytes at the requested size.
    fn render_png(
        &self,
        source: &[u8],
        request: &ConversionRequest,
    ) -> Result<Vec<u8>, ConvertError> {
        let size = request.target_size;
        let scale = size as f32 / self.reference_width;

        let tree = load::parse_svg(source, &request.source_path)?;
        let raster = render::rasterize(&tree, 0.0, 0.0, scale, size, size)?;

        let mut png = None;
        encode::encode_png(
            raster.width,
            raster.height,
            CHANNELS,
            &raster.pixels,
            raster.stride,
            |bytes| png = Some(bytes),
        )?;
        png.ok_or(ConvertError::NoOutput)
    }
}

impl Default for SvgConverter {
    fn default() -> Self {
        Self::new(REFERENCE_WIDTH)
    }
}

impl Converter for SvgConverter {
    fn convert(&self, request: &ConversionRequest) -> Result<Conversion, ConvertError> {
        let source = load::read_source(&request.source_path)?;

        let Some(cache) = &self.cache else {
            let png = self.render_png(&source, request)?;
            write::write_output(&request.dest_path, &png)?;
            return Ok(Conversion::Rendered { bytes: png.len() });
        };

        let key = CacheKey::new(&source, request.target_size, self.reference_width);
        if let Some(png) = cache.get(&key) {
            debug!(
                "cache"; "hit {} for {}",
                key.content.to_hex(),
                request.source_path.display()
            );
            write::write_output(&request.dest_path, &png)?;
            return Ok(Conversion::Cached { bytes: png.len() });
        }

        let png = cache.insert(key, self.render_png(&source, request)?);
        write::write_output(&request.dest_path, &png)?;
        Ok(Conversion::Rendered { bytes: png.len() })
    }
}
