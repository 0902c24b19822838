//! Rasterization with resvg onto a fixed-size RGBA canvas.

use resvg::tiny_skia::{Pixmap, Transform};

use super::ConvertError;

/// Bytes per pixel of every raster (RGBA8).
pub const CHANNELS: usize = 4;

/// Straight-alpha RGBA8 pixels, row-major.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Bytes per row.
    pub stride: usize,
    pub pixels: Vec<u8>,
}

/// Render `tree` onto a `width × height` canvas.
///
/// The tree is scaled by `scale` and shifted by (`x_offset`, `y_offset`)
/// pixels. Anything falling outside the canvas is clipped.
pub fn rasterize(
    tree: &usvg::Tree,
    x_offset: f32,
    y_offset: f32,
    scale: f32,
    width: u32,
    height: u32,
) -> Result<RasterImage, ConvertError> {
    let mut pixmap = Pixmap::new(width, height).ok_or(ConvertError::Raster { width, height })?;

    let transform = Transform::from_row(scale, 0.0, 0.0, scale, x_offset, y_offset);
    resvg::render(tree, transform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied colors; encoders expect straight alpha
    let mut pixels = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    Ok(RasterImage {
        width,
        height,
        stride: width as usize * CHANNELS,
        pixels,
    })
}
