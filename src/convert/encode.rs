//! PNG encoding through a sink callback.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::ConvertError;

/// Compress raw pixels to PNG and hand the bytes to `sink`.
///
/// `sink` runs exactly once on success and never on failure. Rows are
/// read `stride` bytes apart, so padded buffers are accepted.
pub fn encode_png(
    width: u32,
    height: u32,
    channels: usize,
    pixels: &[u8],
    stride: usize,
    sink: impl FnOnce(Vec<u8>),
) -> Result<(), ConvertError> {
    let color = match channels {
        1 => ExtendedColorType::L8,
        2 => ExtendedColorType::La8,
        3 => ExtendedColorType::Rgb8,
        4 => ExtendedColorType::Rgba8,
        n => return Err(ConvertError::Channels(n)),
    };

    let row = width as usize * channels;
    let needed = match height as usize {
        0 => 0,
        h => stride * (h - 1) + row,
    };
    if stride < row || pixels.len() < needed {
        return Err(ConvertError::Buffer {
            expected: needed,
            actual: pixels.len(),
        });
    }

    let packed;
    let data = if stride == row {
        &pixels[..row * height as usize]
    } else {
        packed = pixels
            .chunks(stride)
            .take(height as usize)
            .flat_map(|line| &line[..row])
            .copied()
            .collect::<Vec<u8>>();
        &packed[..]
    };

    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(data, width, height, color)
        .map_err(ConvertError::Encode)?;
    sink(out);
    Ok(())
}
