//! Reduce a captured map frame to a single intensity.

use image::{ImageFormat, RgbaImage};

use crate::palette::{classify, Intensity};

/// Half the side of the sampling window, in pixels.
///
/// At zoom 14, 60 pixels is about 500m on the ground.
pub const WINDOW_HALF_WIDTH: u32 = 2 * 60;

/// Decode a PNG screenshot into an RGBA pixel grid.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, image::ImageError> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
}

/// Center pixel of an image: for even sizes, the upper-left of the middle four.
fn center(image: &RgbaImage) -> (i64, i64) {
    let (w, h) = image.dimensions();
    (w.div_ceil(2) as i64 - 1, h.div_ceil(2) as i64 - 1)
}

/// Highest intensity in the square window `[c - half_width, c + half_width)`
/// around the image center, on both axes.
///
/// Parts of the window that fall outside the image are skipped.
/// An empty window is [Intensity::Missing].
pub fn sample_max(image: &RgbaImage, half_width: u32) -> Intensity {
    let (cx, cy) = center(image);
    let half = half_width as i64;
    let (w, h) = image.dimensions();
    let xs = (cx - half).max(0)..(cx + half).min(w as i64);
    let ys = (cy - half).max(0)..(cy + half).min(h as i64);

    let mut max = Intensity::Missing;
    for y in ys {
        for x in xs.clone() {
            let intensity = classify(image.get_pixel(x as u32, y as u32).0);
            if intensity > max {
                max = intensity;
                if max == Intensity::MAX {
                    return max;
                }
            }
        }
    }
    max
}
