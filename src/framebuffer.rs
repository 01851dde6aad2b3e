//! An in-memory pixel grid the size of the display.

use std::convert::Infallible;

use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::{Rgb888, RgbColor},
    Pixel,
};

use crate::Matrix;

/// Width of the display, in pixels.
pub const WIDTH: usize = 8;
/// Height of the display, in pixels.
pub const HEIGHT: usize = 8;

/// An 8x8 RGB pixel grid. Out-of-bounds writes are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    rows: [[Rgb888; WIDTH]; HEIGHT],
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer {
            rows: [[Rgb888::BLACK; WIDTH]; HEIGHT],
        }
    }
}

impl Framebuffer {
    /// Color at (x, y); `None` if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb888> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Points that are not black.
    pub fn lit(&self) -> impl Iterator<Item = (Point, Rgb888)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, c)| **c != Rgb888::BLACK)
                .map(move |(x, c)| (Point::new(x as i32, y as i32), *c))
        })
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
                continue;
            };
            if let Some(px) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
                *px = color;
            }
        }
        Ok(())
    }
}

/// Matrix that keeps its output in memory.
///
/// `shown` holds what the last flush put on the "display".
#[derive(Default, Debug)]
pub struct MemoryMatrix {
    canvas: Framebuffer,
    pub shown: Framebuffer,
    pub flushes: usize,
}

impl Matrix for MemoryMatrix {
    fn canvas(&mut self) -> &mut Framebuffer {
        &mut self.canvas
    }

    fn flush(&mut self) -> Result<(), String> {
        self.shown = self.canvas;
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipping() {
        let mut fb = Framebuffer::default();
        let red = Rgb888::new(255, 0, 0);
        fb.draw_iter([
            Pixel(Point::new(-1, 0), red),
            Pixel(Point::new(8, 0), red),
            Pixel(Point::new(0, 8), red),
            Pixel(Point::new(7, 7), red),
        ])
        .unwrap();
        assert_eq!(fb.lit().collect::<Vec<_>>(), vec![(Point::new(7, 7), red)]);
        assert_eq!(fb.get(7, 7), Some(red));
        assert_eq!(fb.get(8, 7), None);
    }

    #[test]
    fn test_flush_copies_canvas() {
        let mut m = MemoryMatrix::default();
        m.set(1, 2, Rgb888::GREEN);
        assert_eq!(m.shown.lit().count(), 0);
        m.flush().unwrap();
        assert_eq!(m.shown.get(1, 2), Some(Rgb888::GREEN));
        m.clear();
        assert_eq!(m.shown.get(1, 2), Some(Rgb888::GREEN));
        m.flush().unwrap();
        assert_eq!(m.shown.lit().count(), 0);
        assert_eq!(m.flushes, 2);
    }
}
