//! Matrix implementation on a Unicorn HAT: an 8x8 grid of WS2812 pixels.

use embedded_graphics_core::pixelcolor::RgbColor;
use rs_ws281x::{ChannelBuilder, Controller, ControllerBuilder, StripType};

use crate::{
    framebuffer::{Framebuffer, HEIGHT, WIDTH},
    Matrix,
};

/// Matrix implementation for real hardware.
pub struct UnicornHat {
    strip: Controller,
    canvas: Framebuffer,
}

impl UnicornHat {
    /// Half brightness: the grid is painfully bright at full.
    const BRIGHTNESS: u8 = 128;

    /// Create a new handler for the hardware grid.
    pub fn new() -> Result<Self, String> {
        let strip = ControllerBuilder::new()
            .freq(800_000)
            .dma(10)
            .channel(
                0,
                ChannelBuilder::new()
                    .pin(18) // PWM0
                    .count((WIDTH * HEIGHT) as i32)
                    .strip_type(StripType::Ws2812)
                    .brightness(Self::BRIGHTNESS)
                    .build(),
            )
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self {
            strip,
            canvas: Framebuffer::default(),
        })
    }

    /// Index along the strip of the pixel at (x, y).
    /// The strip snakes across the rows, starting from the top right.
    fn index(x: usize, y: usize) -> usize {
        if y % 2 == 0 {
            y * WIDTH + (WIDTH - 1 - x)
        } else {
            y * WIDTH + x
        }
    }
}

impl Matrix for UnicornHat {
    fn canvas(&mut self) -> &mut Framebuffer {
        &mut self.canvas
    }

    fn flush(&mut self) -> Result<(), String> {
        let leds = self.strip.leds_mut(0);
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let led = leds.get_mut(Self::index(x, y));
                if let (Some(c), Some(led)) = (self.canvas.get(x, y), led) {
                    // Raw colors are little-endian 0xWWRRGGBB.
                    *led = [c.b(), c.g(), c.r(), 0];
                }
            }
        }
        self.strip.render().map_err(|e| e.to_string())
    }
}

impl Drop for UnicornHat {
    fn drop(&mut self) {
        self.clear();
        let _ = self.flush();
    }
}
