use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Point, Size},
    pixelcolor::Rgb888,
    Pixel,
};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, Window};

use crate::{
    framebuffer::{Framebuffer, HEIGHT, WIDTH},
    Matrix,
};

/// The grid, drawn in a desktop window.
pub struct SimMatrix {
    display: SimulatorDisplay<Rgb888>,
    window: Window,
    canvas: Framebuffer,
}

impl SimMatrix {
    pub fn new() -> Self {
        let settings = OutputSettingsBuilder::new().scale(40).pixel_spacing(4).build();
        SimMatrix {
            display: SimulatorDisplay::new(Size::new(WIDTH as u32, HEIGHT as u32)),
            window: Window::new("nowcast", &settings),
            canvas: Framebuffer::default(),
        }
    }
}

impl Default for SimMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl Matrix for SimMatrix {
    fn canvas(&mut self) -> &mut Framebuffer {
        &mut self.canvas
    }

    fn flush(&mut self) -> Result<(), String> {
        let canvas = self.canvas;
        let pixels = (0..HEIGHT).flat_map(|y| {
            (0..WIDTH).filter_map(move |x| {
                canvas
                    .get(x, y)
                    .map(|c| Pixel(Point::new(x as i32, y as i32), c))
            })
        });
        self.display.draw_iter(pixels).expect("infallible");
        self.window.update(&self.display);
        Ok(())
    }
}
