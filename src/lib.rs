//! A rain gauge for the next few hours.
//!
//! Reads the JMA precipitation nowcast and short-range forecast maps for one
//! location, reduces each forecast frame to an intensity category, and shows
//! the two series on an 8x8 LED grid.
//!
//! # Building
//! Requires:
//! - libclang, per [rs_ws281x](https://crates.io/crates/rs_ws281x) (feature `hardware`)
//! - a Chromium or Chrome install at runtime (feature `browser`)
//! - gcc-aarch64-linux-gnu for cross-compilation
//!
use std::thread;

use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::Point,
    pixelcolor::{Rgb888, RgbColor},
    Pixel,
};

pub mod acquisition;
#[cfg(feature = "browser")]
pub mod chrome;
pub mod context;
mod error;
pub mod framebuffer;
pub mod navigator;
pub mod palette;
pub mod progress;
pub mod render;
pub mod sampler;
pub mod session;

#[cfg(feature = "simulator")]
pub mod simulator;
#[cfg(feature = "hardware")]
pub mod unicorn;

use acquisition::RunResult;
use context::Context;
pub use error::Error;
use framebuffer::Framebuffer;
use navigator::{Location, Mode, NavigatorSettings};
use session::Launcher;

/// A small LED grid.
/// In real hardware, this is an 8x8 grid of WS2812 pixels.
pub trait Matrix {
    /// Access the pixels that the next flush will show.
    fn canvas(&mut self) -> &mut Framebuffer;

    /// Show the canvas on the device.
    fn flush(&mut self) -> Result<(), String>;

    /// Blank the canvas. Takes effect on the next flush.
    fn clear(&mut self) {
        self.canvas().clear(Rgb888::BLACK).expect("infallible");
    }

    /// Set one pixel of the canvas.
    fn set(&mut self, x: i32, y: i32, color: Rgb888) {
        self.canvas()
            .draw_iter([Pixel(Point::new(x, y), color)])
            .expect("infallible");
    }
}

/// Open the display this build was configured for.
#[cfg(feature = "simulator")]
pub fn open_matrix() -> Result<simulator::SimMatrix, String> {
    Ok(simulator::SimMatrix::new())
}

/// Open the display this build was configured for.
#[cfg(all(feature = "hardware", not(feature = "simulator")))]
pub fn open_matrix() -> Result<unicorn::UnicornHat, String> {
    unicorn::UnicornHat::new()
}

/// Open the display this build was configured for.
#[cfg(not(any(feature = "hardware", feature = "simulator")))]
pub fn open_matrix() -> Result<framebuffer::MemoryMatrix, String> {
    tracing::warn!("built without a display; output stays in memory");
    Ok(framebuffer::MemoryMatrix::default())
}

/// Results from both maps.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Forecasts {
    pub nowcast: RunResult,
    pub kotan: RunResult,
}

/// Read both maps, one after the other, while the progress indicator spins on
/// `matrix`.
///
/// The indicator runs on the calling thread, which owns the matrix;
/// the acquisition runs on a worker. On return the indicator has stopped and
/// the matrix has been blanked.
pub fn forecast<L, M>(
    matrix: &mut M,
    launcher: &L,
    location: Location,
    settings: &NavigatorSettings,
) -> Result<Forecasts, Error>
where
    L: Launcher + Sync,
    M: Matrix,
{
    let ctx = Context::new();
    let joined = thread::scope(|scope| {
        let worker = scope.spawn(|| -> Result<Forecasts, Error> {
            let _stop = ctx.cancel_on_drop();
            let run = |mode: Mode| {
                acquisition::run(launcher, location, mode.pages(), mode, settings)
            };
            Ok(Forecasts {
                nowcast: run(Mode::Nowcast)?,
                kotan: run(Mode::Kotan)?,
            })
        });
        progress::spin(matrix, &ctx);
        worker.join()
    });

    matrix.clear();
    if let Err(e) = matrix.flush() {
        tracing::warn!("could not blank display: {e}");
    }
    joined.map_err(|_| Error::Worker)?
}
