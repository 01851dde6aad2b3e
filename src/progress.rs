//! A busy indicator: one dot circling the middle of the display.
//!
//! It knows nothing about the acquisition; it spins until cancelled.

use std::time::Duration;

use embedded_graphics_core::pixelcolor::Rgb888;

use crate::{context::Context, Matrix};

/// Time each dot position stays lit.
pub const PERIOD: Duration = Duration::from_millis(100);

const COLOR: Rgb888 = Rgb888::new(0, 255, 255);

/// Dot positions, in order.
const PHASES: [(i32, i32); 4] = [(3, 3), (3, 4), (4, 4), (4, 3)];

/// The indicator's animation state.
#[derive(Default, Debug)]
pub struct Spinner {
    count: usize,
}

impl Spinner {
    /// Draw the current phase and move to the next one.
    pub fn step(&mut self, matrix: &mut impl Matrix) -> Result<(), String> {
        let (x, y) = PHASES[self.count % PHASES.len()];
        matrix.clear();
        matrix.set(x, y, COLOR);
        matrix.flush()?;
        self.count = self.count.wrapping_add(1);
        Ok(())
    }
}

/// Animate the indicator on `matrix` until `ctx` is cancelled.
pub fn spin(matrix: &mut impl Matrix, ctx: &Context) {
    let mut spinner = Spinner::default();
    while !ctx.is_cancelled() {
        if let Err(e) = spinner.step(matrix) {
            tracing::warn!("progress indicator could not flush: {e}");
        }
        if ctx.wait_timeout(PERIOD) {
            break;
        }
    }
    tracing::debug!("progress indicator stopped after {} steps", spinner.count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::MemoryMatrix;
    use embedded_graphics_core::geometry::Point;
    use std::thread;

    #[test]
    fn test_dot_circles() {
        let mut m = MemoryMatrix::default();
        let mut spinner = Spinner::default();
        let mut seen = Vec::new();
        for _ in 0..5 {
            spinner.step(&mut m).unwrap();
            let lit: Vec<_> = m.shown.lit().collect();
            assert_eq!(lit.len(), 1);
            assert_eq!(lit[0].1, COLOR);
            seen.push(lit[0].0);
        }
        assert_eq!(
            seen,
            [
                Point::new(3, 3),
                Point::new(3, 4),
                Point::new(4, 4),
                Point::new(4, 3),
                Point::new(3, 3),
            ]
        );
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut m = MemoryMatrix::default();
        let ctx = Context::new();
        ctx.cancel();
        spin(&mut m, &ctx);
        assert_eq!(m.flushes, 0);
    }

    #[test]
    fn test_spins_until_cancelled() {
        let mut m = MemoryMatrix::default();
        let ctx = Context::new();
        thread::scope(|s| {
            let stopper = ctx.clone();
            s.spawn(move || {
                thread::sleep(PERIOD * 3);
                stopper.cancel();
            });
            spin(&mut m, &ctx);
        });
        assert!(m.flushes >= 1);
        assert_eq!(m.shown.lit().count(), 1);
    }
}
