//! Lay the two forecast series out on the display.
//!
//! Each series starts with the "now" frame in column 0 of its first row,
//! then runs left-to-right from column 2, wrapping onto following rows:
//!
//! ```text
//!   0 1 2 3 4 5 6 7
//! 0 N . 1 2 3 4 5 6   nowcast
//! 1 . . 7 8 9 a b c
//! 2 N . 1 2 3 4 5 6   kotan
//! 3 . . 7 8 9 a b c
//! 4 . . d e f
//! ```

use embedded_graphics_core::{
    draw_target::DrawTarget, geometry::Point, pixelcolor::Rgb888, Pixel,
};

use crate::{acquisition::RunResult, navigator::Mode, Matrix};

/// A run of consecutive series entries drawn along one row.
#[derive(Clone, Copy, Debug)]
struct Band {
    /// Index of the first entry in the band.
    first: usize,
    /// Number of entries in the band; `None` runs to the end of the series.
    len: Option<usize>,
    /// Position of the first entry.
    origin: (i32, i32),
}

const NOWCAST: [Band; 3] = [
    Band {
        first: 0,
        len: Some(1),
        origin: (0, 0),
    },
    Band {
        first: 1,
        len: Some(6),
        origin: (2, 0),
    },
    Band {
        first: 7,
        len: None,
        origin: (2, 1),
    },
];

const KOTAN: [Band; 4] = [
    Band {
        first: 0,
        len: Some(1),
        origin: (0, 2),
    },
    Band {
        first: 1,
        len: Some(6),
        origin: (2, 2),
    },
    Band {
        first: 7,
        len: Some(6),
        origin: (2, 3),
    },
    Band {
        first: 13,
        len: None,
        origin: (2, 4),
    },
];

fn layout(mode: Mode) -> &'static [Band] {
    match mode {
        Mode::Nowcast => &NOWCAST,
        Mode::Kotan => &KOTAN,
    }
}

/// Display position of the `index`th entry of a `mode` series.
pub fn position(mode: Mode, index: usize) -> Option<Point> {
    layout(mode)
        .iter()
        .find(|b| index >= b.first && b.len.map_or(true, |len| index < b.first + len))
        .map(|b| Point::new(b.origin.0 + (index - b.first) as i32, b.origin.1))
}

fn pixels(mode: Mode, run: &RunResult) -> impl Iterator<Item = Pixel<Rgb888>> + '_ {
    run.forecasts
        .iter()
        .enumerate()
        .filter_map(move |(i, f)| position(mode, i).map(|p| Pixel(p, f.intensity.rgb())))
}

/// Clear the display and draw both series, then flush once.
pub fn render(
    matrix: &mut impl Matrix,
    nowcast: &RunResult,
    kotan: &RunResult,
) -> Result<(), String> {
    matrix.clear();
    let canvas = matrix.canvas();
    for (mode, run) in [(Mode::Nowcast, nowcast), (Mode::Kotan, kotan)] {
        tracing::debug!("drawing {} {mode} frames", run.forecasts.len());
        canvas.draw_iter(pixels(mode, run)).expect("infallible");
    }
    matrix.flush()
}
