//! Show the map legend on the grid, one column per intensity, to check the colors.

use embedded_graphics::{
    prelude::{Point, Primitive, Size},
    primitives::{PrimitiveStyle, Rectangle},
    Drawable,
};
use nowcast::{context::Context, palette::PALETTE, Matrix};
use std::time::Duration;

pub fn main() {
    tracing_subscriber::fmt::init();
    let mut matrix = nowcast::open_matrix().expect("could not open LED grid");

    let ctx = Context::new();
    {
        let ctx = ctx.clone();
        ctrlc::set_handler(move || {
            tracing::info!("got SIGINT, closing context");
            ctx.cancel();
        })
        .expect("could not set SIGINT handler");
    }

    // Heaviest on the left; "no rain" is black and gets no column.
    matrix.clear();
    for (x, (intensity, _)) in PALETTE.iter().take(8).enumerate() {
        tracing::info!("column {x}: {intensity} mm/h");
        Rectangle::new(Point::new(x as i32, 0), Size::new(1, 8))
            .into_styled(PrimitiveStyle::with_fill(intensity.rgb()))
            .draw(matrix.canvas())
            .expect("infallible");
    }
    matrix.flush().expect("could not show legend");

    while !ctx.wait_timeout(Duration::from_secs(1)) {}
    tracing::info!("exiting");
}
