use std::{path::PathBuf, time::Duration};

use anyhow::{Context as _, Result};
use clap::Parser;
use nowcast::{
    chrome::{ChromeLauncher, ChromeSettings},
    context::Context,
    navigator::{Location, NavigatorSettings},
    render::render,
    Matrix,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nowcast", version, about = "Show the JMA rain nowcast on an LED grid")]
struct Cli {
    /// Latitude and longitude, in decimal degrees. Defaults to Tokyo Station.
    #[arg(value_name = "LAT LON", allow_hyphen_values = true)]
    coords: Vec<String>,

    /// Chromium / Chrome binary to drive
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Seconds to keep the forecast on the display
    #[arg(long, default_value_t = 240)]
    hold: u64,

    /// Print the forecasts to stdout as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let location = Location::from_args(cli.coords.as_slice()).unwrap_or_else(|| {
        if !cli.coords.is_empty() {
            tracing::warn!("ignoring coordinates {:?}; want LAT LON", cli.coords);
        }
        Location::default()
    });

    let mut matrix = nowcast::open_matrix()
        .map_err(anyhow::Error::msg)
        .context("could not open LED grid")?;

    let launcher = ChromeLauncher::new(ChromeSettings::with_path(cli.chrome));
    let forecasts = nowcast::forecast(
        &mut matrix,
        &launcher,
        location,
        &NavigatorSettings::default(),
    )
    .context("could not read forecasts")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&forecasts)?);
    }

    render(&mut matrix, &forecasts.nowcast, &forecasts.kotan)
        .map_err(anyhow::Error::msg)
        .context("could not draw forecasts")?;

    let ctx = Context::new();
    {
        let ctx = ctx.clone();
        ctrlc::set_handler(move || {
            tracing::info!("got SIGINT, closing context");
            ctx.cancel();
        })
        .context("could not set SIGINT handler")?;
    }
    tracing::info!("showing forecast for {}s", cli.hold);
    ctx.wait_timeout(Duration::from_secs(cli.hold));

    matrix.clear();
    if let Err(e) = matrix.flush() {
        tracing::warn!("could not blank display: {e}");
    }
    tracing::info!("shut down");
    Ok(())
}
