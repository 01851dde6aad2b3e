//! One full pass over a map's frames.

use std::ops::{Deref, DerefMut};

use serde::Serialize;

use crate::{
    navigator::{Forecast, Location, Mode, Navigator, NavigatorSettings},
    session::{Launcher, MapSession},
    Error,
};

/// The output of one acquisition run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunResult {
    pub location: Location,
    /// Frames in page order (earliest first).
    pub forecasts: Vec<Forecast>,
}

/// Closes the session when dropped.
struct Lease<S: MapSession>(S);

impl<S: MapSession> Deref for Lease<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.0
    }
}

impl<S: MapSession> DerefMut for Lease<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.0
    }
}

impl<S: MapSession> Drop for Lease<S> {
    fn drop(&mut self) {
        tracing::debug!("closing browser session");
        self.0.close();
    }
}

/// Read up to `pages` frames of the `mode` map at `location`.
///
/// Stops early, without error, when the map runs out of frames.
/// Any other failure aborts the run and discards the frames read so far.
/// The session is closed on every path.
pub fn run<L: Launcher>(
    launcher: &L,
    location: Location,
    pages: usize,
    mode: Mode,
    settings: &NavigatorSettings,
) -> Result<RunResult, Error> {
    tracing::info!("{mode}: reading up to {pages} frames at {location:?}");
    let mut session = Lease(launcher.launch().map_err(Error::Launch)?);

    let navigator = Navigator::open(&mut *session, mode, location, settings.clone())?;
    let forecasts = navigator
        .take(pages)
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|e| tracing::error!("{mode}: run aborted: {e}"))?;

    if forecasts.len() < pages {
        tracing::info!("{mode}: series ended after {} frames", forecasts.len());
    }
    Ok(RunResult {
        location,
        forecasts,
    })
}
