use std::time::Duration;

use thiserror::Error;

use crate::navigator::Mode;

/// Failures of an acquisition run.
///
/// A missing ad overlay or a missing "next" control are not errors;
/// everything here aborts the run it occurred in.
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not start a browser session")]
    Launch(#[source] anyhow::Error),

    #[error("could not open the {mode} map at {url}")]
    Open {
        mode: Mode,
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no frame title appeared on the {mode} map within {timeout:?}")]
    TitleNotFound {
        mode: Mode,
        timeout: Duration,
        #[source]
        source: anyhow::Error,
    },

    #[error("frame title {text:?} is not a valid time")]
    TitleFormat {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("could not capture the {mode} map tile")]
    Capture {
        mode: Mode,
        #[source]
        source: anyhow::Error,
    },

    #[error("captured map tile is not a readable PNG")]
    Decode(#[from] image::ImageError),

    #[error("acquisition worker panicked")]
    Worker,
}
