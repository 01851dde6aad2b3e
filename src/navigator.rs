//! Walks the frames of a remote nowcast map, one page at a time.
//!
//! The map widget shows one forecast frame per page, with a title giving the
//! frame's valid time and a "next" control that is absent on the last frame.
//! [Navigator] drives a [MapSession] through those pages:
//!
//! ```text
//! Initializing -> PageReady -> Capturing -> Advancing -> PageReady ...
//!                                                     \-> Done
//! ```
//!
//! and yields one [Forecast] per frame.

use std::{
    fmt,
    iter::FusedIterator,
    thread,
    time::{Duration, Instant},
};

use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::{
    palette::Intensity,
    sampler::{decode_png, sample_max, WINDOW_HALF_WIDTH},
    session::MapSession,
    Error,
};

/// Which map to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// The high-resolution precipitation nowcast: 5-minute steps, one hour out.
    Nowcast,
    /// The short-range precipitation forecast overlay ("kaikotan").
    Kotan,
}

impl Mode {
    /// URL of the map centered on `location`, at zoom 14.
    pub fn url(self, location: Location) -> String {
        let Location { lat, lon } = location;
        match self {
            Mode::Nowcast => format!(
                "https://www.jma.go.jp/bosai/nowc/#zoom:14/lat:{lat:.6}/lon:{lon:.6}/colordepth:deep/elements:hrpns"
            ),
            Mode::Kotan => format!(
                "https://www.jma.go.jp/bosai/kaikotan/#lat:{lat:.6}/lon:{lon:.6}/zoom:14/colordepth:deep/elements:rasrf"
            ),
        }
    }

    /// Number of frames to read from this map.
    pub fn pages(self) -> usize {
        match self {
            Mode::Nowcast => 13,
            Mode::Kotan => 16,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Nowcast => "nowc",
            Mode::Kotan => "kotan",
        })
    }
}

/// Point of interest, in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Parse a `LAT LON` pair of command line arguments.
    ///
    /// Returns `None` unless there are exactly two arguments and both are numbers.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Option<Location> {
        let [lat, lon] = args else {
            return None;
        };
        Some(Location {
            lat: lat.as_ref().trim().parse().ok()?,
            lon: lon.as_ref().trim().parse().ok()?,
        })
    }
}

impl Default for Location {
    /// Tokyo Station.
    fn default() -> Self {
        Location {
            lat: 35.681236,
            lon: 139.76712,
        }
    }
}

/// Valid time of a frame.
///
/// Displays (and serializes) as `YYYYMMDDHHMM00`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameTime(pub NaiveDateTime);

impl FrameTime {
    const TITLE_SUFFIX: &'static str = "まで";
    const TITLE_FORMAT: &'static str = "%Y年%m月%d日%H時%M分";

    /// Parse a frame title, e.g. `2024年5月1日13時30分まで`.
    pub fn from_title(title: &str) -> Result<Self, Error> {
        let text = title.replace(Self::TITLE_SUFFIX, "");
        NaiveDateTime::parse_from_str(text.trim(), Self::TITLE_FORMAT)
            .map(FrameTime)
            .map_err(|source| Error::TitleFormat {
                text: title.to_owned(),
                source,
            })
    }
}

impl fmt::Display for FrameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d%H%M00"))
    }
}

impl Serialize for FrameTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The classified intensity of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Forecast {
    pub time: FrameTime,
    pub intensity: Intensity,
}

impl Serialize for Forecast {
    /// A single-entry map: `{"20240501133000": "5"}`.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.time, &self.intensity)?;
        map.end()
    }
}

/// Timing and sampling for a [Navigator].
#[derive(Clone, Debug)]
pub struct NavigatorSettings {
    /// Fixed wait after loading and after each advance.
    pub settle: Duration,
    /// Upper bound on any wait for a page element.
    pub wait_timeout: Duration,
    /// Interval between title reads while waiting for the title to stop changing.
    pub poll_interval: Duration,
    /// Half-width of the sampling window, in pixels.
    pub window_half_width: u32,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(1),
            wait_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(200),
            window_half_width: WINDOW_HALF_WIDTH,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    PageReady,
    Advancing,
    Done,
}

/// Iterator over the frames of a map.
///
/// Yields an error at most once, after which it is exhausted.
pub struct Navigator<'s, S: MapSession> {
    session: &'s mut S,
    mode: Mode,
    settings: NavigatorSettings,
    state: State,
}

impl<'s, S: MapSession> Navigator<'s, S> {
    /// Load the map for `mode` at `location` and get it ready for the first frame.
    pub fn open(
        session: &'s mut S,
        mode: Mode,
        location: Location,
        settings: NavigatorSettings,
    ) -> Result<Self, Error> {
        let url = mode.url(location);
        tracing::debug!("{mode}: opening {url}");
        if let Err(source) = session.open(&url) {
            return Err(Error::Open { mode, url, source });
        }
        thread::sleep(settings.settle);

        match session.dismiss_overlay(settings.wait_timeout) {
            Ok(()) => tracing::debug!("{mode}: dismissed ad overlay"),
            Err(e) => tracing::debug!("{mode}: no ad overlay: {e}"),
        }

        Ok(Navigator {
            session,
            mode,
            settings,
            state: State::PageReady,
        })
    }

    /// Wait for the page to settle, and return the frame's valid time.
    ///
    /// After the fixed settle delay, the title is polled until two consecutive
    /// reads give the same valid time. An empty, hidden or unparseable title
    /// is not ready yet. If the title is still changing at the timeout, the
    /// latest valid read is used.
    fn settle(&mut self) -> Result<FrameTime, Error> {
        let mode = self.mode;
        let timeout = self.settings.wait_timeout;
        thread::sleep(self.settings.settle);

        let deadline = Instant::now() + timeout;
        let not_found = |source| Error::TitleNotFound {
            mode,
            timeout,
            source,
        };
        // Text of the previous read, if it was a valid title.
        let mut previous: Option<String> = None;
        let mut latest: Option<FrameTime> = None;
        let mut failure = None;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.session.title_text(remaining) {
                Ok(text) if text.trim().is_empty() => {
                    previous = None;
                    failure = Some(not_found(anyhow!("title is empty")));
                }
                Ok(text) => match FrameTime::from_title(&text) {
                    Ok(time) => {
                        if previous.as_deref() == Some(text.as_str()) {
                            return Ok(time);
                        }
                        if let Some(prev) = &previous {
                            tracing::debug!("{mode}: title changed from {prev:?} to {text:?}");
                        }
                        previous = Some(text);
                        latest = Some(time);
                    }
                    Err(e) => {
                        previous = None;
                        failure = Some(e);
                    }
                },
                Err(source) => {
                    previous = None;
                    failure = Some(not_found(source));
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(self.settings.poll_interval);
        }

        if let Some(time) = latest {
            tracing::warn!("{mode}: title still changing after {timeout:?}; using {time}");
            return Ok(time);
        }
        Err(failure.unwrap_or_else(|| not_found(anyhow!("title never read"))))
    }

    /// PageReady + Capturing.
    fn frame(&mut self) -> Result<Forecast, Error> {
        let time = self.settle()?;

        let png = self.session.capture_map().map_err(|source| Error::Capture {
            mode: self.mode,
            source,
        })?;
        let image = decode_png(&png)?;
        let intensity = sample_max(&image, self.settings.window_half_width);
        tracing::info!("{}: frame {time}: {intensity}", self.mode);
        Ok(Forecast { time, intensity })
    }

    fn advance(&mut self) {
        match self.session.next_frame() {
            Ok(()) => self.state = State::PageReady,
            Err(e) => {
                tracing::debug!("{}: end of series: {e}", self.mode);
                self.state = State::Done;
            }
        }
    }
}

impl<S: MapSession> Iterator for Navigator<'_, S> {
    type Item = Result<Forecast, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Advancing {
            self.advance();
        }
        if self.state == State::Done {
            return None;
        }
        let frame = self.frame();
        self.state = match frame {
            Ok(_) => State::Advancing,
            Err(_) => State::Done,
        };
        Some(frame)
    }
}

impl<S: MapSession> FusedIterator for Navigator<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        palette::color_of,
        session::{FakePage, FakeSession},
    };
    use chrono::NaiveDate;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn instant() -> NavigatorSettings {
        NavigatorSettings {
            settle: Duration::ZERO,
            wait_timeout: Duration::from_millis(50),
            poll_interval: Duration::ZERO,
            ..Default::default()
        }
    }

    fn png(intensity: Intensity) -> Vec<u8> {
        let img = RgbaImage::from_pixel(64, 64, Rgba(color_of(intensity)));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn title(hour: u32, minute: u32) -> String {
        format!("2024年5月1日{hour}時{minute:02}分まで")
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    /// One page whose title reads `loading`, in order, before showing 13:30.
    fn loading_page(loading: Vec<Option<String>>) -> FakeSession {
        FakeSession::new(vec![FakePage {
            title: Some(title(13, 30)),
            loading,
            png: png(Intensity::Mm1),
        }])
    }

    fn polling() -> NavigatorSettings {
        NavigatorSettings {
            wait_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(10),
            ..instant()
        }
    }

    fn page(minute: u32, intensity: Intensity) -> FakePage {
        FakePage {
            title: Some(title(13, minute)),
            loading: Vec::new(),
            png: png(intensity),
        }
    }

    #[test]
    fn test_title_parse() {
        let t = FrameTime::from_title("2024年5月1日13時30分まで").unwrap();
        assert_eq!(
            t.0,
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(13, 30, 0)
                .unwrap()
        );
        assert_eq!(t.to_string(), "20240501133000");
        assert_eq!(
            FrameTime::from_title("2024年12月31日09時05分").unwrap().to_string(),
            "20241231090500"
        );
    }

    #[test]
    fn test_title_parse_failure() {
        let err = FrameTime::from_title("まもなく").unwrap_err();
        assert!(matches!(err, Error::TitleFormat { ref text, .. } if text == "まもなく"));
    }

    #[test]
    fn test_location_args() {
        assert_eq!(
            Location::from_args(&["34.7", "-135.5"]),
            Some(Location { lat: 34.7, lon: -135.5 })
        );
        assert_eq!(Location::from_args::<&str>(&[]), None);
        assert_eq!(Location::from_args(&["34.7"]), None);
        assert_eq!(Location::from_args(&["34.7", "east"]), None);
        assert_eq!(Location::from_args(&["1", "2", "3"]), None);
    }

    #[test]
    fn test_urls() {
        let here = Location { lat: 35.0, lon: 139.5 };
        assert_eq!(
            Mode::Nowcast.url(here),
            "https://www.jma.go.jp/bosai/nowc/#zoom:14/lat:35.000000/lon:139.500000/colordepth:deep/elements:hrpns"
        );
        assert!(Mode::Kotan.url(here).contains("/kaikotan/#lat:35.000000/lon:139.500000/zoom:14/"));
    }

    #[test]
    fn test_walks_all_frames() {
        let mut session = FakeSession::new(vec![
            page(0, Intensity::Mm0),
            page(5, Intensity::Mm5),
            page(10, Intensity::Missing),
        ])
        .with_overlay();
        let nav = Navigator::open(&mut session, Mode::Nowcast, Location::default(), instant())
            .unwrap();
        let frames: Vec<Forecast> = nav.map(Result::unwrap).collect();
        let got: Vec<(String, Intensity)> = frames
            .iter()
            .map(|f| (f.time.to_string(), f.intensity))
            .collect();
        assert_eq!(
            got,
            vec![
                ("20240501130000".to_owned(), Intensity::Mm0),
                ("20240501130500".to_owned(), Intensity::Mm5),
                ("20240501131000".to_owned(), Intensity::Missing),
            ]
        );
        let log = session.log();
        assert!(log[0].starts_with("open https://www.jma.go.jp/bosai/nowc/"));
        assert_eq!(
            &log[1..],
            ["dismiss", "capture 0", "next", "capture 1", "next", "capture 2"]
        );
    }

    #[test]
    fn test_missing_title_ends_iteration() {
        let mut session = FakeSession::new(vec![
            page(0, Intensity::Mm1),
            FakePage {
                title: None,
                loading: Vec::new(),
                png: png(Intensity::Mm1),
            },
            page(10, Intensity::Mm1),
        ]);
        let mut nav =
            Navigator::open(&mut session, Mode::Kotan, Location::default(), instant()).unwrap();
        assert!(nav.next().unwrap().is_ok());
        assert!(matches!(
            nav.next(),
            Some(Err(Error::TitleNotFound { mode: Mode::Kotan, .. }))
        ));
        assert!(nav.next().is_none());
    }

    #[test]
    fn test_waits_for_empty_title() {
        let mut session = loading_page(vec![Some(String::new()); 3]);
        let mut nav =
            Navigator::open(&mut session, Mode::Nowcast, Location::default(), polling()).unwrap();
        let frame = nav.next().unwrap().unwrap();
        assert_eq!(frame.time.0, at(13, 30));
        drop(nav);
        assert_eq!(session.title_reads(), 5);
    }

    #[test]
    fn test_waits_for_title_to_settle() {
        let mut session = loading_page(vec![
            None,
            Some("まもなく".to_owned()),
            Some(title(13, 20)),
            Some(title(13, 25)),
        ]);
        let mut nav =
            Navigator::open(&mut session, Mode::Kotan, Location::default(), polling()).unwrap();
        let frame = nav.next().unwrap().unwrap();
        assert_eq!(frame.time.0, at(13, 30));
        drop(nav);
        assert_eq!(session.title_reads(), 6);
    }

    #[test]
    fn test_title_never_settles() {
        // A new time on every read, for far longer than the wait.
        let titles: Vec<Option<String>> = (0..500)
            .map(|i| Some(title(5 + i / 60, i % 60)))
            .collect();
        let mut session = loading_page(titles);
        let settings = NavigatorSettings {
            wait_timeout: Duration::from_millis(100),
            ..polling()
        };
        let mut nav =
            Navigator::open(&mut session, Mode::Nowcast, Location::default(), settings).unwrap();
        let frame = nav.next().unwrap().unwrap();
        drop(nav);

        let reads = session.title_reads() as u32;
        assert!((2..500).contains(&reads), "{reads} reads");
        let last = reads - 1;
        assert_eq!(frame.time.0, at(5 + last / 60, last % 60));
    }

    #[test]
    fn test_title_stays_empty() {
        let mut session = FakeSession::new(vec![FakePage {
            title: Some(" ".to_owned()),
            loading: Vec::new(),
            png: png(Intensity::Mm1),
        }]);
        let start = Instant::now();
        let mut nav =
            Navigator::open(&mut session, Mode::Nowcast, Location::default(), instant()).unwrap();
        assert!(matches!(
            nav.next(),
            Some(Err(Error::TitleNotFound { mode: Mode::Nowcast, .. }))
        ));
        assert!(start.elapsed() >= instant().wait_timeout);
        drop(nav);
        assert!(session.title_reads() > 1);
    }

    #[test]
    fn test_title_stays_unparseable() {
        let mut session = FakeSession::new(vec![FakePage {
            title: Some("まもなく".to_owned()),
            loading: vec![Some(String::new())],
            png: png(Intensity::Mm1),
        }]);
        let mut nav =
            Navigator::open(&mut session, Mode::Kotan, Location::default(), instant()).unwrap();
        assert!(matches!(
            nav.next(),
            Some(Err(Error::TitleFormat { ref text, .. })) if text == "まもなく"
        ));
    }

    #[test]
    fn test_bad_capture() {
        let mut session = FakeSession::new(vec![FakePage {
            title: Some(title(13, 30)),
            loading: Vec::new(),
            png: b"garbage".to_vec(),
        }]);
        let mut nav =
            Navigator::open(&mut session, Mode::Nowcast, Location::default(), instant()).unwrap();
        assert!(matches!(nav.next(), Some(Err(Error::Decode(_)))));
        assert!(nav.next().is_none());
    }

    #[test]
    fn test_forecast_json() {
        let f = Forecast {
            time: FrameTime::from_title("2024年5月1日13時30分まで").unwrap(),
            intensity: Intensity::Mm5,
        };
        assert_eq!(
            serde_json::to_string(&f).unwrap(),
            r#"{"20240501133000":"5"}"#
        );
    }
}
