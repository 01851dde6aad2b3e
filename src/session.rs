//! The boundary to a remote rendering session (i.e. a browser tab).

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};

/// A remote page showing the map widget.
///
/// Operations address the widget's parts, not arbitrary DOM:
/// the implementation knows which elements they correspond to.
pub trait MapSession {
    /// Load the page at `url`.
    fn open(&mut self, url: &str) -> Result<()>;

    /// Click away the advertisement overlay,
    /// waiting up to `timeout` for it to appear.
    fn dismiss_overlay(&mut self, timeout: Duration) -> Result<()>;

    /// Text of the frame title (valid time),
    /// waiting up to `timeout` for it to become visible.
    fn title_text(&mut self, timeout: Duration) -> Result<String>;

    /// PNG screenshot of the map tile element.
    fn capture_map(&mut self) -> Result<Vec<u8>>;

    /// Activate the "next frame" control.
    /// Fails if there is no next frame.
    fn next_frame(&mut self) -> Result<()>;

    /// Release the session. Called exactly once.
    fn close(&mut self);
}

/// A type that can start remote sessions.
pub trait Launcher {
    type Session: MapSession;

    fn launch(&self) -> Result<Self::Session>;
}

/// One page of a [FakeSession].
#[derive(Clone, Debug)]
pub struct FakePage {
    /// Title text; `None` if the title never shows up.
    pub title: Option<String>,
    /// Title reads served before `title`, one per read, while the page loads.
    /// `None` is a read where the title is not visible yet.
    pub loading: Vec<Option<String>>,
    /// Map tile screenshot.
    pub png: Vec<u8>,
}

/// Fake session: serves a fixed list of pages.
/// The "next" control is present on every page but the last.
#[derive(Debug)]
pub struct FakeSession {
    pages: Vec<FakePage>,
    current: usize,
    reads: usize,
    overlay: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    pub fn new(pages: Vec<FakePage>) -> Self {
        FakeSession {
            pages,
            current: 0,
            reads: 0,
            overlay: false,
            log: Default::default(),
        }
    }

    /// Show an ad overlay on load.
    pub fn with_overlay(mut self) -> Self {
        self.overlay = true;
        self
    }

    /// Calls made against this session, in order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Title reads on the current page so far.
    pub fn title_reads(&self) -> usize {
        self.reads
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push(call.into());
    }

    fn page(&self) -> Result<&FakePage> {
        self.pages
            .get(self.current)
            .ok_or_else(|| anyhow!("no page loaded"))
    }
}

impl MapSession for FakeSession {
    fn open(&mut self, url: &str) -> Result<()> {
        self.record(format!("open {url}"));
        self.current = 0;
        self.reads = 0;
        Ok(())
    }

    fn dismiss_overlay(&mut self, _timeout: Duration) -> Result<()> {
        if !self.overlay {
            return Err(anyhow!("no overlay"));
        }
        self.record("dismiss");
        self.overlay = false;
        Ok(())
    }

    fn title_text(&mut self, _timeout: Duration) -> Result<String> {
        let read = self.reads;
        self.reads += 1;
        let page = self.page()?;
        page.loading
            .get(read)
            .unwrap_or(&page.title)
            .clone()
            .ok_or_else(|| anyhow!("title not visible"))
    }

    fn capture_map(&mut self) -> Result<Vec<u8>> {
        self.record(format!("capture {}", self.current));
        Ok(self.page()?.png.clone())
    }

    fn next_frame(&mut self) -> Result<()> {
        if self.current + 1 >= self.pages.len() {
            return Err(anyhow!("no next control"));
        }
        self.current += 1;
        self.reads = 0;
        self.record("next");
        Ok(())
    }

    fn close(&mut self) {
        self.record("close");
    }
}

/// Fake launcher: hands out queued [FakeSession]s in order.
///
/// Sessions keep reporting to the launcher's log after they are handed out.
#[derive(Default, Debug)]
pub struct FakeLauncher {
    queue: Mutex<VecDeque<FakeSession>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl FakeLauncher {
    pub fn new(sessions: impl IntoIterator<Item = FakeSession>) -> Self {
        let log: Arc<Mutex<Vec<String>>> = Default::default();
        let queue = sessions
            .into_iter()
            .map(|s| FakeSession {
                log: log.clone(),
                ..s
            })
            .collect();
        FakeLauncher {
            queue: Mutex::new(queue),
            log,
        }
    }

    /// Calls made against all sessions from this launcher, in order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl Launcher for FakeLauncher {
    type Session = FakeSession;

    fn launch(&self) -> Result<FakeSession> {
        let session = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no more sessions"))?;
        session.record("launch");
        Ok(session)
    }
}
