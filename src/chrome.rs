//! Map sessions in a headless Chromium, over the DevTools protocol.

use std::{ffi::OsStr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use headless_chrome::{
    protocol::cdp::Page::CaptureScreenshotFormatOption, Browser, LaunchOptions, Tab,
};

use crate::session::{Launcher, MapSession};

/// Selectors for the parts of the map widget.
mod selector {
    pub const AD_CLOSE: &str = ".jmatile-clear-ad";
    pub const TITLE: &str = ".jmatile-map-title-validtime";
    pub const MAP: &str = ".jmatile-map";
    pub const NEXT: &str = "[id^=jmatile_time_next_]";
}

/// Settings when launching the browser.
#[non_exhaustive]
pub struct ChromeSettings {
    /// Browser binary. Defaults to whatever headless_chrome finds on the system.
    pub path: Option<PathBuf>,
    /// Window (viewport) size, in pixels.
    pub window_size: (u32, u32),
    pub headless: bool,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            path: None,
            window_size: (800, 800),
            headless: true,
        }
    }
}

impl ChromeSettings {
    pub fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }
}

/// Starts one browser process per session.
#[derive(Default)]
pub struct ChromeLauncher {
    settings: ChromeSettings,
}

impl ChromeLauncher {
    pub fn new(settings: ChromeSettings) -> Self {
        Self { settings }
    }

    fn options(&self) -> Result<LaunchOptions<'static>> {
        let args: Vec<&'static OsStr> = [
            "--disable-dev-shm-usage",
            "--disable-extensions",
            "--disable-gpu",
            "--disable-infobars",
        ]
        .into_iter()
        .map(OsStr::new)
        .collect();
        LaunchOptions::default_builder()
            .headless(self.settings.headless)
            .sandbox(false)
            .window_size(Some(self.settings.window_size))
            .path(self.settings.path.clone())
            .args(args)
            // Element waits alone can run 15s; don't let the browser idle out under them.
            .idle_browser_timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| anyhow!("invalid browser options: {e}"))
    }
}

impl Launcher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self) -> Result<ChromeSession> {
        let browser = Browser::new(self.options()?)?;
        let tab = browser.new_tab()?;
        tracing::debug!("browser started");
        Ok(ChromeSession { browser, tab })
    }
}

/// A browser process with one tab on the map.
pub struct ChromeSession {
    // Keeps the process alive; dropping it kills the browser.
    #[allow(unused)]
    browser: Browser,
    tab: Arc<Tab>,
}

impl MapSession for ChromeSession {
    fn open(&mut self, url: &str) -> Result<()> {
        self.tab.navigate_to(url)?.wait_until_navigated()?;
        Ok(())
    }

    fn dismiss_overlay(&mut self, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector::AD_CLOSE, timeout)?
            .click()?;
        Ok(())
    }

    fn title_text(&mut self, timeout: Duration) -> Result<String> {
        self.tab
            .wait_for_element_with_custom_timeout(selector::TITLE, timeout)?
            .get_inner_text()
    }

    fn capture_map(&mut self) -> Result<Vec<u8>> {
        self.tab
            .find_element(selector::MAP)?
            .capture_screenshot(CaptureScreenshotFormatOption::Png)
    }

    fn next_frame(&mut self) -> Result<()> {
        self.tab.find_element(selector::NEXT)?.click()?;
        Ok(())
    }

    fn close(&mut self) {
        if let Err(e) = self.tab.close(true) {
            tracing::warn!("could not close browser tab: {e}");
        }
    }
}
