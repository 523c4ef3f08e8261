//! One owned browser instance, scoped to a single fetch.

use std::time::Duration;

use {
    chromiumoxide::{Browser, BrowserConfig as CdpBrowserConfig},
    futures::StreamExt,
    tokio::task::JoinHandle,
    tracing::{debug, info},
};

use {cookiegate_config::BrowserConfig, cookiegate_protocol::CookiePair};

use crate::{detect, error::BrowserError};

/// A launched browser plus its CDP event pump.
///
/// The instance is exclusively owned by one fetch; call [`close`] when done.
/// Dropping without closing (the cancellation path) still tears everything
/// down: the event task is aborted here and chromiumoxide kills the child
/// process when the `Browser` is dropped.
///
/// [`close`]: BrowserSession::close
pub struct BrowserSession {
    browser: Browser,
    event_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a browser per the given config.
    pub async fn launch(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let detection = detect::detect_browser(config.chrome_path.as_deref());
        if !detection.found {
            return Err(BrowserError::BrowserNotAvailable(detection.install_hint));
        }

        let mut builder = CdpBrowserConfig::builder()
            .request_timeout(Duration::from_millis(config.navigation_timeout_ms));

        // chromiumoxide is headless by default; with_head() opens a window.
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(path) = detection.path {
            builder = builder.chrome_executable(path);
        }

        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");

        let cdp_config = builder.build().map_err(BrowserError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Pump CDP events until the connection closes.
        let event_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!(?event, "browser event");
            }
            debug!("browser event pump exited");
        });

        info!(headless = config.headless, "launched browser");
        Ok(Self {
            browser,
            event_task,
        })
    }

    /// Navigate to `url` and return the cookie set the page ends up with,
    /// in the order the browser reports them.
    pub async fn cookies_for(&self, url: &str) -> Result<Vec<CookiePair>, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        page.goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        let _ = page.wait_for_navigation().await;

        let cookies = page
            .get_cookies()
            .await
            .map_err(|e| BrowserError::CookieReadFailed(e.to_string()))?;

        debug!(url, count = cookies.len(), "read cookies");
        Ok(cookies
            .into_iter()
            .map(|c| CookiePair::new(c.name, c.value))
            .collect())
    }

    /// Shut the browser down. Errors are logged, not surfaced: by this point
    /// the fetch outcome is already decided.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!(error = %e, "browser close failed");
        }
        self.event_task.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Browser's own Drop kills the child process.
        self.event_task.abort();
    }
}
