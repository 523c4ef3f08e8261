//! The collaborator seam consumed by the gateway.

use {
    async_trait::async_trait,
    tokio::time::{Duration, timeout},
    tracing::{info, warn},
};

use {cookiegate_config::BrowserConfig, cookiegate_protocol::CookiePair};

use crate::{error::BrowserError, session::BrowserSession};

/// Yields the target site's cookie set. The gateway holds this as a trait
/// object so tests can substitute a scripted source.
#[async_trait]
pub trait CookieSource: Send + Sync {
    async fn fetch_cookies(&self) -> Result<Vec<CookiePair>, BrowserError>;
}

/// Production source: a fresh headless Chromium per fetch.
pub struct HeadlessChromeSource {
    config: BrowserConfig,
}

impl HeadlessChromeSource {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    /// Launch, navigate, read cookies, close. The session is closed on the
    /// success and failure paths alike; if the whole future is dropped (fetch
    /// timeout, client disconnect) the session's Drop tears the browser down.
    async fn fetch_once(&self) -> Result<Vec<CookiePair>, BrowserError> {
        let session = BrowserSession::launch(&self.config).await?;
        let result = session.cookies_for(&self.config.target_url).await;
        session.close().await;

        match &result {
            Ok(cookies) => {
                info!(
                    url = %self.config.target_url,
                    count = cookies.len(),
                    "cookie fetch complete"
                );
            },
            Err(e) => {
                warn!(url = %self.config.target_url, error = %e, "cookie fetch failed");
            },
        }
        result
    }
}

#[async_trait]
impl CookieSource for HeadlessChromeSource {
    async fn fetch_cookies(&self) -> Result<Vec<CookiePair>, BrowserError> {
        let bound = Duration::from_millis(self.config.navigation_timeout_ms);
        match timeout(bound, self.fetch_once()).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Timeout(format!(
                "cookie fetch timed out after {}ms",
                self.config.navigation_timeout_ms
            ))),
        }
    }
}
