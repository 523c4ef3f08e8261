//! Config schema with serde defaults.

use serde::{Deserialize, Serialize};

use cookiegate_protocol::{DEFAULT_PORT, FIRST_MESSAGE_TIMEOUT_MS, RATE_LIMIT_SECS};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CookiegateConfig {
    pub server: ServerConfig,
    pub browser: BrowserConfig,
}

/// Listener and per-connection policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Externally advertised hostname (display only). When set, the startup
    /// banner shows a `wss://` URL instead of the bind address.
    pub external_hostname: Option<String>,
    /// Minimum seconds between accepted requests on one connection.
    pub rate_limit_secs: u64,
    /// How long to wait for the first message before closing an idle
    /// connection.
    pub first_message_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            external_hostname: None,
            rate_limit_secs: RATE_LIMIT_SECS,
            first_message_timeout_ms: FIRST_MESSAGE_TIMEOUT_MS,
        }
    }
}

/// Browser collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// The site whose cookies are extracted.
    pub target_url: String,
    /// Run the browser headless.
    pub headless: bool,
    /// Explicit Chromium executable path. `None` means auto-detect.
    pub chrome_path: Option<String>,
    /// Upper bound on one launch + navigate + cookie read, in milliseconds.
    pub navigation_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            target_url: "https://play.blooket.com/play".into(),
            headless: true,
            chrome_path: None,
            navigation_timeout_ms: 30_000,
        }
    }
}
