//! Shared, read-only gateway state.

use std::sync::Arc;

use {cookiegate_browser::CookieSource, cookiegate_config::ServerConfig};

/// Immutable after startup; connection tasks only ever read from it. All
/// mutable state (the gate, the in-flight request) lives inside each task.
pub struct GatewayState {
    pub version: String,
    pub config: ServerConfig,
    pub cookies: Arc<dyn CookieSource>,
}

impl GatewayState {
    pub fn new(config: ServerConfig, cookies: Arc<dyn CookieSource>) -> Arc<Self> {
        Arc::new(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config,
            cookies,
        })
    }
}
