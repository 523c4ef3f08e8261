//! Configuration loading for the cookie gateway.
//!
//! Settings come from an optional `cookiegate.toml` (project-local or
//! user-global) with environment variables layered on top. Missing file means
//! defaults; a broken file is logged and ignored.

mod loader;
mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::{BrowserConfig, CookiegateConfig, ServerConfig},
};
