use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::CookiegateConfig;

/// Standard config file name.
const CONFIG_FILENAME: &str = "cookiegate.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<CookiegateConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(toml::from_str(&raw)?)
}

/// Discover and load config, then apply environment overrides.
///
/// Search order:
/// 1. `./cookiegate.toml` (project-local)
/// 2. `~/.config/cookiegate/cookiegate.toml` (user-global)
///
/// Returns defaults (plus env overrides) if no config file is found.
pub fn discover_and_load() -> CookiegateConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            match load_config(&path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                    CookiegateConfig::default()
                },
            }
        },
        None => {
            debug!("no config file found, using defaults");
            CookiegateConfig::default()
        },
    };

    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    // User-global: ~/.config/cookiegate/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "cookiegate") {
        let p = dirs.config_dir().join(CONFIG_FILENAME);
        if p.exists() {
            return Some(p);
        }
    }

    None
}

/// Environment variables win over file values. `PORT` and
/// `RENDER_EXTERNAL_HOSTNAME` are the deploy-platform conventions; the rest
/// are service-specific.
fn apply_env_overrides(config: &mut CookiegateConfig) {
    if let Ok(port) = std::env::var("PORT") {
        match port.parse::<u16>() {
            Ok(p) => config.server.port = p,
            Err(_) => warn!(value = %port, "ignoring non-numeric PORT"),
        }
    }
    if let Ok(host) = std::env::var("RENDER_EXTERNAL_HOSTNAME")
        && !host.is_empty()
    {
        config.server.external_hostname = Some(host);
    }
    if let Ok(url) = std::env::var("TARGET_URL")
        && !url.is_empty()
    {
        config.browser.target_url = url;
    }
    if let Ok(path) = std::env::var("CHROME")
        && !path.is_empty()
    {
        config.browser.chrome_path = Some(path);
    }
}
