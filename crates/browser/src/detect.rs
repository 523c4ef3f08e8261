//! Chromium detection and install guidance.

use std::path::PathBuf;

/// Executable names to search for in PATH. All of these speak CDP.
const CHROMIUM_EXECUTABLES: &[&str] = &[
    "chrome",
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "msedge",
    "microsoft-edge-stable",
    "brave-browser",
];

/// macOS app bundle paths, checked before PATH (PATH can contain broken
/// wrapper scripts).
#[cfg(target_os = "macos")]
const MACOS_APP_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

/// Result of browser detection.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub found: bool,
    /// Path to the executable (if found).
    pub path: Option<PathBuf>,
    /// Platform-specific install instructions (empty when found).
    pub install_hint: String,
}

impl DetectionResult {
    fn found_at(path: PathBuf) -> Self {
        Self {
            found: true,
            path: Some(path),
            install_hint: String::new(),
        }
    }
}

/// Detect a Chromium-based browser.
///
/// Checks, in order: explicit config path, the `CHROME` environment
/// variable, platform app paths, then known executable names in PATH.
pub fn detect_browser(custom_path: Option<&str>) -> DetectionResult {
    if let Some(path) = custom_path {
        let p = PathBuf::from(path);
        if p.exists() {
            return DetectionResult::found_at(p);
        }
    }

    if let Ok(path) = std::env::var("CHROME") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return DetectionResult::found_at(p);
        }
    }

    #[cfg(target_os = "macos")]
    for path in MACOS_APP_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return DetectionResult::found_at(p);
        }
    }

    for name in CHROMIUM_EXECUTABLES {
        if let Ok(path) = which::which(name) {
            return DetectionResult::found_at(path);
        }
    }

    DetectionResult {
        found: false,
        path: None,
        install_hint: install_instructions(),
    }
}

/// Platform-specific install instructions.
pub fn install_instructions() -> String {
    let instructions = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome"
    } else if cfg!(target_os = "linux") {
        "  Debian/Ubuntu: sudo apt install chromium-browser\n  \
         Fedora:         sudo dnf install chromium\n  \
         Arch:           sudo pacman -S chromium"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else {
        "  Download from https://www.google.com/chrome/"
    };

    format!(
        "No Chromium-based browser found. Install one:\n\n\
         {instructions}\n\n\
         Any Chromium-based browser works (Chrome, Chromium, Edge, Brave).\n\n\
         Or set [browser] chrome_path in cookiegate.toml, or the CHROME \
         environment variable."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_instructions_mention_chrome() {
        let hint = install_instructions();
        assert!(!hint.is_empty());
        assert!(hint.contains("Chrome") || hint.contains("chromium"));
    }

    #[test]
    fn custom_path_takes_precedence() {
        let temp_dir = std::env::temp_dir();
        let fake_browser = temp_dir.join("fake-chrome-for-cookiegate-test");
        std::fs::write(&fake_browser, "fake").unwrap();

        let result = detect_browser(fake_browser.to_str());
        assert!(result.found);
        assert_eq!(result.path.as_ref().unwrap(), &fake_browser);
        assert!(result.install_hint.is_empty());

        std::fs::remove_file(&fake_browser).unwrap();
    }

    #[test]
    fn invalid_custom_path_falls_through() {
        let result = detect_browser(Some("/nonexistent/path/to/chrome"));
        // Whether a browser is found depends on the test host; either way the
        // bogus path must not be reported back.
        assert_ne!(
            result.path.as_deref(),
            Some(std::path::Path::new("/nonexistent/path/to/chrome"))
        );
    }
}
