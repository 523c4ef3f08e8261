//! Headless Chromium collaborator for cookie extraction.
//!
//! The gateway talks to this crate through the [`CookieSource`] seam: one
//! call visits the target site in a fresh browser and returns its cookie set.
//! Each fetch owns its browser exclusively and releases it on every exit
//! path (success, navigation failure, timeout).

pub mod detect;
pub mod error;
pub mod session;
pub mod source;

pub use {
    error::BrowserError,
    session::BrowserSession,
    source::{CookieSource, HeadlessChromeSource},
};
