//! Desktop host primitives for rakshika.
//!
//! This crate provides the operating-system facilities the safety toolkit
//! hands work off to when it runs outside a browser: the system clipboard,
//! the default URL opener (deep links, `sms:`, `mailto:` and `tel:` URIs)
//! and an audible terminal alarm.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod alarm;
pub mod clipboard;
pub mod opener;

use thiserror::Error;

pub use alarm::TerminalAlarm;
pub use clipboard::SystemClipboard;
pub use opener::open_url;

/// Errors raised by desktop host primitives.
#[derive(Debug, Error)]
pub enum DesktopError {
    /// Failed to access the clipboard.
    #[error("clipboard access failed: {0}")]
    Clipboard(String),

    /// The system opener could not be launched.
    #[error("failed to open {url}: {message}")]
    Open {
        /// The URL that was being opened.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The system opener exited immediately with a failure status.
    #[error("opener rejected {url} with status {status}")]
    OpenerRejected {
        /// The URL that was being opened.
        url: String,
        /// Exit status reported by the opener.
        status: i32,
    },
}

/// Result type for desktop operations.
pub type Result<T> = std::result::Result<T, DesktopError>;

/// Initialize desktop host components.
///
/// # Errors
///
/// Returns an error if initialization fails.
pub fn init() -> Result<()> {
    tracing::info!(platform = platform_name(), "Initializing desktop host");
    Ok(())
}

/// Get the platform name.
#[must_use]
pub fn platform_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "macOS"
    } else if cfg!(target_os = "windows") {
        "Windows"
    } else if cfg!(target_os = "linux") {
        "Linux"
    } else {
        "Unknown"
    }
}

/// Identification string reported for this host when none is configured.
///
/// Desktop hosts report a desktop browser-style string so that the mobile
/// predicates stay false.
#[must_use]
pub fn default_user_agent() -> &'static str {
    if cfg!(target_os = "macos") {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) rakshika"
    } else if cfg!(target_os = "windows") {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) rakshika"
    } else {
        "Mozilla/5.0 (X11; Linux x86_64) rakshika"
    }
}
