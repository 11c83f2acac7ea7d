//! Hand-off channels.
//!
//! A hand-off passes the emergency message to something outside this
//! process: a chat-app deep link, the native share sheet, an SMS or email
//! compose screen, or the clipboard. None of them confirm delivery; each
//! only reports whether the host accepted the request.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use thiserror::Error;

/// Characters left unescaped by URI component encoding.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Errors reported by a hand-off channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandoffError {
    /// The host has no such channel.
    #[error("{0} is not supported on this device")]
    Unsupported(&'static str),

    /// The user or host refused the request.
    #[error("{0} was denied")]
    Denied(String),

    /// The request failed for another reason.
    #[error("{0}")]
    Failed(String),
}

/// Result type for hand-off operations.
pub type HandoffResult<T> = std::result::Result<T, HandoffError>;

/// What happened when a new browsing context was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    /// A context opened and is still open.
    Opened,
    /// A context opened but was closed straight away.
    ClosedImmediately,
    /// No context was created (blocked or no handler).
    Blocked,
}

impl WindowOutcome {
    /// The only outcome treated as a successful deep link.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Opened)
    }
}

/// A mechanism for delivering the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Chat-app deep link.
    DeepLink,
    /// Native share sheet.
    NativeShare,
    /// SMS compose screen.
    Sms,
    /// Email compose screen.
    Email,
    /// Clipboard copy for manual forwarding.
    Clipboard,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeepLink => write!(f, "deep_link"),
            Self::NativeShare => write!(f, "native_share"),
            Self::Sms => write!(f, "sms"),
            Self::Email => write!(f, "email"),
            Self::Clipboard => write!(f, "clipboard"),
        }
    }
}

/// Host services used to hand messages off.
#[async_trait::async_trait]
pub trait Handoff: Send + Sync {
    /// Open `url` in a new browsing context.
    ///
    /// # Errors
    ///
    /// Returns an error if the host raised one while opening.
    async fn open_window(&self, url: &str) -> HandoffResult<WindowOutcome>;

    /// Whether a native share sheet exists.
    fn can_share(&self) -> bool;

    /// Present the native share sheet.
    ///
    /// # Errors
    ///
    /// Returns an error if sharing is unsupported, cancelled or failed.
    async fn share(&self, title: &str, text: &str) -> HandoffResult<()>;

    /// Navigate the current context to `url` (`sms:`, `mailto:`, `tel:`).
    ///
    /// # Errors
    ///
    /// Returns an error if the host could not hand the URL on.
    async fn navigate(&self, url: &str) -> HandoffResult<()>;

    /// Replace the clipboard contents.
    ///
    /// # Errors
    ///
    /// Returns an error if clipboard access is denied or unavailable.
    async fn write_clipboard(&self, text: &str) -> HandoffResult<()>;
}

/// Percent-encode a URI component.
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Chat-app deep links for `dial_string`, in the order they are tried:
/// native scheme, two public web variants, then the desktop web client.
#[must_use]
pub fn deep_link_urls(dial_string: &str, message: &str) -> [String; 4] {
    let text = encode_component(message);
    [
        format!("whatsapp://send?phone={dial_string}&text={text}"),
        format!("https://wa.me/{dial_string}?text={text}"),
        format!("https://api.whatsapp.com/send?phone={dial_string}&text={text}"),
        format!("https://web.whatsapp.com/send?phone={dial_string}&text={text}"),
    ]
}

/// SMS compose link. iOS separates the body with `&`, everyone else with `?`.
#[must_use]
pub fn sms_url(dial_string: &str, message: &str, ios: bool) -> String {
    let body = encode_component(message);
    let separator = if ios { '&' } else { '?' };
    format!("sms:{dial_string}{separator}body={body}")
}

/// Email compose link with no recipient.
#[must_use]
pub fn mailto_url(subject: &str, body: &str) -> String {
    format!(
        "mailto:?subject={}&body={}",
        encode_component(subject),
        encode_component(body)
    )
}

/// Dialler link.
#[must_use]
pub fn tel_url(number: &str) -> String {
    format!("tel:{number}")
}
