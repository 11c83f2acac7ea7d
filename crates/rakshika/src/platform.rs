//! Device classification from an identification string.
//!
//! Mirrors how a browser's user agent is sniffed: three independent,
//! case-insensitive predicates, recomputed on every call.

use std::sync::LazyLock;

use regex::Regex;

static MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
        .expect("mobile pattern is valid")
});

static IOS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)iPhone|iPad|iPod").expect("iOS pattern is valid"));

static ANDROID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Android").expect("Android pattern is valid"));

/// True for any of the known mobile operating systems.
#[must_use]
pub fn is_mobile(user_agent: &str) -> bool {
    MOBILE.is_match(user_agent)
}

/// True for iPhone, iPad and iPod.
#[must_use]
pub fn is_ios(user_agent: &str) -> bool {
    IOS.is_match(user_agent)
}

/// True for Android devices.
#[must_use]
pub fn is_android(user_agent: &str) -> bool {
    ANDROID.is_match(user_agent)
}

/// The identification string of the current host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    user_agent: String,
}

impl Platform {
    /// Wrap an identification string.
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    /// The raw identification string.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// See [`is_mobile`].
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        is_mobile(&self.user_agent)
    }

    /// See [`is_ios`].
    #[must_use]
    pub fn is_ios(&self) -> bool {
        is_ios(&self.user_agent)
    }

    /// See [`is_android`].
    #[must_use]
    pub fn is_android(&self) -> bool {
        is_android(&self.user_agent)
    }

    /// Short label for status output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        if self.is_ios() {
            "iOS"
        } else if self.is_android() {
            "Android"
        } else if self.is_mobile() {
            "mobile"
        } else {
            "desktop"
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new(rakshika_desktop::default_user_agent())
    }
}
