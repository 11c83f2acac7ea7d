//! The signed-in identity that account-scoped data belongs to.

use serde::{Deserialize, Serialize};

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable account id; every stored row is scoped to it.
    pub id: String,
    /// Sign-in email, if known.
    pub email: Option<String>,
}

impl UserIdentity {
    /// Create an identity.
    #[must_use]
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }

    /// Name to greet the user with when no profile name is set.
    #[must_use]
    pub fn fallback_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}
