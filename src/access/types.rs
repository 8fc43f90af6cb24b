//! Snippet and identity types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A marketplace snippet as seen by the access check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Snippet identifier.
    pub id: String,
    /// Price in the smallest currency unit or as a decimal. Zero means free.
    pub price: f64,
}

impl Snippet {
    /// Create a snippet.
    #[must_use]
    pub fn new(id: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            price,
        }
    }

    /// Returns true if the snippet costs nothing.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_free(&self) -> bool {
        self.price == 0.0
    }

    /// Check that the snippet can be evaluated as a paid item.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnippet`] for an empty id or a negative or
    /// non-finite price.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidSnippet("empty snippet id".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::InvalidSnippet(format!(
                "snippet {} has invalid price {}",
                self.id, self.price
            )));
        }
        Ok(())
    }
}

/// State of the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Identity resolution is still in flight.
    #[default]
    Loading,
    /// Resolution finished with no signed-in user.
    Anonymous,
    /// A user is signed in.
    SignedIn(String),
}

impl AuthState {
    /// The settled user reference, or `None` while still loading.
    ///
    /// The inner `Option` distinguishes an anonymous visitor from a signed-in user.
    #[must_use]
    pub fn settled_user(&self) -> Option<Option<&str>> {
        match self {
            Self::Loading => None,
            Self::Anonymous => Some(None),
            Self::SignedIn(user_id) => Some(Some(user_id.as_str())),
        }
    }
}
