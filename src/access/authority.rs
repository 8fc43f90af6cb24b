//! Remote purchase authority.
//!
//! The authority is the system of record for purchases. It is reached over
//! `GET {base}/api/purchases/check/{userId}/{snippetId}`, answering
//! `{ "hasPurchased": bool }` with a 2xx status. Anything else is an error,
//! which callers must read as "unknown", never as "not purchased".

use crate::config::AuthorityConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

/// Source of truth for purchase status.
#[async_trait]
pub trait PurchaseAuthority: Send + Sync {
    /// Ask whether `user_id` has purchased `snippet_id`.
    ///
    /// `deadline` is the instant after which the caller abandons the call.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or an
    /// undecodable body.
    async fn has_purchased(&self, user_id: &str, snippet_id: &str, deadline: Instant)
        -> Result<bool>;
}

/// Response body of the purchase check endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    /// Whether the purchase exists.
    pub has_purchased: bool,
}

/// HTTP client for the purchase check endpoint.
#[derive(Debug, Clone)]
pub struct HttpPurchaseAuthority {
    client: Client,
    base_url: Url,
}

impl HttpPurchaseAuthority {
    /// Create an authority client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails to build.
    pub fn new(config: &AuthorityConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid authority url {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "authority url {} cannot be a base",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.query_timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        debug!("Purchase authority at {base_url}");
        Ok(Self { client, base_url })
    }

    /// URL of the purchase check for a user/snippet pair.
    ///
    /// Ids are appended as percent-encoded path segments. Empty ids and the
    /// dot segments `.` and `..` cannot be addressed and are rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if an id is not a usable path segment or the base URL
    /// cannot carry path segments.
    pub fn check_url(&self, user_id: &str, snippet_id: &str) -> Result<Url> {
        if !is_plain_segment(user_id) {
            return Err(Error::InvalidIdentity(format!(
                "user id {user_id:?} is not a usable path segment"
            )));
        }
        if !is_plain_segment(snippet_id) {
            return Err(Error::InvalidSnippet(format!(
                "snippet id {snippet_id:?} is not a usable path segment"
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("authority url {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "purchases", "check", user_id, snippet_id]);
        Ok(url)
    }
}

fn is_plain_segment(id: &str) -> bool {
    !matches!(id, "" | "." | "..")
}

#[async_trait]
impl PurchaseAuthority for HttpPurchaseAuthority {
    async fn has_purchased(
        &self,
        user_id: &str,
        snippet_id: &str,
        deadline: Instant,
    ) -> Result<bool> {
        let url = self.check_url(user_id, snippet_id)?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        debug!("Checking purchase at {url} ({remaining:?} left)");

        let response = self.client.get(url).timeout(remaining).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Remote(format!(
                "purchase check for {user_id}/{snippet_id} returned {status}"
            )));
        }

        let body: CheckResponse = response.json().await?;
        Ok(body.has_purchased)
    }
}

/// Authority used when remote checks are disabled.
///
/// Every query is unknown, so decisions rest on the local cache alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAuthority;

#[async_trait]
impl PurchaseAuthority for OfflineAuthority {
    async fn has_purchased(
        &self,
        _user_id: &str,
        _snippet_id: &str,
        _deadline: Instant,
    ) -> Result<bool> {
        Err(Error::Remote("purchase authority disabled".to_string()))
    }
}
