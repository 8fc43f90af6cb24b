//! Access resolver combining the free rule, the local cache and the remote authority.
//!
//! This is the core of codehut-access.

use crate::access::authority::{HttpPurchaseAuthority, OfflineAuthority, PurchaseAuthority};
use crate::access::cache::LocalPurchaseCache;
use crate::access::store::FileStore;
use crate::access::types::{AuthState, Snippet};
use crate::config::AccessConfig;
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Deadline used when the configured timeout overflows the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365);

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Snippet is free.
    Free,
    /// Paid snippet and no signed-in user.
    AnonymousDenied,
    /// Found in the local purchase cache, no remote call made.
    CachedPurchase,
    /// The remote authority confirmed the purchase.
    RemotePurchase,
    /// The authority said not purchased, but the cache was written meanwhile.
    CachedAfterRemoteMiss,
    /// The authority was unreachable and the cache holds the purchase.
    CachedAfterRemoteFailure,
    /// Neither the authority nor the cache know of a purchase.
    NotPurchased,
    /// An internal fault occurred while checking a paid snippet.
    FaultDenied,
}

impl AccessDecision {
    /// Returns true if the snippet may be shown without further payment.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        matches!(
            self,
            Self::Free
                | Self::CachedPurchase
                | Self::RemotePurchase
                | Self::CachedAfterRemoteMiss
                | Self::CachedAfterRemoteFailure
        )
    }

    /// Returns true if the decision was reached through the local cache.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        matches!(
            self,
            Self::CachedPurchase | Self::CachedAfterRemoteMiss | Self::CachedAfterRemoteFailure
        )
    }

    /// Short machine-readable label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::AnonymousDenied => "anonymous-denied",
            Self::CachedPurchase => "cached-purchase",
            Self::RemotePurchase => "remote-purchase",
            Self::CachedAfterRemoteMiss => "cached-after-remote-miss",
            Self::CachedAfterRemoteFailure => "cached-after-remote-failure",
            Self::NotPurchased => "not-purchased",
            Self::FaultDenied => "fault-denied",
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether users may access snippets.
///
/// Combines:
/// 1. The free rule (price zero)
/// 2. The local purchase cache as a latency-free allow-list
/// 3. The remote purchase authority, bounded by a deadline
///
/// Checks never fail: faults are logged and resolve to a deny.
#[derive(Clone)]
pub struct AccessResolver {
    /// Local allow-list of purchases.
    cache: LocalPurchaseCache,
    /// System of record.
    authority: Arc<dyn PurchaseAuthority>,
    /// Deadline for one remote check.
    query_timeout: Duration,
}

impl AccessResolver {
    /// Create a resolver from its parts.
    #[must_use]
    pub fn new(
        cache: LocalPurchaseCache,
        authority: Arc<dyn PurchaseAuthority>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            authority,
            query_timeout,
        }
    }

    /// Create a resolver backed by the on-disk store and, if enabled, the
    /// HTTP authority.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is out of range or the
    /// authority client cannot be built.
    pub fn from_config(config: &AccessConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(FileStore::new(config.store_dir()));
        let cache = LocalPurchaseCache::new(store);

        let authority: Arc<dyn PurchaseAuthority> = if config.authority.enabled {
            Arc::new(HttpPurchaseAuthority::new(&config.authority)?)
        } else {
            info!("Purchase authority disabled - using local cache only");
            Arc::new(OfflineAuthority)
        };

        info!(
            "Access resolver initialized (store={}, authority_enabled={}, timeout={:?})",
            config.store_dir().display(),
            config.authority.enabled,
            config.authority.query_timeout()
        );

        Ok(Self::new(cache, authority, config.authority.query_timeout()))
    }

    /// Check whether `user` may access `snippet`.
    pub async fn is_accessible(&self, snippet: &Snippet, user: Option<&str>) -> bool {
        self.resolve(snippet, user).await.is_accessible()
    }

    /// Resolve access to `snippet` for `user`, returning the detailed outcome.
    ///
    /// # Returns
    ///
    /// * `Free` - price is zero, whoever asks
    /// * `AnonymousDenied` - paid snippet, no user
    /// * `CachedPurchase` - found locally, the authority is not contacted
    /// * `RemotePurchase` - the authority confirmed the purchase
    /// * `CachedAfterRemoteMiss` / `CachedAfterRemoteFailure` - cache re-check
    ///   after a negative or failed remote answer found the purchase
    /// * `NotPurchased` - nobody knows of a purchase
    /// * `FaultDenied` - malformed snippet or unreadable cache
    pub async fn resolve(&self, snippet: &Snippet, user: Option<&str>) -> AccessDecision {
        match self.try_resolve(snippet, user).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Access check for snippet {:?} failed, denying: {e}", snippet.id);
                AccessDecision::FaultDenied
            }
        }
    }

    /// Resolve access using the authentication collaborator's state.
    ///
    /// Returns `None` while identity resolution is still in flight; callers
    /// should retry once it settles.
    pub async fn resolve_for_session(
        &self,
        snippet: &Snippet,
        auth: &AuthState,
    ) -> Option<AccessDecision> {
        let Some(user) = auth.settled_user() else {
            debug!("Identity still loading, deferring access check for {}", snippet.id);
            return None;
        };
        Some(self.resolve(snippet, user).await)
    }

    /// Record a completed purchase in the local cache.
    ///
    /// Called by the payment flow. Returns `true` if the purchase was new.
    ///
    /// # Errors
    ///
    /// Returns an error if the ids are empty or the store cannot be written.
    pub fn record_local_purchase(&self, snippet_id: &str, user_id: &str) -> Result<bool> {
        self.cache.record(snippet_id, user_id)
    }

    /// Get the local purchase cache.
    #[must_use]
    pub fn cache(&self) -> &LocalPurchaseCache {
        &self.cache
    }

    /// Get the remote query deadline.
    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    async fn try_resolve(&self, snippet: &Snippet, user: Option<&str>) -> Result<AccessDecision> {
        if snippet.is_free() {
            return Ok(AccessDecision::Free);
        }
        snippet.validate()?;

        let Some(user_id) = user.filter(|id| !id.trim().is_empty()) else {
            debug!("No user for paid snippet {}", snippet.id);
            return Ok(AccessDecision::AnonymousDenied);
        };

        // Fast path: no network latency for a purchase already known locally
        if self.cache.contains(user_id, &snippet.id)? {
            return Ok(AccessDecision::CachedPurchase);
        }

        match self.query_authority(user_id, &snippet.id).await {
            Ok(true) => {
                info!("Authority confirmed purchase {user_id}/{}", snippet.id);
                Ok(AccessDecision::RemotePurchase)
            }
            Ok(false) => {
                // The payment flow may have written the cache while we waited
                if self.cache.contains(user_id, &snippet.id)? {
                    Ok(AccessDecision::CachedAfterRemoteMiss)
                } else {
                    Ok(AccessDecision::NotPurchased)
                }
            }
            Err(e) => {
                warn!(
                    "Purchase authority unavailable for {user_id}/{}: {e}",
                    snippet.id
                );
                if self.cache.contains(user_id, &snippet.id)? {
                    Ok(AccessDecision::CachedAfterRemoteFailure)
                } else {
                    Ok(AccessDecision::NotPurchased)
                }
            }
        }
    }

    /// Single remote attempt raced against the deadline. A call still pending
    /// at the deadline is dropped and reported as [`Error::Timeout`].
    async fn query_authority(&self, user_id: &str, snippet_id: &str) -> Result<bool> {
        let now = Instant::now();
        let deadline = now
            .checked_add(self.query_timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let call = self.authority.has_purchased(user_id, snippet_id, deadline);

        match tokio::time::timeout_at(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.query_timeout)),
        }
    }
}
