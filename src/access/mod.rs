//! Purchase accessibility for CodeHut snippets.
//!
//! This module implements the access strategy:
//! 1. Free snippets are always accessible
//! 2. Paid snippets need a signed-in user who has bought them, known either
//!    from the local purchase cache or from the remote purchase authority
//!
//! # Architecture
//!
//! ```text
//! is_accessible(snippet, user)
//!        │
//!        ▼
//!   price == 0 ? ──yes──► ALLOW
//!        │ no
//!        ▼
//!   user present ? ──no──► DENY
//!        │ yes
//!        ▼
//! ┌─────────────────────┐
//! │ Check local cache   │
//! └─────────┬───────────┘
//!           │
//!    ┌──────┴──────┐
//!    │             │
//!   HIT          MISS
//!    │             │
//!    ▼             ▼
//!  ALLOW     Query authority (deadline)
//!                  │
//!        ┌─────────┼──────────────┐
//!        │         │              │
//!    PURCHASED  NOT PURCHASED  UNKNOWN (timeout, non-2xx, transport)
//!        │         │              │
//!        ▼         └──────┬───────┘
//!      ALLOW              ▼
//!                 Re-check local cache
//! ```
//!
//! Any internal fault while evaluating a paid snippet resolves to DENY.

mod authority;
mod cache;
mod resolver;
mod store;
mod types;

pub use authority::{CheckResponse, HttpPurchaseAuthority, OfflineAuthority, PurchaseAuthority};
pub use cache::{storage_key, CacheStats, LocalPurchaseCache};
pub use resolver::{AccessDecision, AccessResolver};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{AuthState, Snippet};
