//! # codehut-access
//!
//! Purchase accessibility resolver for the CodeHut snippet marketplace.
//!
//! Decides whether a user may view a snippet by combining:
//! - the free/paid business rule,
//! - a locally persisted allow-list of purchased snippets,
//! - a remote purchase authority queried under a fixed deadline.
//!
//! ## Example
//!
//! ```rust,no_run
//! use codehut_access::{AccessConfig, AccessResolver, Snippet};
//!
//! # async fn demo() -> codehut_access::Result<()> {
//! let resolver = AccessResolver::from_config(&AccessConfig::default())?;
//! let snippet = Snippet::new("snip-42", 4.99);
//!
//! if resolver.is_accessible(&snippet, Some("user-7")).await {
//!     println!("unlocked");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod access;
pub mod config;
pub mod error;

pub use access::{
    storage_key, AccessDecision, AccessResolver, AuthState, FileStore, HttpPurchaseAuthority,
    KeyValueStore, LocalPurchaseCache, MemoryStore, PurchaseAuthority, Snippet,
};
pub use config::{AccessConfig, AuthorityConfig};
pub use error::{Error, Result};
