//! Full resolver flow: file-backed cache plus HTTP authority.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::refused_base_url;
use super::{StubAuthority, StubBehavior};
use codehut_access::config::STORE_DIR_NAME;
use codehut_access::{
    storage_key, AccessConfig, AccessDecision, AccessResolver, AuthorityConfig, FileStore,
    HttpPurchaseAuthority, LocalPurchaseCache, Snippet,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn config(data_dir: &Path, base_url: &str) -> AccessConfig {
    AccessConfig {
        data_dir: data_dir.to_path_buf(),
        authority: AuthorityConfig {
            enabled: true,
            base_url: base_url.to_string(),
            query_timeout_secs: 5,
        },
        log_level: "debug".to_string(),
    }
}

/// Resolver over the on-disk store with a sub-second deadline.
fn fast_resolver(data_dir: &Path, base_url: &str) -> AccessResolver {
    let config = config(data_dir, base_url);
    let cache = LocalPurchaseCache::new(Arc::new(FileStore::new(config.store_dir())));
    let authority = HttpPurchaseAuthority::new(&config.authority).expect("authority");
    AccessResolver::new(cache, Arc::new(authority), Duration::from_millis(300))
}

fn paid() -> Snippet {
    Snippet::new("snip-1", 19.0)
}

#[tokio::test]
async fn test_remote_purchase_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let stub = StubAuthority::start(StubBehavior::purchased(true))
        .await
        .expect("stub");
    let resolver =
        AccessResolver::from_config(&config(dir.path(), stub.base_url())).expect("resolver");

    assert_eq!(
        resolver.resolve(&paid(), Some("user-1")).await,
        AccessDecision::RemotePurchase
    );
    assert_eq!(stub.requests().len(), 1);
    // Resolver never writes the cache itself
    assert!(!dir.path().join(STORE_DIR_NAME).exists());
}

#[tokio::test]
async fn test_recorded_purchase_skips_authority() {
    let dir = tempfile::tempdir().expect("tempdir");
    let stub = StubAuthority::start(StubBehavior::Hang).await.expect("stub");
    let resolver =
        AccessResolver::from_config(&config(dir.path(), stub.base_url())).expect("resolver");

    resolver
        .record_local_purchase("snip-1", "user-1")
        .expect("record");

    let decision = tokio::time::timeout(
        Duration::from_secs(1),
        resolver.resolve(&paid(), Some("user-1")),
    )
    .await
    .expect("must not wait on the authority");

    assert_eq!(decision, AccessDecision::CachedPurchase);
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_timeout_with_empty_cache_is_locked() {
    let dir = tempfile::tempdir().expect("tempdir");
    let stub = StubAuthority::start(StubBehavior::Hang).await.expect("stub");
    let resolver = fast_resolver(dir.path(), stub.base_url());

    assert!(!resolver.is_accessible(&paid(), Some("user-1")).await);
}

#[tokio::test]
async fn test_server_error_falls_back_to_cache() {
    let dir = tempfile::tempdir().expect("tempdir");
    let stub = StubAuthority::start(StubBehavior::status(500))
        .await
        .expect("stub");
    let resolver = fast_resolver(dir.path(), stub.base_url());

    assert_eq!(
        resolver.resolve(&paid(), Some("user-1")).await,
        AccessDecision::NotPurchased
    );

    // Another process (the payment flow) records the purchase in the same store
    let writer = LocalPurchaseCache::new(Arc::new(FileStore::new(
        dir.path().join(STORE_DIR_NAME),
    )));
    writer.record("snip-1", "user-1").expect("record");

    assert_eq!(
        resolver.resolve(&paid(), Some("user-1")).await,
        AccessDecision::CachedPurchase
    );
}

#[tokio::test]
async fn test_unreachable_authority_never_allows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_url = refused_base_url().await.expect("port");
    let resolver = fast_resolver(dir.path(), &base_url);

    assert!(!resolver.is_accessible(&paid(), Some("user-1")).await);
    assert!(resolver.is_accessible(&Snippet::new("snip-free", 0.0), None).await);
}

#[tokio::test]
async fn test_unreadable_store_denies() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::new(dir.path().join(STORE_DIR_NAME));
    std::fs::create_dir_all(store.key_path(&storage_key("user-1"))).expect("mkdir");
    let stub = StubAuthority::start(StubBehavior::purchased(true))
        .await
        .expect("stub");
    let resolver = fast_resolver(dir.path(), stub.base_url());

    assert_eq!(
        resolver.resolve(&paid(), Some("user-1")).await,
        AccessDecision::FaultDenied
    );
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_offline_mode_uses_cache_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = config(dir.path(), "http://127.0.0.1:9");
    config.authority.enabled = false;
    let resolver = AccessResolver::from_config(&config).expect("resolver");

    assert!(!resolver.is_accessible(&paid(), Some("user-1")).await);

    resolver
        .record_local_purchase("snip-1", "user-1")
        .expect("record");
    resolver
        .record_local_purchase("snip-1", "user-1")
        .expect("record");

    assert!(resolver.is_accessible(&paid(), Some("user-1")).await);
    assert_eq!(
        resolver.cache().purchased("user-1").expect("read"),
        vec!["snip-1".to_string()]
    );
}

#[tokio::test]
async fn test_writers_for_different_users_do_not_clobber() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store_dir = dir.path().join(STORE_DIR_NAME);

    let writers: Vec<_> = ["user-1", "user-2"]
        .into_iter()
        .map(|user| {
            let cache = LocalPurchaseCache::new(Arc::new(FileStore::new(store_dir.clone())));
            std::thread::spawn(move || {
                for i in 0..20 {
                    cache.record(&format!("snip-{i}"), user).expect("record");
                }
            })
        })
        .collect();
    for handle in writers {
        handle.join().expect("writer thread");
    }

    let reader = LocalPurchaseCache::new(Arc::new(FileStore::new(store_dir)));
    for user in ["user-1", "user-2"] {
        assert_eq!(reader.purchased(user).expect("read").len(), 20, "{user}");
    }
}

#[tokio::test]
async fn test_dot_segment_user_never_reaches_authority() {
    let dir = tempfile::tempdir().expect("tempdir");
    let stub = StubAuthority::start(StubBehavior::purchased(true))
        .await
        .expect("stub");
    let resolver = fast_resolver(dir.path(), stub.base_url());

    assert_eq!(
        resolver.resolve(&paid(), Some("..")).await,
        AccessDecision::NotPurchased
    );
    assert!(stub.requests().is_empty());
}
