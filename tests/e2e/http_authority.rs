//! HTTP purchase authority against the stub API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::refused_base_url;
use super::{StubAuthority, StubBehavior};
use codehut_access::{AuthorityConfig, Error, HttpPurchaseAuthority, PurchaseAuthority};
use std::time::Duration;
use tokio::time::Instant;

fn authority_for(base_url: &str) -> HttpPurchaseAuthority {
    HttpPurchaseAuthority::new(&AuthorityConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    })
    .expect("should create")
}

fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

#[tokio::test]
async fn test_purchased_true() {
    let stub = StubAuthority::start(StubBehavior::purchased(true))
        .await
        .expect("stub");
    let authority = authority_for(stub.base_url());

    let purchased = authority
        .has_purchased("user-1", "snip-1", deadline())
        .await
        .expect("should succeed");

    assert!(purchased);
    assert_eq!(
        stub.requests(),
        vec!["/api/purchases/check/user-1/snip-1".to_string()]
    );
}

#[tokio::test]
async fn test_purchased_false() {
    let stub = StubAuthority::start(StubBehavior::purchased(false))
        .await
        .expect("stub");
    let authority = authority_for(stub.base_url());

    let purchased = authority
        .has_purchased("user-1", "snip-1", deadline())
        .await
        .expect("should succeed");

    assert!(!purchased);
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    for status in [401, 404, 500, 503] {
        let stub = StubAuthority::start(StubBehavior::status(status))
            .await
            .expect("stub");
        let authority = authority_for(stub.base_url());

        let result = authority.has_purchased("user-1", "snip-1", deadline()).await;
        assert!(
            matches!(result, Err(Error::Remote(_))),
            "status {status} should be unknown, got {result:?}"
        );
    }
}

#[tokio::test]
async fn test_malformed_body_is_an_error() {
    let stub = StubAuthority::start(StubBehavior::Respond {
        status: 200,
        body: "<html>maintenance</html>".to_string(),
    })
    .await
    .expect("stub");
    let authority = authority_for(stub.base_url());

    let result = authority.has_purchased("user-1", "snip-1", deadline()).await;
    assert!(matches!(result, Err(Error::Remote(_))));
}

#[tokio::test]
async fn test_connection_refused_is_an_error() {
    let base_url = refused_base_url().await.expect("port");
    let authority = authority_for(&base_url);

    let result = authority.has_purchased("user-1", "snip-1", deadline()).await;
    assert!(matches!(result, Err(Error::Remote(_))));
}

#[tokio::test]
async fn test_request_honours_deadline() {
    let stub = StubAuthority::start(StubBehavior::Hang).await.expect("stub");
    let authority = authority_for(stub.base_url());

    let started = Instant::now();
    let result = authority
        .has_purchased("user-1", "snip-1", Instant::now() + Duration::from_millis(200))
        .await;

    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(3));
}
