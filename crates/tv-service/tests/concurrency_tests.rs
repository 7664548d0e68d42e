//! Concurrency integration tests.
//!
//! N concurrent first-time verifications of the same token identifier must
//! converge on exactly one store record with one terminal decision, and the
//! attempt counter must equal N.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tv_service::services::{MockAuthority, TrustAuthority};
use tv_test_utils::TestTvServer;

/// Number of concurrent first-time presentations.
const CONCURRENT_CALLERS: usize = 16;

#[tokio::test]
async fn test_concurrent_first_time_verifications_converge() -> Result<(), anyhow::Error> {
    // The artificial authority latency keeps all callers in flight at once,
    // so every one of them misses the cache and races to commit.
    let authority = Arc::new(MockAuthority::accepting().with_delay(Duration::from_millis(50)));
    let server =
        TestTvServer::spawn_with_authority(Arc::clone(&authority) as Arc<dyn TrustAuthority>)
            .await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/tokens/verify", server.url());

    let requests = (0..CONCURRENT_CALLERS).map(|_| {
        let client = client.clone();
        let url = url.clone();
        async move {
            let response = client
                .post(&url)
                .json(&serde_json::json!({ "token": "abc123" }))
                .send()
                .await?;
            let status = response.status();
            let body: serde_json::Value = response.json().await?;
            Ok::<_, anyhow::Error>((status, body))
        }
    });

    let results = join_all(requests).await;

    let mut decisions = Vec::new();
    for result in results {
        let (status, body) = result?;
        assert_eq!(status, 200);
        assert_eq!(body["tokenId"], "abc123");
        decisions.push(body["decision"].as_str().unwrap_or_default().to_string());
    }

    // Every caller saw the same terminal decision.
    assert!(decisions.iter().all(|d| d == "valid"));

    // Exactly one record, with one attempt per caller.
    assert_eq!(server.store().len(), 1);
    let record = server.store().lookup("abc123").expect("record should exist");
    assert_eq!(record.attempts, CONCURRENT_CALLERS as u64);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_callers_with_conflicting_verdicts_settle_once() -> Result<(), anyhow::Error>
{
    // The authority alternates verdicts while callers race; whichever commit
    // lands first must be the answer every caller receives thereafter.
    let authority = Arc::new(
        MockAuthority::with_verdicts(vec![true, false]).with_delay(Duration::from_millis(30)),
    );
    let server =
        TestTvServer::spawn_with_authority(Arc::clone(&authority) as Arc<dyn TrustAuthority>)
            .await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/tokens/verify", server.url());

    let requests = (0..CONCURRENT_CALLERS).map(|_| {
        let client = client.clone();
        let url = url.clone();
        async move {
            let response = client
                .post(&url)
                .json(&serde_json::json!({ "token": "def456" }))
                .send()
                .await?;
            let body: serde_json::Value = response.json().await?;
            Ok::<_, anyhow::Error>(body)
        }
    });

    let results = join_all(requests).await;

    for result in results {
        let body = result?;
        assert!(matches!(
            body["decision"].as_str(),
            Some("valid") | Some("invalid")
        ));
    }

    // The record settled on exactly one decision and counted every attempt.
    assert_eq!(server.store().len(), 1);
    let record = server.store().lookup("def456").expect("record should exist");
    assert_eq!(record.attempts, CONCURRENT_CALLERS as u64);

    // Later presentations agree with the settled record.
    let response = client
        .post(&url)
        .json(&serde_json::json!({ "token": "def456" }))
        .send()
        .await?;
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["decision"], record.decision.as_str());

    Ok(())
}

#[tokio::test]
async fn test_concurrent_distinct_identifiers_do_not_interfere() -> Result<(), anyhow::Error> {
    let authority = Arc::new(MockAuthority::accepting().with_delay(Duration::from_millis(20)));
    let server =
        TestTvServer::spawn_with_authority(Arc::clone(&authority) as Arc<dyn TrustAuthority>)
            .await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/tokens/verify", server.url());

    let requests = (0..CONCURRENT_CALLERS).map(|i| {
        let client = client.clone();
        let url = url.clone();
        async move {
            let response = client
                .post(&url)
                .json(&serde_json::json!({ "token": format!("token-{i}") }))
                .send()
                .await?;
            let body: serde_json::Value = response.json().await?;
            Ok::<_, anyhow::Error>(body)
        }
    });

    for result in join_all(requests).await {
        let body = result?;
        assert_eq!(body["decision"], "valid");
    }

    assert_eq!(server.store().len(), CONCURRENT_CALLERS);
    for i in 0..CONCURRENT_CALLERS {
        let record = server
            .store()
            .lookup(&format!("token-{i}"))
            .expect("record should exist");
        assert_eq!(record.attempts, 1);
    }

    Ok(())
}
