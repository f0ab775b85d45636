//! Connection-oriented KV client against an in-process RESP server.

mod common;

use common::{client, env, spawn_service, FakeRedis};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use view_counter::http::ViewCount;
use view_counter::resilience::ReconnectPolicy;
use view_counter::storage::kv::ConnectionKv;
use view_counter::storage::{KvClient, KvError};
use view_counter::ServiceConfig;

#[tokio::test]
async fn test_concurrent_first_use_opens_one_connection() {
    let redis = FakeRedis::start().await;
    let kv = Arc::new(ConnectionKv::open(&redis.url(), ReconnectPolicy::default()).unwrap());
    assert_eq!(redis.accepted(), 0);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let kv = kv.clone();
        handles.push(tokio::spawn(async move { kv.incr("views:race").await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(kv.get_count("views:race").await.unwrap(), Some(20));
    assert_eq!(redis.accepted(), 1);
    assert_eq!(kv.connections_opened(), 1);
}

#[tokio::test]
async fn test_reconnects_after_connection_drop() {
    let redis = FakeRedis::start().await;
    let kv = ConnectionKv::open(&redis.url(), ReconnectPolicy::default()).unwrap();

    assert_eq!(kv.incr("views:a").await.unwrap(), 1);
    redis.drop_connections().await;

    assert_eq!(kv.incr("views:a").await.unwrap(), 2);
    assert_eq!(redis.accepted(), 2);
    assert_eq!(kv.connections_opened(), 2);
}

#[tokio::test]
async fn test_gives_up_after_policy_attempts() {
    let policy = ReconnectPolicy::new(Duration::from_millis(5), Duration::from_millis(20), 3);
    let addr = common::closed_port().await;
    let kv = ConnectionKv::open(&format!("redis://{}", addr), policy).unwrap();

    let err = kv.get_count("views:a").await.unwrap_err();
    assert!(
        matches!(err, KvError::Disconnected { attempts: 3, .. }),
        "unexpected error: {}",
        err
    );
    assert_eq!(kv.connections_opened(), 0);
}

#[tokio::test]
async fn test_probe_key_is_cleaned_up() {
    let redis = FakeRedis::start().await;
    let kv = ConnectionKv::open(&redis.url(), ReconnectPolicy::default()).unwrap();

    kv.set_with_expiry("view-count-test", "test", 10).await.unwrap();
    assert_eq!(kv.get_string("view-count-test").await.unwrap().as_deref(), Some("test"));
    kv.delete("view-count-test").await.unwrap();
    assert_eq!(redis.value("view-count-test"), None);
}

#[tokio::test]
async fn test_service_counts_through_redis() {
    let redis = FakeRedis::start().await;
    let mut config = ServiceConfig::default();
    config.diagnostics.allow = true;
    let service = spawn_service(config, env(&[("REDIS_URL", &redis.url())])).await;
    let client = client();

    for expected in 1..=2 {
        let body: ViewCount = client
            .post(service.url("/views/hello"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body.views, expected);
    }
    assert_eq!(redis.value("views:hello").as_deref(), Some("2"));

    let body: Value = client
        .get(service.url("/views/debug"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["storage"]["type"], "networked-kv");
    assert_eq!(body["storage"]["degraded"], false);
    assert_eq!(body["storage"]["kv"]["client"], "connection");
    assert_eq!(body["storage"]["kv"]["accessible"], true);
    assert_eq!(body["storage"]["kv"]["env_vars"]["REDIS_URL"], true);
    assert_eq!(redis.value("view-count-test"), None);
    assert_eq!(redis.accepted(), 1);
}
