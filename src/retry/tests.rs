//! Tests for the retry orchestrator

use super::*;
use crate::classify::StatusTable;
use crate::config::GateConfig;
use crate::error::{Error, Result};
use crate::http::{RateLimitSnapshot, Request, Response, Transport};
use crate::metrics::{self, MemoryMetrics};
use crate::ratelimit::RateLimitGate;
use crate::store::{KeyValueStore, MemoryStore};
use crate::types::AccountId;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Transport that replays a fixed script of outcomes, then repeats the last
struct ScriptedTransport {
    script: Mutex<VecDeque<fn() -> Result<Response>>>,
    last: fn() -> Result<Response>,
    attempts: AtomicUsize,
}

impl ScriptedTransport {
    fn new(script: Vec<fn() -> Result<Response>>) -> Arc<Self> {
        let last = *script.last().expect("script must not be empty");
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last,
            attempts: AtomicUsize::new(0),
        })
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _request: &Request) -> Result<Response> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front().unwrap_or(self.last);
        next()
    }
}

/// Store whose every call fails
struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::store("connection refused"))
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Err(Error::store("connection refused"))
    }

    async fn increment_field(&self, _map: &str, _field: &str, _delta: i64) -> Result<i64> {
        Err(Error::store("connection refused"))
    }

    async fn set_field(&self, _map: &str, _field: &str, _value: &str) -> Result<()> {
        Err(Error::store("connection refused"))
    }

    async fn get_field(&self, _map: &str, _field: &str) -> Result<Option<String>> {
        Err(Error::store("connection refused"))
    }
}

fn ok() -> Result<Response> {
    Ok(Response {
        rate_limit: RateLimitSnapshot::new(500.0, 100, 300),
        body: Bytes::from_static(b"{}"),
    })
}

fn ok_low_quota() -> Result<Response> {
    Ok(Response {
        rate_limit: RateLimitSnapshot::new(3.0, 597, 60),
        body: Bytes::from_static(b"{}"),
    })
}

fn timeout() -> Result<Response> {
    Err(Error::Timeout)
}

fn bad_request() -> Result<Response> {
    Err(Error::server(400))
}

struct Harness {
    orchestrator: Orchestrator,
    transport: Arc<ScriptedTransport>,
    store: MemoryStore,
    metrics: MemoryMetrics,
}

fn harness(script: Vec<fn() -> Result<Response>>) -> Harness {
    let store = MemoryStore::new();
    let metrics = MemoryMetrics::new();
    let transport = ScriptedTransport::new(script);
    let gate = RateLimitGate::new(
        Arc::new(store.clone()),
        Arc::new(metrics.clone()),
        GateConfig::default(),
    );
    let orchestrator = Orchestrator::new(
        transport.clone(),
        gate,
        Arc::new(metrics.clone()),
        BackoffSchedule::default(),
    );
    Harness {
        orchestrator,
        transport,
        store,
        metrics,
    }
}

fn request() -> Request {
    Request::new(AccountId::new("t2_user"), "https://oauth.reddit.com/api/v1/me")
}

#[test]
fn test_default_schedule() {
    let schedule = BackoffSchedule::default();
    assert_eq!(
        schedule.iter().collect::<Vec<_>>(),
        vec![
            Duration::from_secs(4),
            Duration::from_secs(8),
            Duration::from_secs(16)
        ]
    );
    assert_eq!(schedule.max_attempts(), 4);
    assert_eq!(schedule.total(), Duration::from_secs(28));
    assert_eq!(BackoffSchedule::none().max_attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_success_on_first_attempt() {
    let h = harness(vec![ok]);
    let start = Instant::now();

    h.orchestrator.execute(&request(), None).await.unwrap();

    assert_eq!(h.transport.attempts(), 1);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(h.metrics.count(metrics::API_RETRIES), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stops_on_first_success() {
    let h = harness(vec![timeout, ok]);
    let start = Instant::now();

    h.orchestrator.execute(&request(), None).await.unwrap();

    assert_eq!(h.transport.attempts(), 2);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    assert_eq!(h.metrics.count(metrics::API_RETRIES), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausts_schedule() {
    let h = harness(vec![timeout]);
    let start = Instant::now();

    let err = h.orchestrator.execute(&request(), None).await.unwrap_err();

    assert!(matches!(err, Error::Timeout));
    assert_eq!(h.transport.attempts(), 4);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(28) && elapsed < Duration::from_secs(29));
    assert_eq!(h.metrics.count(metrics::API_RETRIES), 3);
    assert_eq!(h.metrics.count(metrics::API_ERRORS), 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_retry_when_not_requested() {
    let h = harness(vec![timeout, ok]);

    let err = h
        .orchestrator
        .execute(&request().retry(false), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout));
    assert_eq!(h.transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_revoked_credential_not_retried() {
    let h = harness(vec![bad_request, ok]);
    let req = request().classification(StatusTable::token_refresh());

    let err = h.orchestrator.execute(&req, None).await.unwrap_err();

    assert!(matches!(err, Error::OauthRevoked));
    assert_eq!(h.transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_plain_400_is_server_error_and_retried() {
    let h = harness(vec![bad_request, ok]);

    h.orchestrator.execute(&request(), None).await.unwrap();

    assert_eq!(h.transport.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_throttled_account_never_sends() {
    let h = harness(vec![ok_low_quota, ok]);

    h.orchestrator.execute(&request(), None).await.unwrap();
    assert_eq!(h.transport.attempts(), 1);

    let err = h.orchestrator.execute(&request(), None).await.unwrap_err();
    assert!(matches!(err, Error::RateLimited));
    assert_eq!(h.transport.attempts(), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    h.orchestrator.execute(&request(), None).await.unwrap();
    assert_eq!(h.transport.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_bypass_account_skips_bookkeeping() {
    let h = harness(vec![ok_low_quota]);
    let req = Request::new(AccountId::bypass(), "https://www.reddit.com/x");

    h.orchestrator.execute(&req, None).await.unwrap();
    h.orchestrator.execute(&req, None).await.unwrap();

    assert_eq!(h.transport.attempts(), 2);
    assert!(h.store.is_empty());
    assert_eq!(
        h.orchestrator
            .gate()
            .request_count(&AccountId::bypass())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_counts_every_attempt() {
    let h = harness(vec![timeout, timeout, ok]);
    let req = request();

    h.orchestrator.execute(&req, None).await.unwrap();

    assert_eq!(
        h.orchestrator.gate().request_count(&req.account).await.unwrap(),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_backoff() {
    let h = harness(vec![timeout, ok]);
    let token = CancellationToken::new();

    let orchestrator = h.orchestrator.clone();
    let child = token.clone();
    let task = tokio::spawn(async move { orchestrator.execute(&request(), Some(&child)).await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    token.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(h.transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_already_cancelled_never_sends() {
    let h = harness(vec![ok]);
    let token = CancellationToken::new();
    token.cancel();

    let err = h
        .orchestrator
        .execute(&request(), Some(&token))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(h.transport.attempts(), 0);
    assert_eq!(
        h.orchestrator
            .gate()
            .request_count(&AccountId::new("t2_user"))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_store_outage_fails_closed_without_sending() {
    let transport = ScriptedTransport::new(vec![ok]);
    let metrics = MemoryMetrics::new();
    let gate = RateLimitGate::new(
        Arc::new(UnavailableStore),
        Arc::new(metrics.clone()),
        GateConfig::default(),
    );
    let orchestrator = Orchestrator::new(
        transport.clone(),
        gate,
        Arc::new(metrics),
        BackoffSchedule::default(),
    );

    let err = orchestrator.execute(&request(), None).await.unwrap_err();

    assert!(matches!(err, Error::StoreUnavailable { .. }));
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_does_not_block_other_requests() {
    let h = harness(vec![timeout, ok]);
    let slow = {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move { orchestrator.execute(&request(), None).await })
    };

    // Let the slow request fail its first attempt and start backing off
    tokio::task::yield_now().await;
    let start = Instant::now();
    let other = Request::new(AccountId::new("t2_other"), "https://oauth.reddit.com/x");
    h.orchestrator.execute(&other, None).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(4));

    slow.await.unwrap().unwrap();
}
