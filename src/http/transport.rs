//! Pooled HTTP transport with instrumentation

use super::request::{Auth, Request};
use super::snapshot::RateLimitSnapshot;
use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::metrics::{
    MetricsSink, API_CALLS, API_ERRORS, API_LATENCY, CONNECTIONS_CREATED, CONNECTIONS_IDLE_TIME,
    CONNECTIONS_REUSED, DEFAULT_SAMPLE_RATE,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

/// A successful (HTTP 200) response
#[derive(Debug, Clone)]
pub struct Response {
    /// Rate-limit headers of the response
    pub rate_limit: RateLimitSnapshot,
    /// Raw body bytes
    pub body: Bytes,
}

/// Sends one attempt of a request
///
/// Any status other than 200 is returned as
/// [`Error::ServerError`](crate::Error::ServerError); a header wait that
/// exceeds the configured timeout is [`Error::Timeout`](crate::Error::Timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one attempt of `request`
    async fn send(&self, request: &Request) -> Result<Response>;
}

#[derive(Debug)]
struct HostSlot {
    permits: Arc<Semaphore>,
    last_released: Option<Instant>,
}

/// Transport over a shared `reqwest` connection pool
///
/// Pool bounds are fixed at construction and apply to every request made
/// through this transport. `reqwest` caps idle connections per host only, so
/// the idle cap is the smaller of `max_idle` and `max_idle_per_host`, and the
/// active cap per host is enforced with a semaphore.
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
    hosts: Mutex<HashMap<String, HostSlot>>,
    metrics: Arc<dyn MetricsSink>,
}

impl HttpTransport {
    /// Build the connection pool
    pub fn new(
        config: TransportConfig,
        user_agent: &str,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .pool_max_idle_per_host(config.max_idle.min(config.max_idle_per_host))
            .pool_idle_timeout(config.idle_timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            hosts: Mutex::new(HashMap::new()),
            metrics,
        })
    }

    /// Pool bounds of this transport
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Reserve a connection slot for the request's host.
    ///
    /// Emits the created/reused/idle-time connection metrics for the host
    /// before waiting on the slot.
    async fn acquire(&self, url: &str) -> Result<OwnedSemaphorePermit> {
        let host = host_key(url)?;
        let permits = {
            let mut hosts = self
                .hosts
                .lock()
                .map_err(|e| Error::generic(format!("Lock error: {e}")))?;
            let max = self.config.max_conns_per_host.max(1);
            let slot = hosts.entry(host).or_insert_with(|| HostSlot {
                permits: Arc::new(Semaphore::new(max)),
                last_released: None,
            });

            match slot.last_released {
                None => self.metrics.increment(CONNECTIONS_CREATED, &[], DEFAULT_SAMPLE_RATE),
                Some(released) => {
                    self.metrics
                        .increment(CONNECTIONS_REUSED, &[], DEFAULT_SAMPLE_RATE);
                    if slot.permits.available_permits() == max {
                        let idle = released.elapsed().as_millis() as f64;
                        self.metrics
                            .histogram(CONNECTIONS_IDLE_TIME, idle, &[], DEFAULT_SAMPLE_RATE);
                    }
                }
            }
            slot.permits.clone()
        };

        permits
            .acquire_owned()
            .await
            .map_err(|e| Error::generic(format!("Connection pool closed: {e}")))
    }

    fn release(&self, url: &str, permit: OwnedSemaphorePermit) {
        if let (Ok(host), Ok(mut hosts)) = (host_key(url), self.hosts.lock()) {
            if let Some(slot) = hosts.get_mut(&host) {
                slot.last_released = Some(Instant::now());
            }
        }
        drop(permit);
    }

    fn build(&self, request: &Request) -> reqwest::RequestBuilder {
        let mut req = self.client.request(request.method.into(), &request.url);

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if !request.form.is_empty() {
            req = req.form(&request.form);
        }
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        match &request.auth {
            Some(Auth::Bearer(token)) => req = req.bearer_auth(token),
            Some(Auth::Basic { username, password }) => {
                req = req.basic_auth(username, Some(password));
            }
            None => {}
        }
        req
    }

    async fn send_inner(&self, request: &Request) -> Result<Response> {
        let header_timeout = self.config.response_header_timeout();
        let start = Instant::now();

        let sent = tokio::time::timeout(header_timeout, self.build(request).send()).await;

        self.metrics
            .increment(API_CALLS, &request.tags, DEFAULT_SAMPLE_RATE);
        self.metrics.histogram(
            API_LATENCY,
            start.elapsed().as_millis() as f64,
            &request.tags,
            DEFAULT_SAMPLE_RATE,
        );

        let response = match sent {
            Err(_) => return Err(Error::Timeout),
            Ok(result) => result?,
        };

        let rate_limit = RateLimitSnapshot::from_headers(response.headers());
        let status = response.status();
        if status != StatusCode::OK {
            debug!("{} {} returned {}", request.method, request.url, status);
            return Err(Error::server(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::generic(format!("Failed to read response body: {e}")))?;

        Ok(Response { rate_limit, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<Response> {
        let permit = self.acquire(&request.url).await?;
        let result = self.send_inner(request).await;
        self.release(&request.url, permit);

        if result.is_err() {
            self.metrics
                .increment(API_ERRORS, &request.tags, DEFAULT_SAMPLE_RATE);
        }
        result
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Pool key for a URL: scheme, host and port
fn host_key(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::generic(format!("URL has no host: {url}")))?;
    Ok(format!(
        "{}://{}:{}",
        parsed.scheme(),
        host,
        parsed.port_or_known_default().unwrap_or(0)
    ))
}

#[cfg(test)]
mod transport_tests {
    use super::*;

    #[test]
    fn test_host_key() {
        assert_eq!(
            host_key("https://oauth.reddit.com/api/v1/me").unwrap(),
            "https://oauth.reddit.com:443"
        );
        assert_eq!(
            host_key("http://127.0.0.1:8080/x").unwrap(),
            "http://127.0.0.1:8080"
        );
        assert!(host_key("not a url").is_err());
    }
}
