//! Request orchestrator

use super::schedule::BackoffSchedule;
use crate::error::{Error, Result};
use crate::http::{Request, Response, Transport};
use crate::metrics::{MetricsSink, API_ERRORS, API_RETRIES, DEFAULT_SAMPLE_RATE};
use crate::ratelimit::RateLimitGate;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Sends requests through the gate, the transport and the retry schedule
#[derive(Clone)]
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    gate: RateLimitGate,
    metrics: Arc<dyn MetricsSink>,
    schedule: BackoffSchedule,
}

impl Orchestrator {
    /// Create an orchestrator
    pub fn new(
        transport: Arc<dyn Transport>,
        gate: RateLimitGate,
        metrics: Arc<dyn MetricsSink>,
        schedule: BackoffSchedule,
    ) -> Self {
        Self {
            transport,
            gate,
            metrics,
            schedule,
        }
    }

    /// The gate consulted before every send
    pub fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    /// The backoff schedule between attempts
    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    /// Execute one logical request.
    ///
    /// Fails fast with `RateLimited` while the account is cooling down. A
    /// failed attempt is retried on the backoff schedule when the request
    /// opts in and the classified error is retryable. When `cancel` fires
    /// the request is abandoned with `Cancelled`.
    pub async fn execute(
        &self,
        request: &Request,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response> {
        match self.run(request, cancel).await {
            Ok(response) => Ok(response),
            Err(e) => {
                let mut tags = request.tags.clone();
                tags.push(format!("error:{}", e.kind().as_str()));
                self.metrics.increment(API_ERRORS, &tags, DEFAULT_SAMPLE_RATE);
                Err(e)
            }
        }
    }

    async fn run(&self, request: &Request, cancel: Option<&CancellationToken>) -> Result<Response> {
        if self.gate.is_throttled(&request.account).await? {
            debug!("{} is cooling down, not sending {}", request.account, request.url);
            return Err(Error::RateLimited);
        }

        let mut result = self.attempt(request, cancel).await;

        if request.retry {
            for (retry, backoff) in self.schedule.iter().enumerate() {
                match &result {
                    Ok(_) => break,
                    Err(e) if !e.is_retryable() => break,
                    Err(e) => warn!(
                        "{} {} failed ({}), retry {}/{} in {:?}",
                        request.method,
                        request.url,
                        e,
                        retry + 1,
                        self.schedule.len(),
                        backoff
                    ),
                }

                result = match sleep_or_cancel(backoff, cancel).await {
                    Ok(()) => {
                        self.metrics
                            .increment(API_RETRIES, &request.tags, DEFAULT_SAMPLE_RATE);
                        self.attempt(request, cancel).await
                    }
                    Err(e) => Err(e),
                };
            }
        }

        let response = result?;

        if !request.account.is_bypass() {
            if let Err(e) = self
                .gate
                .record_usage(&request.account, &response.rate_limit)
                .await
            {
                warn!("Failed to record usage for {}: {}", request.account, e);
            }
        }

        Ok(response)
    }

    /// One counted, classified send
    async fn attempt(
        &self,
        request: &Request,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }

        if let Err(e) = self.gate.log_request(&request.account).await {
            warn!("Failed to count request for {}: {}", request.account, e);
        }

        let sent = or_cancel(self.transport.send(request), cancel).await?;
        sent.map_err(|e| request.classification.classify(e))
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("gate", &self.gate)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

/// Run `fut` unless `cancel` fires first
async fn or_cancel<F: Future>(fut: F, cancel: Option<&CancellationToken>) -> Result<F::Output> {
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                () = token.cancelled() => Err(Error::Cancelled),
                out = fut => Ok(out),
            }
        }
        None => Ok(fut.await),
    }
}

async fn sleep_or_cancel(duration: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
    or_cancel(tokio::time::sleep(duration), cancel).await
}
