//! Rate-limit gate implementation

use crate::config::{GateConfig, StoreFailurePolicy};
use crate::error::{Error, Result};
use crate::http::RateLimitSnapshot;
use crate::metrics::{MetricsSink, API_RATELIMIT};
use crate::store::KeyValueStore;
use crate::types::AccountId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hash of request counts, keyed by account
pub const REQUEST_COUNTS_KEY: &str = "reddit:requests";

/// Hash of snapshots with an abnormal used count, keyed by account
pub const ABNORMAL_USAGE_KEY: &str = "reddit:ratelimited:crazy";

/// Store key of an account's cool-down record
pub fn cooldown_key(account: &AccountId) -> String {
    format!("reddit:{account}:ratelimited")
}

/// Pre-send throttle check and post-send quota bookkeeping
#[derive(Clone)]
pub struct RateLimitGate {
    store: Arc<dyn KeyValueStore>,
    metrics: Arc<dyn MetricsSink>,
    config: GateConfig,
}

impl RateLimitGate {
    /// Create a gate over `store`
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        metrics: Arc<dyn MetricsSink>,
        config: GateConfig,
    ) -> Self {
        Self {
            store,
            metrics,
            config,
        }
    }

    /// Thresholds and store-failure policy
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Whether the account currently has a cool-down record.
    ///
    /// The bypass account is never throttled. A store failure either
    /// propagates as `StoreUnavailable` or, under
    /// [`StoreFailurePolicy::FailOpen`], reads as "not throttled".
    pub async fn is_throttled(&self, account: &AccountId) -> Result<bool> {
        if account.is_bypass() {
            return Ok(false);
        }

        match self.store.get(&cooldown_key(account)).await {
            Ok(record) => Ok(record.is_some()),
            Err(e) => match self.config.on_store_failure {
                StoreFailurePolicy::FailClosed => Err(e),
                StoreFailurePolicy::FailOpen => {
                    warn!("Throttle check for {} failed open: {}", account, e);
                    Ok(false)
                }
            },
        }
    }

    /// Record the quota reported on a successful response.
    ///
    /// Writes nothing unless the snapshot is present and at or below the
    /// safety buffer. The cool-down record is overwritten with a fresh TTL
    /// on every such response.
    pub async fn record_usage(&self, account: &AccountId, snapshot: &RateLimitSnapshot) -> Result<()> {
        if account.is_bypass() {
            return Err(Error::RequiresAccountId);
        }

        if !snapshot.present || snapshot.remaining > self.config.safety_buffer {
            return Ok(());
        }

        self.metrics.increment(API_RATELIMIT, &[], 1.0);

        let info = serde_json::to_string(snapshot)?;

        if snapshot.used > self.config.abnormal_used_threshold {
            warn!(
                "Abnormal usage for {}: used={} remaining={}",
                account, snapshot.used, snapshot.remaining
            );
            self.store
                .set_field(ABNORMAL_USAGE_KEY, account.as_str(), &info)
                .await?;
        }

        let Some(ttl) = snapshot.reset_after() else {
            debug!("No reset window for {}, skipping cool-down", account);
            return Ok(());
        };

        debug!(
            "Cooling down {} for {}s (remaining={})",
            account, snapshot.reset, snapshot.remaining
        );
        self.store
            .set_with_ttl(&cooldown_key(account), &info, ttl)
            .await
    }

    /// Count a request against the account; no-op for the bypass account
    pub async fn log_request(&self, account: &AccountId) -> Result<()> {
        if account.is_bypass() {
            return Ok(());
        }

        self.store
            .increment_field(REQUEST_COUNTS_KEY, account.as_str(), 1)
            .await
            .map(|_| ())
    }

    /// The snapshot stored in the account's live cool-down record
    pub async fn cooldown(&self, account: &AccountId) -> Result<Option<RateLimitSnapshot>> {
        match self.store.get(&cooldown_key(account)).await? {
            Some(info) => Ok(Some(serde_json::from_str(&info)?)),
            None => Ok(None),
        }
    }

    /// The last abnormal-usage snapshot recorded for the account
    pub async fn abnormal_usage(&self, account: &AccountId) -> Result<Option<RateLimitSnapshot>> {
        match self
            .store
            .get_field(ABNORMAL_USAGE_KEY, account.as_str())
            .await?
        {
            Some(info) => Ok(Some(serde_json::from_str(&info)?)),
            None => Ok(None),
        }
    }

    /// Requests counted for the account so far
    pub async fn request_count(&self, account: &AccountId) -> Result<i64> {
        let count = self
            .store
            .get_field(REQUEST_COUNTS_KEY, account.as_str())
            .await?;
        Ok(count.and_then(|c| c.parse().ok()).unwrap_or(0))
    }
}

impl std::fmt::Debug for RateLimitGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
