//! Client and endpoint wrappers

use super::models::{
    ListingResponse, MeResponse, RefreshTokenResponse, SubredditResponse, UserResponse,
};
use crate::classify::StatusTable;
use crate::config::ClientConfig;
use crate::dispatch::{dispatch, dispatch_or_empty};
use crate::error::{Error, Result};
use crate::http::{HttpTransport, Request, RequestOption, Transport};
use crate::metrics::MetricsSink;
use crate::ratelimit::RateLimitGate;
use crate::retry::{BackoffSchedule, Orchestrator};
use crate::store::{KeyValueStore, MemoryStore, RedisStore};
use crate::types::{AccountId, Method, EMPTY_LISTING_BYTES};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shared client: connection pool, rate-limit gate and app credentials
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    orchestrator: Orchestrator,
}

impl Client {
    /// Create a client over the given store and metrics sink
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(
            config.pool_config(),
            &config.user_agent,
            metrics.clone(),
        )?;
        Ok(Self::with_transport(config, Arc::new(transport), store, metrics))
    }

    /// Create a client with a custom transport
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let gate = RateLimitGate::new(store, metrics.clone(), config.gate.clone());
        let schedule = BackoffSchedule::new(config.backoff_schedule());
        let orchestrator = Orchestrator::new(transport, gate, metrics, schedule);

        Self {
            config: Arc::new(config),
            orchestrator,
        }
    }

    /// Create a client whose store is chosen by `config.redis_url`.
    ///
    /// Without a Redis URL the rate-limit state lives in this process only.
    pub async fn connect(config: ClientConfig, metrics: Arc<dyn MetricsSink>) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisStore::connect(url).await?),
            None => {
                warn!("No redis_url configured, rate-limit state is process-local");
                Arc::new(MemoryStore::new())
            }
        };
        Self::new(config, store, metrics)
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request orchestrator shared by every account
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Rate-limit gate over the shared store
    pub fn gate(&self) -> &RateLimitGate {
        self.orchestrator.gate()
    }

    /// Bind the client to an account and its tokens
    pub fn authenticated(
        &self,
        account: impl Into<AccountId>,
        refresh_token: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<AuthenticatedClient> {
        let account = account.into();
        if account.is_empty() {
            return Err(Error::config("Authenticated client requires an account id"));
        }

        Ok(AuthenticatedClient {
            client: self.clone(),
            account,
            refresh_token: refresh_token.into(),
            access_token: access_token.into(),
            cancel: None,
        })
    }

    fn oauth_url(&self, path: &str) -> String {
        join_url(&self.config.oauth_base_url, path)
    }

    fn www_url(&self, path: &str) -> String {
        join_url(&self.config.www_base_url, path)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("oauth_base_url", &self.config.oauth_base_url)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

/// Client bound to one account
#[derive(Clone)]
pub struct AuthenticatedClient {
    client: Client,
    account: AccountId,
    refresh_token: String,
    access_token: String,
    cancel: Option<CancellationToken>,
}

impl AuthenticatedClient {
    /// Account whose quota this client consumes
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Abandon in-flight requests and pending retries when `token` fires
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Replace the tokens, e.g. after [`refresh_tokens`](Self::refresh_tokens)
    #[must_use]
    pub fn with_tokens(mut self, refresh_token: impl Into<String>, access_token: impl Into<String>) -> Self {
        self.refresh_token = refresh_token.into();
        self.access_token = access_token.into();
        self
    }

    fn get(&self, url: String, route: &str) -> Request {
        Request::new(self.account.clone(), url)
            .bearer(self.access_token.as_str())
            .tags([format!("url:{route}")])
    }

    async fn send(&self, request: &Request) -> Result<bytes::Bytes> {
        debug!("{} {} for {}", request.method, request.url, self.account);
        let response = self
            .client
            .orchestrator
            .execute(request, self.cancel.as_ref())
            .await?;
        Ok(response.body)
    }

    async fn request<T, F>(&self, request: Request, extract: F) -> Result<T>
    where
        F: FnOnce(Value) -> Result<T>,
    {
        let body = self.send(&request).await?;
        dispatch(&body, extract)
    }

    async fn request_listing(&self, request: Request) -> Result<ListingResponse> {
        let body = self.send(&request).await?;
        dispatch_or_empty(
            &body,
            request.empty_response_bytes,
            ListingResponse::empty(),
            ListingResponse::from_document,
        )
    }

    // ========================================================================
    // Auth
    // ========================================================================

    /// Exchange the refresh token for a new access token.
    ///
    /// A 400 from the token endpoint means the refresh token is revoked. The
    /// current refresh token is carried over when the server does not rotate
    /// it.
    pub async fn refresh_tokens(&self) -> Result<RefreshTokenResponse> {
        let route = "/api/v1/access_token";
        let request = Request::new(self.account.clone(), self.client.www_url(route))
            .method(Method::POST)
            .tags([format!("url:{route}")])
            .form("grant_type", "refresh_token")
            .form("refresh_token", self.refresh_token.as_str())
            .basic_auth(
                self.client.config.client_id.as_str(),
                self.client.config.client_secret.as_str(),
            )
            .classification(StatusTable::token_refresh());

        let mut response = self
            .request(request, RefreshTokenResponse::from_document)
            .await?;
        if response.refresh_token.is_empty() {
            response.refresh_token.clone_from(&self.refresh_token);
        }
        Ok(response)
    }

    /// The authenticated account
    pub async fn me(&self) -> Result<MeResponse> {
        let route = "/api/v1/me";
        let request = self
            .get(self.client.oauth_url(route), route)
            .classification(StatusTable::authenticated());
        self.request(request, MeResponse::from_document).await
    }

    // ========================================================================
    // Inbox
    // ========================================================================

    /// All inbox items
    pub async fn message_inbox(
        &self,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<ListingResponse> {
        self.inbox("/message/inbox", options).await
    }

    /// Unread inbox items
    pub async fn message_unread(
        &self,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<ListingResponse> {
        self.inbox("/message/unread", options).await
    }

    async fn inbox(
        &self,
        route: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<ListingResponse> {
        let request = self
            .get(self.client.oauth_url(route), route)
            .empty_response_bytes(EMPTY_LISTING_BYTES)
            .classification(StatusTable::authenticated())
            .with_options(options);
        self.request_listing(request).await
    }

    // ========================================================================
    // Listings
    // ========================================================================

    /// Things by fullname (`t3_abc,t1_def`)
    pub async fn about_info(
        &self,
        fullname: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<ListingResponse> {
        let route = "/api/info";
        let request = self
            .get(self.client.oauth_url(route), route)
            .query("id", fullname)
            .with_options(options);
        self.request_listing(request).await
    }

    /// Posts submitted by a user
    pub async fn user_posts(
        &self,
        user: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<ListingResponse> {
        let url = self.client.oauth_url(&format!("/u/{user}/submitted"));
        let request = self.get(url, "/u/:user/submitted").with_options(options);
        self.request_listing(request).await
    }

    /// Hot posts of a subreddit
    pub async fn subreddit_hot(
        &self,
        subreddit: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<ListingResponse> {
        self.subreddit_posts(subreddit, "hot", options).await
    }

    /// Top posts of a subreddit
    pub async fn subreddit_top(
        &self,
        subreddit: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<ListingResponse> {
        self.subreddit_posts(subreddit, "top", options).await
    }

    /// Newest posts of a subreddit
    pub async fn subreddit_new(
        &self,
        subreddit: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<ListingResponse> {
        self.subreddit_posts(subreddit, "new", options).await
    }

    async fn subreddit_posts(
        &self,
        subreddit: &str,
        sort: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<ListingResponse> {
        let url = self.client.oauth_url(&format!("/r/{subreddit}/{sort}"));
        let request = self
            .get(url, &format!("/r/:subreddit/{sort}"))
            .with_options(options);
        self.request_listing(request).await
    }

    // ========================================================================
    // About
    // ========================================================================

    /// Public profile of a user
    pub async fn user_about(
        &self,
        user: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<UserResponse> {
        let url = self.client.oauth_url(&format!("/u/{user}/about"));
        let request = self.get(url, "/u/:user/about").with_options(options);
        self.request(request, UserResponse::from_document).await
    }

    /// Details of a subreddit
    pub async fn subreddit_about(
        &self,
        subreddit: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<SubredditResponse> {
        let url = self.client.oauth_url(&format!("/r/{subreddit}/about"));
        let request = self.get(url, "/r/:subreddit/about").with_options(options);
        self.request(request, SubredditResponse::from_document).await
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("account", &self.account)
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
