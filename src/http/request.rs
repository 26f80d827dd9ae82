//! Request descriptor
//!
//! A `Request` is built once per logical call and re-sent unchanged on every
//! retry attempt.

use crate::classify::StatusTable;
use crate::types::{AccountId, Method, Tags};

/// Credentials attached to a request
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// OAuth bearer token
    Bearer(String),
    /// HTTP basic auth (client id and secret)
    Basic {
        /// OAuth client id
        username: String,
        /// OAuth client secret
        password: String,
    },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Bearer(_) => f.write_str("Bearer(***)"),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Everything needed to send one logical request
#[derive(Debug, Clone)]
pub struct Request {
    /// Account whose quota this request consumes
    pub account: AccountId,
    /// HTTP method
    pub method: Method,
    /// Absolute URL without query string
    pub url: String,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Form-encoded body fields
    pub form: Vec<(String, String)>,
    /// Extra headers
    pub headers: Vec<(String, String)>,
    /// Credentials, if any
    pub auth: Option<Auth>,
    /// Metric tags, `key:value`
    pub tags: Tags,
    /// Retry on the backoff schedule when an attempt fails
    pub retry: bool,
    /// Body length of the upstream's empty sentinel, 0 to disable
    pub empty_response_bytes: usize,
    /// Endpoint-specific meaning of error statuses
    pub classification: StatusTable,
}

impl Request {
    /// Create a GET request for `url`, retried by default
    pub fn new(account: AccountId, url: impl Into<String>) -> Self {
        Self {
            account,
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            form: Vec::new(),
            headers: Vec::new(),
            auth: None,
            tags: Vec::new(),
            retry: true,
            empty_response_bytes: 0,
            classification: StatusTable::plain(),
        }
    }

    /// Set the HTTP method
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a form body field
    #[must_use]
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Authenticate with a bearer token
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(Auth::Bearer(token.into()));
        self
    }

    /// Authenticate with basic auth
    #[must_use]
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(Auth::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Add metric tags
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Enable or disable retries
    #[must_use]
    pub fn retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    /// Treat a body of exactly `len` bytes as the empty sentinel
    #[must_use]
    pub fn empty_response_bytes(mut self, len: usize) -> Self {
        self.empty_response_bytes = len;
        self
    }

    /// Set the status classification table
    #[must_use]
    pub fn classification(mut self, table: StatusTable) -> Self {
        self.classification = table;
        self
    }

    /// Apply caller-supplied options
    #[must_use]
    pub fn with_options(self, options: impl IntoIterator<Item = RequestOption>) -> Self {
        options.into_iter().fold(self, |req, opt| opt.apply(req))
    }
}

/// Caller-supplied tweak applied on top of an endpoint's defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOption {
    /// Add a query parameter, e.g. `limit=100` or `after=t3_abc`
    Query(String, String),
    /// Add metric tags
    Tags(Vec<String>),
    /// Enable or disable retries
    Retry(bool),
    /// Override the empty sentinel length
    EmptyResponseBytes(usize),
}

impl RequestOption {
    /// Shorthand for a query parameter option
    pub fn query(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Query(key.into(), value.into())
    }

    fn apply(self, req: Request) -> Request {
        match self {
            RequestOption::Query(k, v) => req.query(k, v),
            RequestOption::Tags(tags) => req.tags(tags),
            RequestOption::Retry(retry) => req.retry(retry),
            RequestOption::EmptyResponseBytes(len) => req.empty_response_bytes(len),
        }
    }
}
