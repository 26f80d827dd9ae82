//! Error types for reddit-gate
//!
//! Every public API returns `Result<T, Error>`. The variants form a small,
//! closed taxonomy that callers can branch on: a request either succeeds with
//! a typed value or fails with exactly one of these kinds.

use thiserror::Error;

/// The main error type for reddit-gate
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Upstream Errors
    // ============================================================================
    /// Response headers did not arrive in time
    #[error("Timed out awaiting response headers")]
    Timeout,

    /// The account is cooling down; nothing was sent
    #[error("Account is rate limited")]
    RateLimited,

    /// The credential was rejected by the endpoint
    #[error("OAuth credential revoked or expired")]
    OauthRevoked,

    /// Non-200 status not remapped by the endpoint
    #[error("Server returned HTTP {status}")]
    ServerError {
        /// HTTP status code
        status: u16,
    },

    // ============================================================================
    // Local Errors
    // ============================================================================
    /// The shared store could not be reached
    #[error("Shared store unavailable: {message}")]
    StoreUnavailable {
        /// Backend error message
        message: String,
    },

    /// The body was not the expected JSON
    #[error("Failed to parse response: {message}")]
    Parse {
        /// Parser error message
        message: String,
    },

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// Bookkeeping was attempted for the bypass account
    #[error("Rate limit bookkeeping requires an account id")]
    RequiresAccountId,

    /// Invalid configuration or arguments
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Any other failure, e.g. connection errors
    #[error("{0}")]
    Generic(String),
}

/// Tag-only view of [`Error`], handy for metrics tags and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Timeout`]
    Timeout,
    /// See [`Error::RateLimited`]
    RateLimited,
    /// See [`Error::OauthRevoked`]
    OauthRevoked,
    /// See [`Error::ServerError`]
    ServerError,
    /// See [`Error::StoreUnavailable`]
    StoreUnavailable,
    /// See [`Error::Parse`]
    Parse,
    /// See [`Error::Cancelled`]
    Cancelled,
    /// See [`Error::RequiresAccountId`]
    RequiresAccountId,
    /// See [`Error::Config`]
    Config,
    /// See [`Error::Generic`]
    Generic,
}

impl ErrorKind {
    /// Metric tag value for this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::OauthRevoked => "oauth_revoked",
            ErrorKind::ServerError => "server_error",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::Parse => "parse",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::RequiresAccountId => "requires_account_id",
            ErrorKind::Config => "config",
            ErrorKind::Generic => "generic",
        }
    }
}

impl Error {
    /// Create a server error for a non-200 status
    pub fn server(status: u16) -> Self {
        Self::ServerError { status }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }

    /// The kind of this error, without payload
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout => ErrorKind::Timeout,
            Error::RateLimited => ErrorKind::RateLimited,
            Error::OauthRevoked => ErrorKind::OauthRevoked,
            Error::ServerError { .. } => ErrorKind::ServerError,
            Error::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::RequiresAccountId => ErrorKind::RequiresAccountId,
            Error::Config { .. } => ErrorKind::Config,
            Error::Generic(_) => ErrorKind::Generic,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ServerError { status } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error may be retried on the backoff schedule.
    ///
    /// A throttled account, a revoked credential and a cancelled request are
    /// final no matter how many attempts remain.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::RateLimited
                | Error::OauthRevoked
                | Error::Cancelled
                | Error::RequiresAccountId
                | Error::Config { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Timeout is reserved for the response-header wait
        if err.is_timeout() && !err.is_connect() {
            return Error::Timeout;
        }
        Error::Generic(format!("HTTP request failed: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::config(format!("Failed to parse YAML: {err}"))
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::store(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::config(format!("Invalid URL: {err}"))
    }
}

/// Result type alias for reddit-gate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::server(503).to_string(), "Server returned HTTP 503");
        assert_eq!(
            Error::store("connection refused").to_string(),
            "Shared store unavailable: connection refused"
        );
        assert_eq!(Error::RateLimited.to_string(), "Account is rate limited");
    }

    #[test]
    fn test_kind_and_status() {
        let err = Error::server(400);
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(err.status(), Some(400));
        assert_eq!(Error::OauthRevoked.status(), None);
        assert_eq!(Error::parse("bad").kind().as_str(), "parse");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::Timeout.is_retryable());
        assert!(Error::server(500).is_retryable());
        assert!(Error::store("down").is_retryable());
        assert!(Error::generic("reset by peer").is_retryable());

        assert!(!Error::RateLimited.is_retryable());
        assert!(!Error::OauthRevoked.is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(!Error::RequiresAccountId.is_retryable());
    }

    #[test]
    fn test_json_error_is_parse() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
