// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # reddit-gate
//!
//! A Reddit API client that shares one rate-limit budget per account across
//! every process instance talking to the API.
//!
//! ## Features
//!
//! - **Shared cool-downs**: quota headers are recorded in Redis, so a
//!   throttled account is throttled everywhere
//! - **Fixed backoff**: failed attempts are retried after 4s, 8s and 16s
//! - **Per-endpoint classification**: a 400 from the token endpoint or a 403
//!   from the inbox means the credential is revoked, not a server error
//! - **Empty-listing shortcut**: the upstream's fixed-size empty body is
//!   recognised without parsing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reddit_gate::{client::Client, config::ClientConfig, metrics::TracingMetrics};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> reddit_gate::Result<()> {
//!     let config = ClientConfig::builder()
//!         .credentials("client-id", "client-secret")
//!         .redis_url("redis://127.0.0.1/")
//!         .build();
//!     let client = Client::connect(config, Arc::new(TracingMetrics)).await?;
//!
//!     let alice = client.authenticated("t2_alice", "refresh-token", "access-token")?;
//!     let unread = alice.message_unread([]).await?;
//!     println!("{} unread", unread.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │            AuthenticatedClient (endpoint wrappers)           │
//! │   me()  message_inbox()  refresh_tokens()  subreddit_hot()   │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ Request + StatusTable
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │        Orchestrator: gate check → send → classify → retry    │
//! └───────┬──────────────────────┬────────────────────────┬──────┘
//!         │                      │                        │
//! ┌───────┴───────┐     ┌────────┴────────┐      ┌────────┴───────┐
//! │ RateLimitGate │     │ Transport       │      │ Dispatcher     │
//! │ cool-downs    │     │ pooled reqwest  │      │ JSON → typed   │
//! │ usage records │     │ header timeout  │      │ empty sentinel │
//! └───────┬───────┘     └─────────────────┘      └────────────────┘
//!         │
//! ┌───────┴───────┐
//! │ KeyValueStore │
//! │ Redis, memory │
//! └───────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and protocol constants
pub mod types;

/// Client configuration
pub mod config;

/// Shared key-value store
pub mod store;

/// Metrics sinks
pub mod metrics;

/// HTTP transport and request descriptors
pub mod http;

/// Per-endpoint status classification
pub mod classify;

/// Shared rate-limit gate
pub mod ratelimit;

/// Retry orchestration
pub mod retry;

/// Response dispatching
pub mod dispatch;

/// Reddit client and endpoint wrappers
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use types::*;

// Re-export commonly used types
pub use client::{AuthenticatedClient, Client};
pub use config::ClientConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
