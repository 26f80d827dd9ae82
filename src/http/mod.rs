//! HTTP module
//!
//! Request descriptors, the pooled transport and rate-limit header parsing.
//!
//! # Features
//!
//! - **Request Descriptor**: method, URL, query, form body, auth, metric tags,
//!   retry flag, sentinel empty length and status classification table
//! - **Connection Pooling**: bounded idle and active connections per host
//! - **Header Timeout**: a request fails with `Timeout` when the response
//!   headers do not arrive in time
//! - **Instrumentation**: call, latency, error and connection metrics

mod request;
mod snapshot;
mod transport;

pub use request::{Auth, Request, RequestOption};
pub use snapshot::RateLimitSnapshot;
pub use transport::{HttpTransport, Response, Transport};

#[cfg(test)]
mod tests;
