//! Reddit API client
//!
//! `Client` owns the shared pieces (connection pool, rate-limit gate,
//! metrics, OAuth app credentials). `AuthenticatedClient` binds them to one
//! account and its tokens and exposes the endpoint wrappers.
//!
//! Every wrapper goes through the same path: build a [`Request`], run it
//! through the [`Orchestrator`], then dispatch the body to the model's
//! extraction function.
//!
//! [`Request`]: crate::http::Request
//! [`Orchestrator`]: crate::retry::Orchestrator

mod api;
mod ids;
mod models;

pub use api::{AuthenticatedClient, Client};
pub use ids::{post_id_from_context, split_id};
pub use models::{
    Comment, ListingResponse, MeResponse, Message, Post, RefreshTokenResponse, SubredditResponse,
    Thing, UserResponse,
};
