//! CLI module
//!
//! Command-line interface for manual calls against the API and for
//! inspecting an account's rate-limit state.
//!
//! # Commands
//!
//! - `me` - Show the authenticated account
//! - `inbox` - List inbox items (`--unread` for unread only)
//! - `refresh` - Exchange the refresh token for a new access token
//! - `user` - Show a user's profile or submissions
//! - `subreddit` - List a subreddit's posts or show its details
//! - `info` - Look up things by fullname
//! - `status` - Show cool-down, abnormal-usage and request-count records

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, SortOrder};
pub use runner::Runner;
