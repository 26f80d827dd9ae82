//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rate-limit aware Reddit API client
#[derive(Parser, Debug)]
#[command(name = "reddit-gate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Account whose rate-limit budget the calls consume
    #[arg(short, long, global = true, env = "REDDIT_ACCOUNT_ID")]
    pub account: Option<String>,

    /// OAuth access token
    #[arg(long, global = true, env = "REDDIT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// OAuth refresh token
    #[arg(long, global = true, env = "REDDIT_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Shared store URL, overrides the config file
    #[arg(long, global = true)]
    pub redis_url: Option<String>,

    /// Total connection budget, overrides the config file
    #[arg(long, global = true)]
    pub conn_limit: Option<usize>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the authenticated account
    Me,

    /// List inbox items
    Inbox {
        /// Only unread items
        #[arg(long)]
        unread: bool,

        /// Maximum items to return
        #[arg(long)]
        limit: Option<u32>,

        /// Fullname to page after
        #[arg(long)]
        after: Option<String>,
    },

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Show a user's profile, or their submissions with --posts
    User {
        /// Username
        name: String,

        /// List submissions instead of the profile
        #[arg(long)]
        posts: bool,

        /// Maximum posts to return
        #[arg(long)]
        limit: Option<u32>,
    },

    /// List a subreddit's posts, or show its details with --about
    Subreddit {
        /// Subreddit name, without the r/ prefix
        name: String,

        /// Listing order
        #[arg(long, default_value = "hot")]
        sort: SortOrder,

        /// Show details instead of posts
        #[arg(long)]
        about: bool,

        /// Maximum posts to return
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Look up things by fullname (comma-separated)
    Info {
        /// Fullnames, e.g. t3_abc,t1_def
        fullnames: String,
    },

    /// Show the account's rate-limit records
    Status,
}

/// Subreddit listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    /// Hot posts
    Hot,
    /// Top posts
    Top,
    /// Newest posts
    New,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
