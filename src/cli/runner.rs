//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, SortOrder};
use crate::client::{AuthenticatedClient, Client};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::RequestOption;
use crate::metrics::TracingMetrics;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        let client = Client::connect(config, Arc::new(TracingMetrics)).await?;

        match &self.cli.command {
            Commands::Me => {
                let me = self.authenticated(&client)?.me().await?;
                self.output("ME", &me)
            }
            Commands::Inbox {
                unread,
                limit,
                after,
            } => {
                let api = self.authenticated(&client)?;
                let options = paging(*limit, after.as_deref());
                let listing = if *unread {
                    api.message_unread(options).await?
                } else {
                    api.message_inbox(options).await?
                };
                self.output("LISTING", &listing)
            }
            Commands::Refresh => {
                let tokens = self.authenticated(&client)?.refresh_tokens().await?;
                info!("Refreshed tokens, expires in {}s", tokens.expires_in);
                self.output("TOKENS", &tokens)
            }
            Commands::User { name, posts, limit } => {
                let api = self.authenticated(&client)?;
                if *posts {
                    let listing = api.user_posts(name, paging(*limit, None)).await?;
                    self.output("LISTING", &listing)
                } else {
                    let user = api.user_about(name, []).await?;
                    self.output("USER", &user)
                }
            }
            Commands::Subreddit {
                name,
                sort,
                about,
                limit,
            } => {
                let api = self.authenticated(&client)?;
                if *about {
                    let subreddit = api.subreddit_about(name, []).await?;
                    return self.output("SUBREDDIT", &subreddit);
                }
                let options = paging(*limit, None);
                let listing = match sort {
                    SortOrder::Hot => api.subreddit_hot(name, options).await?,
                    SortOrder::Top => api.subreddit_top(name, options).await?,
                    SortOrder::New => api.subreddit_new(name, options).await?,
                };
                self.output("LISTING", &listing)
            }
            Commands::Info { fullnames } => {
                let listing = self
                    .authenticated(&client)?
                    .about_info(fullnames, [])
                    .await?;
                self.output("LISTING", &listing)
            }
            Commands::Status => self.status(&client).await,
        }
    }

    /// Load configuration: file, then environment, then flags
    fn load_config(&self) -> Result<ClientConfig> {
        let config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };

        let mut config = config.with_env_overrides();
        if let Some(url) = &self.cli.redis_url {
            config.redis_url = Some(url.clone());
        }
        if let Some(limit) = self.cli.conn_limit {
            config.conn_limit = Some(limit);
        }
        Ok(config)
    }

    fn account(&self) -> Result<&str> {
        self.cli
            .account
            .as_deref()
            .ok_or_else(|| Error::config("Account not specified (use -a flag)"))
    }

    fn authenticated(&self, client: &Client) -> Result<AuthenticatedClient> {
        client.authenticated(
            self.account()?,
            self.cli.refresh_token.clone().unwrap_or_default(),
            self.cli.access_token.clone().unwrap_or_default(),
        )
    }

    /// Print the account's rate-limit records
    async fn status(&self, client: &Client) -> Result<()> {
        let api = self.authenticated(client)?;
        let gate = client.gate();

        let cooldown = gate.cooldown(api.account()).await?;
        let abnormal = gate.abnormal_usage(api.account()).await?;
        let requests = gate.request_count(api.account()).await?;

        self.output_message(&json!({
            "type": "STATUS",
            "status": {
                "account": api.account(),
                "throttled": cooldown.is_some(),
                "cooldown": cooldown,
                "abnormal_usage": abnormal,
                "request_count": requests
            }
        }));
        Ok(())
    }

    fn output<T: Serialize>(&self, kind: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.output_message(&json!({
            "type": kind,
            "record": value
        }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn paging(limit: Option<u32>, after: Option<&str>) -> Vec<RequestOption> {
    let mut options = Vec::new();
    if let Some(limit) = limit {
        options.push(RequestOption::query("limit", limit.to_string()));
    }
    if let Some(after) = after {
        options.push(RequestOption::query("after", after));
    }
    options
}
