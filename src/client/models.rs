//! Response models
//!
//! Each model has a `from_document` extraction function that maps a parsed
//! JSON document to the typed value. They are pure and never perform I/O.

use crate::dispatch::deserialize;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Auth
// ============================================================================

/// Token endpoint response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    /// Bearer token for authenticated calls
    pub access_token: String,
    /// Empty when the server did not rotate the refresh token
    #[serde(default)]
    pub refresh_token: String,
    /// Token lifetime in seconds
    #[serde(default)]
    pub expires_in: i64,
    /// Granted scopes, space-separated
    #[serde(default)]
    pub scope: String,
    /// Token type, normally `bearer`
    #[serde(default)]
    pub token_type: String,
}

impl RefreshTokenResponse {
    /// Extract the token response, rejecting one without an access token
    pub fn from_document(document: Value) -> Result<Self> {
        let response: Self = deserialize(document)?;
        if response.access_token.is_empty() {
            return Err(Error::parse("Token response has no access_token"));
        }
        Ok(response)
    }
}

/// The authenticated account (`/api/v1/me`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeResponse {
    /// Account id without the `t2_` prefix
    pub id: String,
    /// Username
    pub name: String,
    /// Number of inbox items
    #[serde(default)]
    pub inbox_count: i64,
    /// Whether there is unread mail
    #[serde(default)]
    pub has_mail: bool,
    /// Account creation time, Unix seconds
    #[serde(default)]
    pub created_utc: f64,
}

impl MeResponse {
    /// Extract the account document
    pub fn from_document(document: Value) -> Result<Self> {
        deserialize(document)
    }
}

// ============================================================================
// Things
// ============================================================================

/// A link submission (`t3`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    /// Post id without the `t3_` prefix
    pub id: String,
    /// Fullname, e.g. `t3_abc`
    pub name: String,
    /// Title
    pub title: String,
    /// Author username
    pub author: String,
    /// Subreddit name without the `r/` prefix
    pub subreddit: String,
    /// Path of the post
    pub permalink: String,
    /// Link target, or the permalink for self posts
    pub url: String,
    /// Body of a self post
    pub selftext: String,
    /// Net score
    pub score: i64,
    /// Comment count
    pub num_comments: i64,
    /// NSFW flag
    pub over_18: bool,
    /// Submission time, Unix seconds
    pub created_utc: f64,
}

/// A comment (`t1`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    /// Comment id without the `t1_` prefix
    pub id: String,
    /// Fullname, e.g. `t1_abc`
    pub name: String,
    /// Author username
    pub author: String,
    /// Markdown body
    pub body: String,
    /// Subreddit name
    pub subreddit: String,
    /// Fullname of the post
    pub link_id: String,
    /// Fullname of the parent post or comment
    pub parent_id: String,
    /// Path of the comment
    pub permalink: String,
    /// Permalink of the comment in context, set on inbox replies
    pub context: String,
    /// Net score
    pub score: i64,
    /// Unread flag, set on inbox items
    pub new: bool,
    /// Creation time, Unix seconds
    pub created_utc: f64,
}

/// A private message (`t4`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Message id without the `t4_` prefix
    pub id: String,
    /// Fullname, e.g. `t4_abc`
    pub name: String,
    /// Sender, `None` for system messages
    pub author: Option<String>,
    /// Recipient
    pub dest: String,
    /// Subject line
    pub subject: String,
    /// Markdown body
    pub body: String,
    /// Fullname of the message replied to
    pub parent_id: Option<String>,
    /// Unread flag
    pub new: bool,
    /// Creation time, Unix seconds
    pub created_utc: f64,
}

/// One child of a listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Thing {
    /// A `t1` comment
    Comment(Comment),
    /// A `t3` post
    Post(Post),
    /// A `t4` private message
    Message(Message),
    /// A kind this client does not model
    Other {
        /// The thing's kind tag
        kind: String,
    },
}

impl Thing {
    /// Parse a `{"kind": ..., "data": {...}}` document
    pub fn from_document(mut document: Value) -> Result<Self> {
        let kind = document
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::parse("Thing has no kind"))?
            .to_string();
        let data = document
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null);

        match kind.as_str() {
            "t1" => Ok(Thing::Comment(deserialize(data)?)),
            "t3" => Ok(Thing::Post(deserialize(data)?)),
            "t4" => Ok(Thing::Message(deserialize(data)?)),
            _ => Ok(Thing::Other { kind }),
        }
    }

    /// Fullname (`t3_abc`) of the thing, if modelled
    pub fn fullname(&self) -> Option<&str> {
        match self {
            Thing::Comment(c) => Some(&c.name),
            Thing::Post(p) => Some(&p.name),
            Thing::Message(m) => Some(&m.name),
            Thing::Other { .. } => None,
        }
    }
}

/// A page of things
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingResponse {
    /// Cursor for the next page
    pub after: Option<String>,
    /// Cursor for the previous page
    pub before: Option<String>,
    /// Things on this page
    pub children: Vec<Thing>,
}

impl ListingResponse {
    /// The listing returned for the upstream's empty sentinel body
    pub fn empty() -> Self {
        Self::default()
    }

    /// Extract a `Listing` document
    pub fn from_document(mut document: Value) -> Result<Self> {
        let mut data = document
            .get_mut("data")
            .map(Value::take)
            .ok_or_else(|| Error::parse("Listing has no data"))?;

        let after = data.get("after").and_then(Value::as_str).map(String::from);
        let before = data.get("before").and_then(Value::as_str).map(String::from);
        let children = match data.get_mut("children").map(Value::take) {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(Thing::from_document)
                .collect::<Result<Vec<_>>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(Error::parse("Listing children is not an array")),
        };

        Ok(Self {
            after,
            before,
            children,
        })
    }

    /// Number of things on this page
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the page has no things
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

// ============================================================================
// Accounts and Subreddits
// ============================================================================

/// Public profile of a user (`/u/{user}/about`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserResponse {
    /// User id without the `t2_` prefix
    pub id: String,
    /// Username
    pub name: String,
    /// Avatar URL
    pub icon_img: String,
    /// Karma from posts
    pub link_karma: i64,
    /// Karma from comments
    pub comment_karma: i64,
    /// Whether the account is suspended
    pub is_suspended: bool,
    /// Account creation time, Unix seconds
    pub created_utc: f64,
}

impl UserResponse {
    /// Extract the `data` of a `t2` document
    pub fn from_document(document: Value) -> Result<Self> {
        deserialize(unwrap_data(document)?)
    }
}

/// Subreddit details (`/r/{subreddit}/about`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubredditResponse {
    /// Subreddit id without the `t5_` prefix
    pub id: String,
    /// Fullname, e.g. `t5_abc`
    pub name: String,
    /// Name without the `r/` prefix
    pub display_name: String,
    /// Sidebar summary
    pub public_description: String,
    /// Subscriber count
    pub subscribers: i64,
    /// NSFW flag
    pub over18: bool,
    /// Creation time, Unix seconds
    pub created_utc: f64,
}

impl SubredditResponse {
    /// Extract the `data` of a `t5` document
    pub fn from_document(document: Value) -> Result<Self> {
        deserialize(unwrap_data(document)?)
    }
}

fn unwrap_data(mut document: Value) -> Result<Value> {
    document
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| Error::parse("Response has no data"))
}
