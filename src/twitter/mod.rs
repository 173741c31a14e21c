pub mod v1;
pub mod v2;

use crate::config::Credentials;
use crate::error::IngestError;
use crate::model::TimelineItem;
use async_trait::async_trait;
use v1::TwitterClientV1;
use v2::TwitterClientV2;

/// Where the next page of a timeline starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// API v1.1: only return tweets with an id at or below this one
    MaxId(u64),
    /// API v2: opaque `pagination_token`
    Token(String),
}

#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub account: &'a str,
    /// Only return tweets strictly newer than this id (filtered by the provider)
    pub since_id: Option<u64>,
    /// Whether the caller wants retweets. Clients still return them; the cursor filters.
    pub include_retweets: bool,
    /// `None` requests the newest page
    pub cursor: Option<PageCursor>,
}

/// One page of a timeline, newest first.
#[derive(Debug, Default)]
pub struct Page {
    pub items: Vec<TimelineItem>,
    pub next: Option<PageCursor>,
}

/// A remote, authenticated view of account timelines.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> anyhow::Result<Page>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    /// v1.1 with user-context OAuth keys
    V1,
    /// v2 with an app bearer token
    V2,
}

/// Builds the client for `api`. Fails before any network activity on bad credentials.
pub fn connect(auth: &Credentials, api: Api) -> Result<Box<dyn TimelineSource>, IngestError> {
    let source: Box<dyn TimelineSource> = match api {
        Api::V1 => {
            log::info!("Using Twitter API v1.1");
            Box::new(TwitterClientV1::new(auth))
        }
        Api::V2 => {
            log::info!("Using Twitter API v2");
            Box::new(TwitterClientV2::new(auth)?)
        }
    };
    Ok(source)
}
