use crate::config::Credentials;
use crate::model::TimelineItem;
use crate::twitter::{Page, PageCursor, PageRequest, TimelineSource};
use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use egg_mode::{KeyPair, Token};

const PAGE_SIZE: i32 = 200;
/// Timestamp layout used by the v1.1 API payloads
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

pub struct TwitterClientV1 {
    token: Token,
}

impl TwitterClientV1 {
    pub fn new(auth: &Credentials) -> Self {
        let consumer = KeyPair::new(auth.consumer_key.clone(), auth.consumer_secret.clone());
        let access = KeyPair::new(auth.access_token.clone(), auth.access_secret.clone());
        Self {
            token: Token::Access { consumer, access },
        }
    }
}

#[async_trait]
impl TimelineSource for TwitterClientV1 {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> anyhow::Result<Page> {
        let max_id = match &request.cursor {
            None => None,
            Some(PageCursor::MaxId(id)) => Some(*id),
            Some(other) => bail!("Unsupported cursor for API v1.1: {:?}", other),
        };
        // Retweets are always requested: with include_rts=false the provider filters
        // after slicing the page, so a window of only retweets comes back empty and
        // would look like the end of the timeline. The cursor drops them instead.
        let timeline = egg_mode::tweet::user_timeline(
            request.account.to_string(),
            true,
            true,
            &self.token,
        )
        .with_page_size(PAGE_SIZE);
        let response = timeline
            .call(request.since_id, max_id)
            .await
            .context("Unable to fetch tweets")?;
        let items = response
            .response
            .into_iter()
            .map(TimelineItem::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        let next = next_cursor(&items);
        Ok(Page { items, next })
    }
}

/// The oldest id on a page, minus one, becomes the `max_id` of the next request.
fn next_cursor(items: &[TimelineItem]) -> Option<PageCursor> {
    items
        .iter()
        .map(|item| item.id)
        .min()
        .and_then(|id| id.checked_sub(1))
        .map(PageCursor::MaxId)
}

fn provider_timestamp(at: &DateTime<Utc>) -> String {
    at.format(CREATED_AT_FORMAT).to_string()
}

impl TryFrom<egg_mode::tweet::Tweet> for TimelineItem {
    type Error = anyhow::Error;

    fn try_from(tweet: egg_mode::tweet::Tweet) -> anyhow::Result<Self> {
        let user = tweet
            .user
            .with_context(|| format!("Tweet {} is missing its author", tweet.id))?;
        Ok(TimelineItem {
            id: tweet.id,
            user_id: user.id,
            screen_name: user.screen_name,
            created_at: provider_timestamp(&tweet.created_at),
            text: tweet.text,
            is_retweet: tweet.retweeted_status.is_some(),
        })
    }
}
