use serde::{Deserialize, Serialize};

/// A tweet as persisted by the store.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TweetRecord {
    /// Numeric id of the posting account
    pub user_id: u64,
    /// Handle of the posting account at fetch time
    pub screen_name: String,
    pub tweet_id: u64,
    /// Provider-native timestamp, stored verbatim
    pub created_at: String,
    pub text: String,
}

/// A timeline entry as produced by a [`crate::twitter::TimelineSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineItem {
    pub id: u64,
    pub user_id: u64,
    pub screen_name: String,
    pub created_at: String,
    pub text: String,
    pub is_retweet: bool,
}

impl From<TimelineItem> for TweetRecord {
    fn from(item: TimelineItem) -> Self {
        TweetRecord {
            user_id: item.user_id,
            screen_name: item.screen_name,
            tweet_id: item.id,
            created_at: item.created_at,
            text: item.text,
        }
    }
}

/// Renders tweet texts the way the legacy store did: each one followed by a newline.
pub fn join_texts<I, S>(texts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts.into_iter().fold(String::new(), |mut out, text| {
        out.push_str(text.as_ref());
        out.push('\n');
        out
    })
}
