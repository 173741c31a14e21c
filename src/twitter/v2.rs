//! Timeline access through Twitter API v2 using an app bearer token

use crate::config::{ConfigError, Credentials};
use crate::model::TimelineItem;
use crate::twitter::{Page, PageCursor, PageRequest, TimelineSource};
use anyhow::{bail, Context};
use async_trait::async_trait;
use maplit::hashmap;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

const TIMEOUT_SEC: u64 = 10;
const API_ROOT: &str = "https://api.twitter.com/2/";

pub struct TwitterClientV2 {
    client: Client,
    /// username -> (user id, canonical username)
    users: Mutex<HashMap<String, (u64, String)>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TwitterResponse<T> {
    Ok(T),
    // Detect the case where the API returns 200, but contains errors
    #[allow(unused)]
    Error { errors: serde_json::Value },
}

#[derive(Deserialize)]
struct ByUsernameResponse {
    data: ByUsernameData,
}

#[derive(Deserialize)]
struct ByUsernameData {
    id: String,
    username: String,
}

#[derive(Deserialize)]
struct GetTweetsResponse {
    #[serde(default)]
    data: Vec<GetTweetsTweet>,
    meta: GetTweetsMeta,
}

#[derive(Deserialize)]
struct GetTweetsTweet {
    id: String,
    text: String,
    created_at: String,
    author_id: Option<String>,
    #[serde(default)]
    referenced_tweets: Vec<ReferencedTweet>,
}

#[derive(Deserialize)]
struct ReferencedTweet {
    r#type: String,
}

#[derive(Deserialize)]
struct GetTweetsMeta {
    next_token: Option<String>,
}

async fn deserialize_response<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let status = response.status();
    let text = response.text().await.context("Bad response text")?;
    if !status.is_success() {
        let code = status.as_u16();
        bail!(format!("Response was not successful: {code}\n{text}"))
    }
    parse_body(&text)
}

fn parse_body<T: DeserializeOwned>(text: &str) -> anyhow::Result<T> {
    let twitter = match serde_json::from_str::<TwitterResponse<T>>(text) {
        Ok(ok) => ok,
        Err(e) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(pretty) => {
                let pretty = serde_json::to_string_pretty(&pretty)?;
                bail!(format!(
                    "Unable to deserialize due to: {e}\nContents:\n{pretty}"
                ))
            }
            Err(_) => bail!("Invalid JSON"),
        },
    };
    Ok(match twitter {
        TwitterResponse::Ok(ok) => ok,
        TwitterResponse::Error { .. } => bail!(text.to_string()),
    })
}

impl TwitterClientV2 {
    pub fn new(auth: &Credentials) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", auth.bearer()?);
        let value =
            HeaderValue::from_str(&value).map_err(|_| ConfigError::InvalidField("bearer_token"))?;
        headers.insert(AUTHORIZATION, value);
        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(Duration::from_secs(TIMEOUT_SEC))
                .build()
                .map_err(ConfigError::HttpClient)?,
            users: Mutex::new(HashMap::new()),
        })
    }

    async fn lookup_user(&self, username: &str) -> anyhow::Result<(u64, String)> {
        let key = username.to_lowercase();
        let mut users = self.users.lock().await;
        if let Some(user) = users.get(&key) {
            return Ok(user.clone());
        }
        let url = Url::parse(API_ROOT)?
            .join("users/by/username/")?
            .join(username)?;
        let response = self.client.get(url).send().await?;
        let response = deserialize_response::<ByUsernameResponse>(response).await?;
        let id = response
            .data
            .id
            .parse()
            .context("Couldn't parse user id")?;
        let user = (id, response.data.username);
        users.insert(key, user.clone());
        Ok(user)
    }
}

// https://developer.twitter.com/en/docs/twitter-api/tweets/timelines/api-reference/get-users-id-tweets
#[async_trait]
impl TimelineSource for TwitterClientV2 {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> anyhow::Result<Page> {
        let (user_id, username) = self
            .lookup_user(request.account)
            .await
            .context("Unable to find user")?;
        let url = Url::parse(&format!("{API_ROOT}users/{user_id}/tweets"))?;
        let query = timeline_query(request)?;
        let response = self.client.get(url).query(&query).send().await?;
        let response = deserialize_response::<GetTweetsResponse>(response).await?;
        let items = convert_tweets(response.data, user_id, &username)?;
        Ok(Page {
            items,
            next: response.meta.next_token.map(PageCursor::Token),
        })
    }
}

/// Retweets are never excluded here: `exclude=retweets` can leave a page empty while
/// older tweets remain. The cursor filters them instead.
fn timeline_query(request: &PageRequest<'_>) -> anyhow::Result<HashMap<&'static str, String>> {
    let mut query = hashmap! {
        "max_results" => "100".to_string(),
        "tweet.fields" => "created_at,author_id,referenced_tweets".to_string(),
    };
    if let Some(since_id) = request.since_id {
        query.insert("since_id", since_id.to_string());
    }
    match &request.cursor {
        None => {}
        Some(PageCursor::Token(token)) => {
            query.insert("pagination_token", token.clone());
        }
        Some(other) => bail!("Unsupported cursor for API v2: {:?}", other),
    }
    Ok(query)
}

fn convert_tweets(
    tweets: Vec<GetTweetsTweet>,
    user_id: u64,
    username: &str,
) -> anyhow::Result<Vec<TimelineItem>> {
    tweets
        .into_iter()
        .map(|tweet| {
            let author = match tweet.author_id {
                Some(id) => id.parse::<u64>().context("Couldn't parse author id")?,
                None => user_id,
            };
            Ok(TimelineItem {
                id: tweet.id.parse::<u64>().context("Couldn't parse tweet id")?,
                user_id: author,
                screen_name: username.to_string(),
                created_at: tweet.created_at,
                text: tweet.text,
                is_retweet: tweet.referenced_tweets.iter().any(|r| r.r#type == "retweeted"),
            })
        })
        .collect::<anyhow::Result<_>>()
}
