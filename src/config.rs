use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read credentials file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to deserialize credentials file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Credentials file has no \"twitter\" section")]
    MissingSection,
    #[error("Missing required credential: {0}")]
    MissingField(&'static str),
    #[error("Invalid credential: {0}")]
    InvalidField(&'static str),
    #[error("Unable to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// On-disk layout: `{ "twitter": { "consumer_key": ..., ... } }`
#[derive(Deserialize)]
struct AuthFile {
    twitter: Option<RawCredentials>,
}

#[derive(Deserialize)]
struct RawCredentials {
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    access_token: Option<String>,
    access_secret: Option<String>,
    bearer_token: Option<String>,
}

#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
    /// Only needed for API v2
    pub bearer_token: Option<String>,
}

impl Credentials {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!("Reading credentials file: {}", path.display());
        let contents = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let file =
            serde_json::from_str::<AuthFile>(&contents).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        let raw = file.twitter.ok_or(ConfigError::MissingSection)?;
        Ok(Self {
            consumer_key: required(raw.consumer_key, "consumer_key")?,
            consumer_secret: required(raw.consumer_secret, "consumer_secret")?,
            access_token: required(raw.access_token, "access_token")?,
            access_secret: required(raw.access_secret, "access_secret")?,
            bearer_token: raw.bearer_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn bearer(&self) -> Result<&str, ConfigError> {
        self.bearer_token
            .as_deref()
            .ok_or(ConfigError::MissingField("bearer_token"))
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField(name))
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_secret", &"<redacted>")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
