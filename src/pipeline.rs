use crate::config::Credentials;
use crate::cursor::ingest;
use crate::error::IngestError;
use crate::resume::resolve;
use crate::store::TweetStore;
use crate::twitter::{connect, Api, TimelineSource};
use std::path::Path;

/// Incremental harvesting of account timelines into a [`TweetStore`].
///
/// Running two pipelines for the same account at the same time can store duplicates:
/// the resume point is read once, at the start of a run.
pub struct Pipeline {
    source: Box<dyn TimelineSource>,
}

impl Pipeline {
    pub fn new(source: Box<dyn TimelineSource>) -> Self {
        Self { source }
    }

    /// Reads the credentials file and connects to `api`.
    pub async fn from_credentials(auth: impl AsRef<Path>, api: Api) -> Result<Self, IngestError> {
        let credentials = Credentials::load(auth).await?;
        Ok(Self::new(connect(&credentials, api)?))
    }

    /// Fetches everything newer than the stored tweets of `account` and stores it.
    /// Returns the number of new records.
    pub async fn run<S: TweetStore + ?Sized>(
        &self,
        store: &mut S,
        account: &str,
        include_retweets: bool,
    ) -> Result<usize, IngestError> {
        let since_id = resolve(&*store, account)?;
        match since_id {
            Some(id) => log::info!("Fetching tweets for {} newer than {}", account, id),
            None => log::info!("Fetching all available tweets for {}", account),
        }
        let records = ingest(self.source.as_ref(), account, since_id, include_retweets).await?;
        if records.is_empty() {
            log::info!("No new tweets for {}", account);
            return Ok(0);
        }
        store.insert_many(&records)?;
        log::info!("Stored {} new tweets for {}", records.len(), account);
        Ok(records.len())
    }

    /// Runs each account in turn, returning the total number of new records.
    ///
    /// With `continue_on_error` a failed account is logged and skipped, otherwise the
    /// first failure is returned and later accounts are not attempted.
    pub async fn run_all<S: TweetStore + ?Sized>(
        &self,
        store: &mut S,
        accounts: &[String],
        include_retweets: bool,
        continue_on_error: bool,
    ) -> Result<usize, IngestError> {
        let mut total = 0;
        for account in accounts {
            match self.run(store, account, include_retweets).await {
                Ok(count) => total += count,
                Err(e) if continue_on_error => {
                    log::warn!("Error harvesting tweets for: {}, ignoring... ({})", account, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::cursor::tests::{retweet, tweet, two_pages, ScriptedSource};
    use crate::error::StoreError;
    use crate::model::{TimelineItem, TweetRecord};
    use crate::store::sqlite::Session;
    use crate::twitter::{Page, PageRequest};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Wraps a session and counts `insert_many` calls.
    struct RecordingStore {
        inner: Session,
        inserts: usize,
        fail_inserts: bool,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                inner: Session::open_in_memory().unwrap(),
                inserts: 0,
                fail_inserts: false,
            }
        }
    }

    impl TweetStore for RecordingStore {
        fn insert_many(&mut self, records: &[TweetRecord]) -> Result<(), StoreError> {
            self.inserts += 1;
            if self.fail_inserts {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.inner.insert_many(records)
        }

        fn max_id(&self, screen_name: &str) -> Result<Option<u64>, StoreError> {
            self.inner.max_id(screen_name)
        }

        fn select_all(&self, screen_name: &str) -> Result<Vec<String>, StoreError> {
            self.inner.select_all(screen_name)
        }
    }

    /// Lets a test keep a handle on the source after giving it to the pipeline.
    struct Shared(Arc<ScriptedSource>);

    #[async_trait]
    impl TimelineSource for Shared {
        async fn fetch_page(&self, request: &PageRequest<'_>) -> anyhow::Result<Page> {
            self.0.fetch_page(request).await
        }
    }

    fn scripted(pages: Vec<Result<Vec<TimelineItem>, String>>) -> (Pipeline, Arc<ScriptedSource>) {
        let source = Arc::new(ScriptedSource::new(pages));
        (Pipeline::new(Box::new(Shared(source.clone()))), source)
    }

    #[tokio::test]
    async fn bad_credentials_fail_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("auth.json");
        assert!(matches!(
            Pipeline::from_credentials(&missing, Api::V1).await.err().unwrap(),
            IngestError::Configuration(ConfigError::Unreadable { .. })
        ));

        let auth = dir.path().join("keys.json");
        std::fs::write(
            &auth,
            r#"{"twitter": {"consumer_key": "a", "consumer_secret": "b",
                "access_token": "c", "access_secret": "d"}}"#,
        )
        .unwrap();
        assert!(matches!(
            Pipeline::from_credentials(&auth, Api::V2).await.err().unwrap(),
            IngestError::Configuration(ConfigError::MissingField("bearer_token"))
        ));
        assert!(Pipeline::from_credentials(&auth, Api::V1).await.is_ok());
    }

    #[tokio::test]
    async fn first_run_stores_everything_but_retweets() {
        init_logging();
        let (pipeline, source) = scripted(two_pages());
        let mut store = RecordingStore::new();

        let stored = pipeline.run(&mut store, "alice", false).await.unwrap();
        assert_eq!(stored, 7);
        assert_eq!(store.inserts, 1);
        assert_eq!(store.select_all("alice").unwrap().len(), 7);
        assert_eq!(source.requests.lock().unwrap()[0].since_id, None);
        assert_eq!(store.max_id("alice").unwrap(), Some(108));
    }

    #[tokio::test]
    async fn nothing_new_means_no_insert() {
        init_logging();
        let mut store = RecordingStore::new();
        store
            .inner
            .insert_many(&[TweetRecord::from(tweet(1000))])
            .unwrap();
        let (pipeline, source) = scripted(vec![]);

        let stored = pipeline.run(&mut store, "alice", false).await.unwrap();
        assert_eq!(stored, 0);
        assert_eq!(store.inserts, 0);
        assert_eq!(source.requests.lock().unwrap()[0].since_id, Some(1000));
    }

    #[tokio::test]
    async fn second_run_resumes_and_stores_nothing() {
        init_logging();
        let mut store = RecordingStore::new();
        let (first, _) = scripted(two_pages());
        assert_eq!(first.run(&mut store, "alice", false).await.unwrap(), 7);

        let (second, source) = scripted(vec![]);
        assert_eq!(second.run(&mut store, "alice", false).await.unwrap(), 0);
        assert_eq!(store.inserts, 1);
        assert_eq!(source.requests.lock().unwrap()[0].since_id, Some(108));
        assert_eq!(store.select_all("alice").unwrap().len(), 7);
    }

    #[tokio::test]
    async fn resume_point_follows_new_inserts() {
        init_logging();
        let mut store = RecordingStore::new();
        store
            .inner
            .insert_many(&[TweetRecord::from(tweet(50))])
            .unwrap();
        let (pipeline, _) = scripted(vec![Ok(vec![tweet(53), retweet(52), tweet(51)])]);

        assert_eq!(pipeline.run(&mut store, "alice", true).await.unwrap(), 3);
        assert_eq!(resolve(&store, "alice").unwrap(), Some(53));
    }

    #[tokio::test]
    async fn fetch_failure_stores_nothing() {
        init_logging();
        let (pipeline, source) = scripted(vec![
            Ok(vec![tweet(3)]),
            Err("connection reset".to_string()),
            Ok(vec![tweet(1)]),
        ]);
        let mut store = RecordingStore::new();

        let err = pipeline.run(&mut store, "alice", false).await.unwrap_err();
        assert!(matches!(err, IngestError::RemoteFetchFailed { .. }));
        assert_eq!(store.inserts, 0);
        assert_eq!(source.request_count(), 2);
        assert!(store.select_all("alice").unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_propagated() {
        init_logging();
        let (pipeline, _) = scripted(two_pages());
        let mut store = RecordingStore::new();
        store.fail_inserts = true;

        let err = pipeline.run(&mut store, "alice", false).await.unwrap_err();
        assert!(matches!(err, IngestError::StorageUnavailable(_)));
        assert_eq!(store.inserts, 1);
        assert_eq!(store.max_id("alice").unwrap(), None);
    }

    #[tokio::test]
    async fn run_all_skips_failed_accounts_when_asked() {
        init_logging();
        let accounts = vec!["alice".to_string(), "bob".to_string()];

        let (pipeline, _) = scripted(vec![Err("suspended".to_string()), Ok(vec![tweet(9)])]);
        let mut store = RecordingStore::new();
        assert_eq!(
            pipeline
                .run_all(&mut store, &accounts, false, true)
                .await
                .unwrap(),
            1
        );

        let (pipeline, source) = scripted(vec![Err("suspended".to_string()), Ok(vec![tweet(9)])]);
        let mut store = RecordingStore::new();
        assert!(pipeline
            .run_all(&mut store, &accounts, false, false)
            .await
            .is_err());
        assert_eq!(source.request_count(), 1);
        assert_eq!(store.inserts, 0);
    }
}
