use crate::error::IngestError;
use crate::model::TweetRecord;
use crate::twitter::{PageRequest, TimelineSource};

/// The provider never serves more than this many timeline items per account.
pub const HISTORY_CAP: usize = 3200;

/// Drains `source` page by page, newest first.
///
/// With `since_id` set only tweets newer than it are requested; the provider does the
/// filtering. Retweets are dropped unless `include_retweets` is set. On a failed page
/// nothing collected so far is returned.
pub async fn ingest(
    source: &dyn TimelineSource,
    account: &str,
    since_id: Option<u64>,
    include_retweets: bool,
) -> Result<Vec<TweetRecord>, IngestError> {
    let mut request = PageRequest {
        account,
        since_id,
        include_retweets,
        cursor: None,
    };
    let mut seen = 0;
    let mut records = Vec::new();
    loop {
        let page = source
            .fetch_page(&request)
            .await
            .map_err(|source| IngestError::RemoteFetchFailed {
                account: account.to_string(),
                source,
            })?;
        if page.items.is_empty() {
            break;
        }
        seen += page.items.len();
        log::debug!("Fetched page of {} items for {}", page.items.len(), account);
        records.extend(
            page.items
                .into_iter()
                .filter(|item| include_retweets || !item.is_retweet)
                .map(TweetRecord::from),
        );
        if seen >= HISTORY_CAP {
            log::info!("Reached the {} item history limit for {}", HISTORY_CAP, account);
            break;
        }
        match page.next {
            Some(next) => request.cursor = Some(next),
            None => break,
        }
    }
    Ok(records)
}
