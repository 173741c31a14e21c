use crate::error::IngestError;
use crate::store::TweetStore;

/// The `since_id` for the next run of `account`: the newest stored tweet, or `None`
/// to fetch the timeline from the start.
pub fn resolve<S: TweetStore + ?Sized>(
    store: &S,
    account: &str,
) -> Result<Option<u64>, IngestError> {
    Ok(store.max_id(account)?)
}
