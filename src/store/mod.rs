pub mod sqlite;

use crate::error::StoreError;
use crate::model::TweetRecord;

/// Persistence for harvested tweets. Append-only: there is no update or delete.
pub trait TweetStore {
    /// Stores all records or none of them.
    fn insert_many(&mut self, records: &[TweetRecord]) -> Result<(), StoreError>;

    /// Highest stored tweet id for `screen_name`, `None` when nothing is stored.
    fn max_id(&self, screen_name: &str) -> Result<Option<u64>, StoreError>;

    /// Tweet texts for `screen_name` in insertion order.
    fn select_all(&self, screen_name: &str) -> Result<Vec<String>, StoreError>;
}
