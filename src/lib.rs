//! Incremental harvesting of Twitter timelines into SQLite.
//!
//! Each run resumes from the newest tweet already stored for an account, drains the
//! remote timeline page by page and appends the new tweets in a single transaction.

pub mod config;
pub mod cursor;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod resume;
pub mod store;
pub mod twitter;

pub use config::{ConfigError, Credentials};
pub use error::{IngestError, StoreError};
pub use model::{TimelineItem, TweetRecord};
pub use pipeline::Pipeline;
pub use store::sqlite::{Database, Session};
pub use store::TweetStore;
pub use twitter::{connect, Api, TimelineSource};
