use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Configuration(
        #[source]
        #[from]
        ConfigError,
    ),
    /// Nothing was committed; the run is safe to retry unmodified.
    #[error("Unable to fetch timeline for {account}: {source:#}")]
    RemoteFetchFailed {
        account: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(
        #[source]
        #[from]
        StoreError,
    ),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(
        #[source]
        #[from]
        rusqlite::Error,
    ),
    #[error("Unable to create database directory: {0}")]
    Io(
        #[source]
        #[from]
        std::io::Error,
    ),
    #[error("Tweet id {0} does not fit in an SQLite integer")]
    IdOutOfRange(u64),
}
