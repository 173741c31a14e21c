use crate::error::StoreError;
use crate::model::TweetRecord;
use crate::store::TweetStore;
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};

// No uniqueness constraint on tweet_id: the resume point keeps runs from re-inserting.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tweets (
        user_id INTEGER,
        screen_name TEXT,
        tweet_id INTEGER,
        created_at TEXT,
        tweet TEXT
    );
    CREATE INDEX IF NOT EXISTS tweets_screen_name_tweet_id
        ON tweets (screen_name COLLATE NOCASE, tweet_id);
";

/// Location of a tweet database. Connections are handed out as [`Session`]s.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Creates the database file and schema if they don't exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let db = Self { path };
        db.session()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a connection; it is closed when the session is dropped.
    pub fn session(&self) -> Result<Session, StoreError> {
        log::debug!("Opening database {}", self.path.display());
        Session::new(Connection::open(&self.path)?)
    }
}

pub struct Session {
    conn: Connection,
}

impl Session {
    fn new(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::new(Connection::open_in_memory()?)
    }
}

impl TweetStore for Session {
    fn insert_many(&mut self, records: &[TweetRecord]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tweets (user_id, screen_name, tweet_id, created_at, tweet)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in records {
                stmt.execute(params![
                    sql_id(record.user_id)?,
                    record.screen_name,
                    sql_id(record.tweet_id)?,
                    record.created_at,
                    record.text,
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("Inserted {} records", records.len());
        Ok(())
    }

    fn max_id(&self, screen_name: &str) -> Result<Option<u64>, StoreError> {
        // MAX over no rows yields a single NULL row
        Ok(self.conn.query_row(
            "SELECT MAX(tweet_id) FROM tweets WHERE screen_name = ?1 COLLATE NOCASE",
            params![screen_name],
            |row| row.get::<_, Option<u64>>(0),
        )?)
    }

    fn select_all(&self, screen_name: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT tweet FROM tweets WHERE screen_name = ?1 COLLATE NOCASE ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![screen_name], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

fn sql_id(id: u64) -> Result<i64, StoreError> {
    i64::try_from(id).map_err(|_| StoreError::IdOutOfRange(id))
}
