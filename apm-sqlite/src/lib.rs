#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use sqlx::sqlite;
use std::{str::FromStr, time::Duration};
use tokio::try_join;

pub mod config;
mod r#impl;
pub mod types;

use config::SqliteConfig;

/// SQLite database implementation of the marketplace repositories.
///
/// Separate reader and writer connection pools follow SQLite best practices
/// for Write-Ahead Logging: reads run concurrently while writes serialize on
/// a single connection. That single writer connection is also what makes the
/// bid check-then-write sequence race-free; see
/// [`BidRepository::place_bid`](apm_core::ports::BidRepository::place_bid).
#[derive(Clone)]
pub struct Db {
    /// Connection pool for read operations
    pub reader: sqlx::Pool<sqlx::Sqlite>,
    /// Connection pool for write operations (limited to 1 connection)
    pub writer: sqlx::Pool<sqlx::Sqlite>,
}

impl Db {
    /// Open a connection to the specified SQLite database.
    ///
    /// Creates the database if missing (when `create_if_missing` is set) and
    /// applies all pending migrations. With no `database_path`, a uniquely
    /// named shared-cache in-memory database is used, so both pools see the
    /// same data but separate `open` calls stay isolated.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the connection fails or migrations cannot
    /// be applied.
    pub async fn open(config: &SqliteConfig) -> Result<Self, sqlx::Error> {
        let url = match &config.database_path {
            Some(path) => path.to_string_lossy().into_owned(),
            None => format!(
                "file:apm-{}?mode=memory&cache=shared",
                uuid::Uuid::new_v4().simple()
            ),
        };

        let options = sqlite::SqliteConnectOptions::from_str(&url)?
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .journal_mode(sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlite::SqliteSynchronous::Normal)
            .pragma("journal_size_limit", "27103364")
            .pragma("mmap_size", "134217728")
            .pragma("temp_store", "memory")
            .create_if_missing(config.create_if_missing);

        let reader = sqlite::SqlitePoolOptions::new().connect_with(options.clone());
        let writer = sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options);

        let (reader, writer) = try_join!(reader, writer)?;

        // Run any pending migrations before returning
        sqlx::migrate!("./schema").run(&writer).await?;

        Ok(Self { reader, writer })
    }
}
