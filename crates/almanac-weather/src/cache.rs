//! SQLite-backed reading cache.
//!
//! One row per calendar date; every write is an insert-or-replace, so the
//! latest reading for a date is the only one kept.

use std::path::Path;
use std::sync::Arc;

use almanac_core::{DatabaseError, RusqliteErrorExt};
use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::types::CachedReading;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persistence contract for cached readings.
pub trait WeatherStore: Send + Sync {
    /// Insert or replace the row for `reading.date`.
    fn upsert(&self, reading: &CachedReading) -> Result<(), DatabaseError>;

    /// Insert or replace many rows in one transaction.
    fn upsert_all(&self, readings: &[CachedReading]) -> Result<(), DatabaseError>;

    /// Exact-date lookup.
    fn find_by_date(&self, date: NaiveDate) -> Result<Option<CachedReading>, DatabaseError>;
}

/// SQLite reading cache.
pub struct SqliteWeatherStore {
    conn: Mutex<Connection>,
}

impl SqliteWeatherStore {
    /// Open (or create) the cache at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
            }
        }
        let conn = Connection::open(path).map_err(|e| e.into_database_error())?;
        tracing::debug!("Opened weather cache at {}", path.display());
        Self::with_connection(conn)
    }

    /// Create an in-memory cache.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|e| e.into_database_error())?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS weather (
                    date TEXT PRIMARY KEY NOT NULL,
                    maxTemp REAL NOT NULL,
                    minTemp REAL NOT NULL
                );
                "#,
            )
            .map_err(|e| e.into_database_error())
    }

    /// Number of cached dates.
    pub fn count(&self) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM weather", [], |row| row.get(0))
            .map_err(|e| e.into_database_error())?;
        Ok(count as usize)
    }

    fn insert_row(conn: &Connection, reading: &CachedReading) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR REPLACE INTO weather (date, maxTemp, minTemp) VALUES (?1, ?2, ?3)",
            params![
                reading.date.format(DATE_FORMAT).to_string(),
                reading.max_temp,
                reading.min_temp,
            ],
        )
    }
}

impl WeatherStore for SqliteWeatherStore {
    fn upsert(&self, reading: &CachedReading) -> Result<(), DatabaseError> {
        Self::insert_row(&self.conn.lock(), reading).map_err(|e| e.into_database_error())?;
        tracing::debug!("Cached reading for {}", reading.date);
        Ok(())
    }

    fn upsert_all(&self, readings: &[CachedReading]) -> Result<(), DatabaseError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| e.into_database_error())?;
        for reading in readings {
            Self::insert_row(&tx, reading).map_err(|e| e.into_database_error())?;
        }
        tx.commit().map_err(|e| e.into_database_error())?;
        tracing::debug!("Cached {} readings", readings.len());
        Ok(())
    }

    fn find_by_date(&self, date: NaiveDate) -> Result<Option<CachedReading>, DatabaseError> {
        let key = date.format(DATE_FORMAT).to_string();
        let row = self
            .conn
            .lock()
            .query_row(
                "SELECT maxTemp, minTemp FROM weather WHERE date = ?1",
                params![key],
                |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
            )
            .optional()
            .map_err(|e| e.into_database_error())?;

        Ok(row.map(|(max_temp, min_temp)| CachedReading {
            date,
            max_temp,
            min_temp,
        }))
    }
}

/// Run a store call on the blocking pool so SQLite I/O stays off the async workers.
pub async fn run_blocking<T, R, F>(store: &Arc<T>, f: F) -> Result<R, DatabaseError>
where
    T: WeatherStore + ?Sized + 'static,
    R: Send + 'static,
    F: FnOnce(&T) -> Result<R, DatabaseError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(&*store))
        .await
        .map_err(|e| DatabaseError::QueryFailed(format!("storage task failed: {}", e)))?
}
