//! SQLite bundle store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::ServiceError;

const SCHEMA_VERSION: i64 = 1;

/// Durable bundle metadata backed by a single SQLite connection
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        let store = Self::with_connection(conn)?;
        info!("Opened bundle database at {}", path.display());
        Ok(store)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self, ServiceError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ServiceError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.configure_pragmas()?;
        store.initialize_schema()?;
        Ok(store)
    }

    /// Lock the connection. A poisoned lock still yields a usable connection
    /// since every write runs inside a transaction.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn configure_pragmas(&self) -> Result<(), ServiceError> {
        // journal_mode returns a row
        self.conn()
            .pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        self.conn().execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("database pragmas configured");
        Ok(())
    }

    /// Current `user_version` of the database
    pub fn schema_version(&self) -> Result<i64, ServiceError> {
        let version = self
            .conn()
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        Ok(version)
    }

    fn initialize_schema(&self) -> Result<(), ServiceError> {
        let current_version = self.schema_version()?;
        if current_version > SCHEMA_VERSION {
            return Err(ServiceError::ConfigError(format!(
                "database schema v{current_version} is newer than supported v{SCHEMA_VERSION}"
            )));
        }
        if current_version == SCHEMA_VERSION {
            return Ok(());
        }

        // v0 is either a fresh file or a bundles table from releases that
        // never stamped user_version; the column layout is the same.
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS bundles (
                id TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                targetAppVersion TEXT NOT NULL,
                shouldForceUpdate INTEGER NOT NULL DEFAULT 0,
                enabled INTEGER NOT NULL DEFAULT 1,
                fileHash TEXT NOT NULL,
                gitCommitHash TEXT,
                message TEXT,
                channel TEXT NOT NULL DEFAULT 'production'
            );
            CREATE INDEX IF NOT EXISTS idx_bundles_platform_channel_id
                ON bundles(platform, channel, id);
            UPDATE bundles SET channel = 'production' WHERE channel IS NULL;
            UPDATE bundles SET enabled = 0 WHERE enabled IS NULL;
            UPDATE bundles SET shouldForceUpdate = 0 WHERE shouldForceUpdate IS NULL;",
        )?;
        self.conn()
            .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "bundle schema initialized"
        );
        Ok(())
    }
}
