use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::types::StoreError;

/// Default database file name inside the config directory.
pub const DEFAULT_DATABASE_FILE: &str = "selection.db";

/// Key of the single selection record in `selected_items_store`.
pub const RECORD_KEY: &str = "state";

// ============================================================================
// Selection Store
// ============================================================================

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite-backed storage for the persisted selection snapshot.
///
/// Construction does no I/O. The connection pool is opened lazily by the first
/// operation (or an explicit [`initialize`](Self::initialize)) and shared by every
/// clone of the store.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    location: Location,
    pub(crate) pool: Arc<OnceCell<SqlitePool>>,
}

impl SelectionStore {
    /// Store backed by the database file at `path` (created if missing).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            pool: Arc::new(OnceCell::new()),
        }
    }

    /// Store backed by a private in-memory database that lives as long as the
    /// store and its clones.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            pool: Arc::new(OnceCell::new()),
        }
    }

    /// Whether the connection pool has been established.
    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    /// Open the database and create the record store if it does not exist.
    ///
    /// Idempotent. Concurrent callers share one in-flight initialization and
    /// all observe the same pool once it completes. If initialization fails
    /// the handle stays unset, so a later call retries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::StorageUnavailable` if the database cannot be
    /// opened or migrated.
    pub async fn initialize(&self) -> Result<&SqlitePool, StoreError> {
        self.pool.get_or_try_init(|| self.open()).await
    }

    async fn open(&self) -> Result<SqlitePool, StoreError> {
        let pool = match &self.location {
            Location::File(path) => {
                // Pre-create the file owner-only so it never exists with umask permissions
                #[cfg(unix)]
                if !path.exists() {
                    use std::os::unix::fs::OpenOptionsExt;
                    if let Some(parent) = path.parent().filter(|p| p.exists()) {
                        tracing::trace!(dir = %parent.display(), "Creating selection database");
                        let _file = std::fs::OpenOptions::new()
                            .write(true)
                            .create_new(true)
                            .mode(0o600)
                            .open(path)
                            .ok(); // SQLite reports the real error at connect time
                    }
                }

                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .pragma("busy_timeout", "5000");
                // Single record, single writer; a small pool covers the reader
                // running alongside a queued save.
                SqlitePoolOptions::new()
                    .max_connections(2)
                    .acquire_timeout(Duration::from_secs(10))
                    .connect_with(options)
                    .await?
            }
            Location::Memory => {
                let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
                // An in-memory database dies with its last connection: keep exactly one, forever.
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await?
            }
        };

        Self::migrate(&pool).await?;

        match &self.location {
            Location::File(path) => {
                tracing::debug!(path = %path.display(), "Selection store initialized")
            }
            Location::Memory => tracing::debug!("In-memory selection store initialized"),
        }
        Ok(pool)
    }

    /// Create the record store.
    ///
    /// Uses `IF NOT EXISTS`, so re-running on an existing database is a no-op.
    async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        // One row per key; only RECORD_KEY is ever written
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS selected_items_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
