//! Database connection management
//!
//! Opens and configures SQLite connections, holds the single process-wide
//! connection, and provides the scoped transaction used by every multi-row
//! write.

use crate::errors::{from_rusqlite, io_error, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "PEDIDOS_DB";

/// Default on-disk location, relative to the working directory
pub const DEFAULT_DB_PATH: &str = "Data/database.sqlite";

/// One connection shared by every repository in the process
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Where the store lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file; `None` opens an in-memory database
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// Default location unless `PEDIDOS_DB` is set
    pub fn from_env() -> Self {
        match std::env::var_os(DB_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::at(path),
            _ => Self::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::at(DEFAULT_DB_PATH)
    }
}

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Enable foreign keys and WAL journaling
///
/// Cascade delete of line items depends on `foreign_keys`; SQLite leaves it
/// off per connection by default.
pub fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(from_rusqlite)?;

    // In-memory databases report "memory" and stay that way
    let journal_mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(from_rusqlite)?;

    tracing::debug!(journal_mode = %journal_mode, "sqlite connection configured");

    Ok(())
}

/// Open, configure and bootstrap the schema
///
/// Creates the parent directory of an on-disk database when missing.
pub fn open_store(config: &StoreConfig) -> Result<Connection> {
    let mut conn = match &config.path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| io_error("create_data_dir", e))?;
            }
            open(path)?
        }
        None => open_in_memory()?,
    };

    configure(&conn)?;
    crate::migrations::apply_migrations(&mut conn)?;

    Ok(conn)
}

/// Wrap an already-configured connection for sharing
pub fn shared(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

static GLOBAL: OnceLock<SharedConnection> = OnceLock::new();

/// The process-wide connection
///
/// The first call opens the store described by `config`; later calls return
/// the same handle and ignore `config`.
pub fn global(config: &StoreConfig) -> Result<SharedConnection> {
    if let Some(conn) = GLOBAL.get() {
        return Ok(conn.clone());
    }

    let conn = shared(open_store(config)?);
    Ok(GLOBAL.get_or_init(|| conn).clone())
}

/// Run `f` inside one transaction
///
/// Commits when `f` returns `Ok`, rolls back when it returns `Err`. Any other
/// exit (a panic unwinding through `f`) drops the transaction, which also
/// rolls back.
pub fn with_transaction<T, F>(conn: &mut Connection, op: &str, f: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| from_rusqlite(e).with_op(op))?;

    match f(&tx) {
        Ok(value) => {
            tx.commit().map_err(|e| from_rusqlite(e).with_op(op))?;
            tracing::debug!(op, "transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::debug!(op, error = %rollback_err, "explicit rollback failed");
            }
            tracing::debug!(op, err_code = err.code(), "transaction rolled back");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedidos_core::ExErrorKind;

    #[test]
    fn test_configure_enables_foreign_keys() {
        let conn = open_in_memory().unwrap();
        configure(&conn).unwrap();

        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_configure_sets_wal_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let conn = open(dir.path().join("wal.db")).unwrap();
        configure(&conn).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_open_store_creates_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Data").join("database.sqlite");

        let conn = open_store(&StoreConfig::at(&path)).unwrap();
        assert!(path.exists());

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('orders', 'line_items')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_default_config_points_at_data_dir() {
        assert_eq!(
            StoreConfig::default().path,
            Some(PathBuf::from("Data/database.sqlite"))
        );
        assert_eq!(StoreConfig::in_memory().path, None);
    }

    #[test]
    fn test_from_env_honours_override() {
        std::env::set_var(DB_PATH_ENV, "/tmp/pedidos-env.sqlite");
        assert_eq!(
            StoreConfig::from_env(),
            StoreConfig::at("/tmp/pedidos-env.sqlite")
        );

        // An empty value falls back to the default location
        std::env::set_var(DB_PATH_ENV, "");
        assert_eq!(StoreConfig::from_env(), StoreConfig::default());

        std::env::remove_var(DB_PATH_ENV);
        assert_eq!(StoreConfig::from_env(), StoreConfig::default());
    }

    #[test]
    fn test_with_transaction_commits_on_ok() {
        let mut conn = open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL);")
            .unwrap();

        with_transaction(&mut conn, "insert", |tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])
                .map_err(from_rusqlite)?;
            Ok(())
        })
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_with_transaction_rolls_back_on_err() {
        let mut conn = open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL);")
            .unwrap();

        let err = with_transaction(&mut conn, "insert", |tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])
                .map_err(from_rusqlite)?;
            tx.execute("INSERT INTO t (v) VALUES (NULL)", [])
                .map_err(from_rusqlite)?;
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_global_returns_same_handle() {
        let first = global(&StoreConfig::in_memory()).unwrap();
        let second = global(&StoreConfig::at("ignored/after/first.sqlite")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
