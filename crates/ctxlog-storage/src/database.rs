//! SQLite database with per-query logging.
//!
//! Every statement run through a [`Session`] is reported to the database's
//! [`QueryLogger`] once it completes, together with the request [`Context`]
//! it ran under. The query methods are `#[track_caller]`, so records point at
//! the application line that issued the query.
//!
//! ```rust,ignore
//! let db = Database::open(&path)?;
//! let ctx = attach_fields(&Context::background(), [Field::string("request_id", id)]);
//!
//! let name: String = db.session().query_row(
//!     &ctx,
//!     "SELECT name FROM users WHERE id = ?",
//!     params![7],
//!     |row| row.get(0),
//! )?;
//!
//! // Log every statement of this one call, whatever the configured level.
//! db.debug().execute(&ctx, "DELETE FROM sessions WHERE user_id = ?", params![7])?;
//! ```

use std::error::Error as StdError;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context as _, Result};
use ctxlog_core::Context;
use rusqlite::{Connection, Row, ToSql};
use tracing::debug;

use crate::config::TraceLevel;
use crate::explain::explain_sql;
use crate::query_logger::QueryLogger;
use crate::default_query_logger;

/// Row count reported when it is not known.
const UNKNOWN_ROWS: i64 = -1;

/// SQLite database wrapper.
pub struct Database {
    conn: Connection,
    logger: Arc<dyn QueryLogger>,
}

impl Database {
    /// Open a database at the given path, logging queries with the default
    /// [`SqlLogger`](crate::SqlLogger).
    ///
    /// If the database doesn't exist, it will be created.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_logger(path, default_query_logger())
    }

    /// Open a database at the given path with a custom query logger.
    pub fn open_with_logger(path: &Path, logger: Arc<dyn QueryLogger>) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        debug!("Opened database at {:?}", path);

        Ok(Self { conn, logger })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_logger(default_query_logger())
    }

    pub fn open_in_memory_with_logger(logger: Arc<dyn QueryLogger>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        debug!("Opened in-memory database");

        Ok(Self { conn, logger })
    }

    pub fn set_logger(&mut self, logger: Arc<dyn QueryLogger>) {
        self.logger = logger;
    }

    pub fn logger(&self) -> &Arc<dyn QueryLogger> {
        &self.logger
    }

    /// Get a reference to the underlying connection.
    ///
    /// Statements run directly on it are not logged.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Session logging with the configured logger.
    pub fn session(&self) -> Session<'_> {
        Session {
            conn: &self.conn,
            logger: self.logger.clone(),
        }
    }

    /// Session logging every statement, regardless of the configured level.
    pub fn debug(&self) -> Session<'_> {
        self.session_with_level(TraceLevel::Info)
    }

    /// Session logging at `level`; the database's logger is left as is.
    pub fn session_with_level(&self, level: TraceLevel) -> Session<'_> {
        Session {
            conn: &self.conn,
            logger: self.logger.log_mode(level),
        }
    }
}

/// Borrowed view of a [`Database`] that logs every statement it runs.
pub struct Session<'db> {
    conn: &'db Connection,
    logger: Arc<dyn QueryLogger>,
}

impl Session<'_> {
    pub fn logger(&self) -> &Arc<dyn QueryLogger> {
        &self.logger
    }

    /// Execute a statement, returning the number of changed rows.
    #[track_caller]
    pub fn execute(
        &self,
        ctx: &Context,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> rusqlite::Result<usize> {
        let begin = Instant::now();
        let result = self.conn.execute(sql, params);
        let rows = match &result {
            Ok(changed) => i64::try_from(*changed).unwrap_or(i64::MAX),
            Err(_) => UNKNOWN_ROWS,
        };
        self.trace(ctx, begin, sql, params, rows, result.as_ref().err());
        result
    }

    /// Run a query expected to return at least one row and map the first one.
    ///
    /// Fails with [`rusqlite::Error::QueryReturnedNoRows`] when nothing
    /// matches.
    #[track_caller]
    pub fn query_row<T, F>(
        &self,
        ctx: &Context,
        sql: &str,
        params: &[&dyn ToSql],
        f: F,
    ) -> rusqlite::Result<T>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let begin = Instant::now();
        let result = self.conn.query_row(sql, params, f);
        let rows = match &result {
            Ok(_) => 1,
            Err(rusqlite::Error::QueryReturnedNoRows) => 0,
            Err(_) => UNKNOWN_ROWS,
        };
        self.trace(ctx, begin, sql, params, rows, result.as_ref().err());
        result
    }

    /// Run a query and map every returned row.
    #[track_caller]
    pub fn query_map<T, F>(
        &self,
        ctx: &Context,
        sql: &str,
        params: &[&dyn ToSql],
        f: F,
    ) -> rusqlite::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let begin = Instant::now();
        let result = self.conn.prepare(sql).and_then(|mut stmt| {
            let items = stmt
                .query_map(params, f)?
                .collect::<rusqlite::Result<Vec<T>>>();
            items
        });
        let rows = match &result {
            Ok(items) => i64::try_from(items.len()).unwrap_or(i64::MAX),
            Err(_) => UNKNOWN_ROWS,
        };
        self.trace(ctx, begin, sql, params, rows, result.as_ref().err());
        result
    }

    /// Execute several `;`-separated statements without parameters.
    #[track_caller]
    pub fn execute_batch(&self, ctx: &Context, sql: &str) -> rusqlite::Result<()> {
        let begin = Instant::now();
        let result = self.conn.execute_batch(sql);
        self.trace(ctx, begin, sql, &[], UNKNOWN_ROWS, result.as_ref().err());
        result
    }

    /// Run `f` inside a transaction, committing when it succeeds.
    ///
    /// The transaction rolls back when `f` fails.
    pub fn transaction<T, F>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Session<'_>) -> rusqlite::Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let result = f(self)?;
        tx.commit()?;
        Ok(result)
    }

    #[track_caller]
    fn trace(
        &self,
        ctx: &Context,
        begin: Instant,
        sql: &str,
        params: &[&dyn ToSql],
        rows: i64,
        err: Option<&rusqlite::Error>,
    ) {
        let details = || {
            let (sql, params) = self.logger.params_filter(ctx, sql, params);
            (explain_sql(sql, params), rows)
        };
        let err = err.map(|e| e as &(dyn StdError + 'static));
        self.logger.trace(ctx, begin, &details, err);
    }
}
