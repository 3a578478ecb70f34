//! The logging contract the query session drives.
//!
//! [`Session`](crate::Session) calls into a [`QueryLogger`] for every
//! statement it runs. The methods are `#[track_caller]`, so an
//! implementation calling `Location::caller()` sees the application line
//! that issued the query.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use ctxlog_core::Context;
use rusqlite::ToSql;

use crate::config::TraceLevel;

/// Lazily produces the statement text and affected-row count of a finished
/// query. Building the text may be expensive, so it is only called once a
/// record is actually going to be emitted.
pub type QueryDetails<'a> = &'a dyn Fn() -> (String, i64);

/// Query logging interface consumed by the storage session.
pub trait QueryLogger: Send + Sync {
    /// Copy of this logger with `level` in place of the configured level.
    fn log_mode(&self, level: TraceLevel) -> Arc<dyn QueryLogger>;

    #[track_caller]
    fn info(&self, ctx: &Context, args: fmt::Arguments<'_>);

    #[track_caller]
    fn warn(&self, ctx: &Context, args: fmt::Arguments<'_>);

    #[track_caller]
    fn error(&self, ctx: &Context, args: fmt::Arguments<'_>);

    /// Called once per completed query.
    #[track_caller]
    fn trace(
        &self,
        ctx: &Context,
        begin: Instant,
        query: QueryDetails<'_>,
        err: Option<&(dyn StdError + 'static)>,
    );

    /// Parameters to inline into logged SQL. Passes everything through unless
    /// overridden.
    fn params_filter<'q>(
        &self,
        _ctx: &Context,
        sql: &'q str,
        params: &'q [&'q dyn ToSql],
    ) -> (&'q str, &'q [&'q dyn ToSql]) {
        (sql, params)
    }
}
