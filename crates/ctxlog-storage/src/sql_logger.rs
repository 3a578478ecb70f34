//! [`QueryLogger`] backed by the logger carried in the request [`Context`].

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

use ctxlog_core::{retrieve, Context, Field, Logger, Severity};
use rusqlite::ToSql;

use crate::config::{TraceConfig, TraceLevel};
use crate::error::is_record_not_found;
use crate::query_logger::{QueryDetails, QueryLogger};

/// Source paths that belong to the query machinery rather than to the
/// application. A call site under one of these is not worth reporting.
const INTERNAL_PATH_MARKERS: &[&str] = &["ctxlog-storage/src/", "/rusqlite-"];

/// Logs queries through the contextual logger.
///
/// Records:
///
/// | condition | severity | message | fields |
/// |-----------|----------|---------|--------|
/// | query failed | error | `query error` | `elapsed`, `rows`, `sql`, `error` |
/// | slower than the threshold | warn | `slow query` | `elapsed`, `rows`, `sql` |
/// | level is `Info` | debug | `query` | `elapsed`, `rows`, `sql` |
#[derive(Debug, Clone, Default)]
pub struct SqlLogger {
    config: TraceConfig,
}

impl SqlLogger {
    pub fn new(config: TraceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn level(&self) -> TraceLevel {
        self.config.level
    }

    /// Copy of this logger using `level`; `self` keeps its own level.
    pub fn with_level(&self, level: TraceLevel) -> Self {
        let mut logger = self.clone();
        logger.config.level = level;
        logger
    }

    /// Contextual logger, pinned to the caller's location unless that
    /// location is inside the query machinery.
    #[track_caller]
    fn logger(&self, ctx: &Context) -> Logger {
        logger_at(ctx, Location::caller())
    }

    #[track_caller]
    fn passthrough(&self, ctx: &Context, min: TraceLevel, severity: Severity, args: fmt::Arguments<'_>) {
        if self.config.level >= min {
            self.logger(ctx).log(severity, &args.to_string(), &[]);
        }
    }
}

fn logger_at(ctx: &Context, caller: &'static Location<'static>) -> Logger {
    let logger = retrieve(ctx);
    if is_internal(caller.file()) {
        return logger;
    }
    logger.with_caller(caller)
}

fn is_internal(file: &str) -> bool {
    let file = file.replace('\\', "/");
    INTERNAL_PATH_MARKERS
        .iter()
        .any(|marker| file.contains(marker))
}

impl QueryLogger for SqlLogger {
    fn log_mode(&self, level: TraceLevel) -> Arc<dyn QueryLogger> {
        Arc::new(self.with_level(level))
    }

    #[track_caller]
    fn info(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        self.passthrough(ctx, TraceLevel::Info, Severity::Info, args);
    }

    #[track_caller]
    fn warn(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        self.passthrough(ctx, TraceLevel::Warn, Severity::Warn, args);
    }

    #[track_caller]
    fn error(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        self.passthrough(ctx, TraceLevel::Error, Severity::Error, args);
    }

    #[track_caller]
    fn trace(
        &self,
        ctx: &Context,
        begin: Instant,
        query: QueryDetails<'_>,
        err: Option<&(dyn StdError + 'static)>,
    ) {
        let level = self.config.level;
        if level <= TraceLevel::Silent {
            return;
        }

        let elapsed = begin.elapsed();
        let threshold = self.config.slow_threshold;

        match err {
            Some(err)
                if level >= TraceLevel::Error
                    && (!is_record_not_found(err) || !self.config.ignore_record_not_found) =>
            {
                let (sql, rows) = query();
                self.logger(ctx).error(
                    "query error",
                    &[
                        Field::duration("elapsed", elapsed),
                        Field::int("rows", rows),
                        Field::string("sql", sql),
                        Field::error(err),
                    ],
                );
            }
            _ if elapsed > threshold && !threshold.is_zero() && level >= TraceLevel::Warn => {
                let (sql, rows) = query();
                self.logger(ctx).warn(
                    "slow query",
                    &[
                        Field::duration("elapsed", elapsed),
                        Field::int("rows", rows),
                        Field::string("sql", sql),
                    ],
                );
            }
            _ if level == TraceLevel::Info => {
                let (sql, rows) = query();
                self.logger(ctx).debug(
                    "query",
                    &[
                        Field::duration("elapsed", elapsed),
                        Field::int("rows", rows),
                        Field::string("sql", sql),
                    ],
                );
            }
            _ => {}
        }
    }

    fn params_filter<'q>(
        &self,
        _ctx: &Context,
        sql: &'q str,
        params: &'q [&'q dyn ToSql],
    ) -> (&'q str, &'q [&'q dyn ToSql]) {
        if self.config.parameterized_queries {
            (sql, &[])
        } else {
            (sql, params)
        }
    }
}
