//! ctxlog Storage Layer
//!
//! SQLite access whose queries are logged through the logger carried by the
//! request [`Context`](ctxlog_core::Context).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    Application                       │
//! │        (passes a Context into every query)           │
//! ├──────────────────────────────────────────────────────┤
//! │              Database / Session                      │
//! │   (runs statements, reports each one when done)      │
//! ├──────────────────────────────────────────────────────┤
//! │          QueryLogger (trait) / SqlLogger             │
//! │  (level filter, slow queries, record-not-found)      │
//! ├──────────────────────────────────────────────────────┤
//! │      ctxlog_core::retrieve(ctx) -> Logger            │
//! │                  → tracing                           │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ctxlog_storage::{Database, SqlLogger, TraceConfig, TraceLevel};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let logger = SqlLogger::new(
//!     TraceConfig::default()
//!         .with_slow_threshold(Duration::from_millis(100))
//!         .with_ignore_record_not_found(true),
//! );
//! let db = Database::open_with_logger(&path, Arc::new(logger))?;
//! ```

mod config;
mod database;
mod error;
mod explain;
mod query_logger;
mod sql_logger;

pub use config::{ParseLevelError, TraceConfig, TraceLevel, DEFAULT_SLOW_THRESHOLD};
pub use database::{Database, Session};
pub use error::is_record_not_found;
pub use explain::explain_sql;
pub use query_logger::{QueryDetails, QueryLogger};
pub use sql_logger::SqlLogger;

use std::sync::Arc;

/// Query logger with the default configuration.
pub fn default_query_logger() -> Arc<dyn QueryLogger> {
    Arc::new(SqlLogger::default())
}
