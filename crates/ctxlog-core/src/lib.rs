//! # ctxlog core
//!
//! Structured logger handles carried through immutable request contexts.
//!
//! ## Modules
//!
//! - `context` - Immutable, append-only request context
//! - `carrier` - Attach, retrieve and augment the logger held by a context
//! - `logger` - Immutable logger handles that emit through `tracing`
//! - `field` - Typed record fields and the nested-object helper
//! - `global` - The process-wide default logger
//!
//! ## Usage
//!
//! ```rust
//! use ctxlog_core::{attach_fields, retrieve, Context, Field};
//!
//! let ctx = attach_fields(&Context::background(), [Field::string("request_id", "r-1")]);
//! retrieve(&ctx).info("request started", &[]);
//! ```

pub mod carrier;
pub mod context;
pub mod error;
pub mod field;
pub mod global;
pub mod logger;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use carrier::{attach, attach_fields, retrieve};
pub use context::{Context, ContextKey};
pub use error::LoggerError;
pub use field::{dict, Field, FieldValue};
pub use global::{global, init_global};
pub use logger::{Logger, Severity, TARGET};
