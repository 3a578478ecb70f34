//! Immutable structured logger handles.
//!
//! A [`Logger`] does not format or write anything itself. Each record is
//! handed to `tracing` under the [`TARGET`] target; whatever subscriber the
//! application installed decides where it goes.
//!
//! Record layout:
//!
//! | tracing field | content |
//! |---------------|---------|
//! | `message` | the record message |
//! | `caller` | `file:line:col` of the call site |
//! | `elapsed`, `rows`, `sql`, `error` | the well-known query fields, when present |
//! | `fields` | JSON object with every other field, handle fields first |

use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::field::{debug, display};

use crate::field::{Field, FieldMap, FieldValue};

/// `tracing` target every record is emitted under.
pub const TARGET: &str = "ctxlog";

pub const ELAPSED_KEY: &str = "elapsed";
pub const ROWS_KEY: &str = "rows";
pub const SQL_KEY: &str = "sql";
pub const ERROR_KEY: &str = "error";

/// Record severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured logger handle.
///
/// Cloning is cheap and every derivation (`with`, `with_caller`) returns a
/// new handle, leaving the original untouched.
#[derive(Clone, Default)]
pub struct Logger {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    fields: Vec<Field>,
    caller: Option<&'static Location<'static>>,
}

impl Logger {
    /// Create a root logger with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a handle that adds `fields` to every record it emits.
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> Self {
        let mut all = self.inner.fields.clone();
        all.extend(fields);
        Self {
            inner: Arc::new(Inner {
                fields: all,
                caller: self.inner.caller,
            }),
        }
    }

    /// Derive a handle whose records report `caller` as their call site.
    pub fn with_caller(&self, caller: &'static Location<'static>) -> Self {
        Self {
            inner: Arc::new(Inner {
                fields: self.inner.fields.clone(),
                caller: Some(caller),
            }),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.inner.fields
    }

    /// Explicit call site, if one was set with [`Logger::with_caller`].
    pub fn caller(&self) -> Option<&'static Location<'static>> {
        self.inner.caller
    }

    /// Whether both handles are the same instance.
    pub fn ptr_eq(a: &Logger, b: &Logger) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Severity::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Severity::Info, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Severity::Warn, message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Severity::Error, message, fields);
    }

    /// Emit one record.
    #[track_caller]
    pub fn log(&self, severity: Severity, message: &str, fields: &[Field]) {
        let caller = match self.inner.caller {
            Some(caller) => caller,
            None => Location::caller(),
        };

        let mut elapsed: Option<Duration> = None;
        let mut rows: Option<i64> = None;
        let mut sql: Option<&str> = None;
        let mut error: Option<&str> = None;
        let mut rest: Vec<Field> = self.inner.fields.clone();

        for field in fields {
            match (field.key(), field.value()) {
                (ELAPSED_KEY, FieldValue::Duration(d)) => elapsed = Some(*d),
                (ROWS_KEY, FieldValue::Int(n)) => rows = Some(*n),
                (SQL_KEY, FieldValue::String(s)) => sql = Some(s.as_str()),
                (ERROR_KEY, FieldValue::Error(e)) => error = Some(e.as_str()),
                _ => rest.push(field.clone()),
            }
        }

        let extra = if rest.is_empty() {
            None
        } else {
            serde_json::to_string(&FieldMap(&rest)).ok()
        };

        let elapsed = elapsed.map(debug);
        let extra = extra.as_deref().map(display);

        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    target: TARGET,
                    $level,
                    caller = %caller,
                    elapsed = elapsed,
                    rows = rows,
                    sql = sql,
                    error = error,
                    fields = extra,
                    "{}",
                    message
                )
            };
        }

        match severity {
            Severity::Debug => emit!(tracing::Level::DEBUG),
            Severity::Info => emit!(tracing::Level::INFO),
            Severity::Warn => emit!(tracing::Level::WARN),
            Severity::Error => emit!(tracing::Level::ERROR),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("fields", &self.inner.fields)
            .field("caller", &self.inner.caller)
            .finish()
    }
}
