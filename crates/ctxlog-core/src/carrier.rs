//! Carry a [`Logger`] inside a [`Context`].

use crate::context::{Context, ContextKey};
use crate::field::Field;
use crate::global::global;
use crate::logger::Logger;

/// Private slot so no other context user can read or overwrite the logger.
struct LoggerKey;

impl ContextKey for LoggerKey {
    type Value = Logger;
}

/// Return a child of `parent` carrying `logger`.
pub fn attach(parent: &Context, logger: Logger) -> Context {
    parent.with_value::<LoggerKey>(logger)
}

/// Logger carried by `ctx`, or the process-wide default when there is none.
pub fn retrieve(ctx: &Context) -> Logger {
    match ctx.value::<LoggerKey>() {
        Some(logger) => logger.clone(),
        None => global(),
    }
}

/// Return a child of `parent` whose logger adds `fields` to every record.
///
/// # Panics
///
/// Panics when `fields` is empty. Calling this without fields is a bug in
/// the caller.
pub fn attach_fields(parent: &Context, fields: impl IntoIterator<Item = Field>) -> Context {
    let fields: Vec<Field> = fields.into_iter().collect();
    assert!(!fields.is_empty(), "attach_fields called without fields");
    attach(parent, retrieve(parent).with(fields))
}
