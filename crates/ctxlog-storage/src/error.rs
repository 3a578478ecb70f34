//! Classification of query errors for logging.

use std::error::Error as StdError;

/// Whether `err`, or any error in its `source()` chain, is
/// [`rusqlite::Error::QueryReturnedNoRows`].
pub fn is_record_not_found(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if matches!(
            err.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::QueryReturnedNoRows)
        ) {
            return true;
        }
        current = err.source();
    }
    false
}
