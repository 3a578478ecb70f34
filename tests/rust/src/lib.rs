//! Shared test utilities and fixtures for ctxlog integration tests.

pub use ctxlog_core::testing::{CapturedRecord, LogCapture};

/// Test fixture utilities
pub mod fixtures {
    use ctxlog_core::{attach, attach_fields, Context, Field, Logger};
    use uuid::Uuid;

    /// Schema used by the database tests.
    pub const USERS_SCHEMA: &str =
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT);";

    /// Context carrying a fresh root logger tagged with `request_id`.
    ///
    /// Tests use their own root so records never depend on the process
    /// default.
    pub fn request_context(request_id: &str) -> Context {
        let ctx = attach(&Context::background(), Logger::new());
        attach_fields(&ctx, [Field::string("request_id", request_id.to_string())])
    }

    /// Generate a random request id
    pub fn random_request_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Database test helpers
pub mod db {
    use ctxlog_storage::{Database, SqlLogger, TraceConfig};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    use super::fixtures::USERS_SCHEMA;

    /// Database file name
    const DB_FILE: &str = "ctxlog.db";

    /// Create a temporary database for testing
    pub struct TestDatabase {
        pub db: Database,
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl TestDatabase {
        /// Create a new test database in a temporary directory
        pub fn new(config: TraceConfig) -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db_path = temp_dir.path().join(DB_FILE);
            let db = Database::open_with_logger(&db_path, Arc::new(SqlLogger::new(config)))
                .expect("Failed to open test database");
            Self::with_schema(db, temp_dir, db_path)
        }

        /// Create an in-memory database for fast tests
        pub fn in_memory(config: TraceConfig) -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db = Database::open_in_memory_with_logger(Arc::new(SqlLogger::new(config)))
                .expect("Failed to open in-memory database");
            Self::with_schema(db, temp_dir, PathBuf::new())
        }

        fn with_schema(db: Database, temp_dir: TempDir, db_path: PathBuf) -> Self {
            // Straight on the connection so schema setup stays out of the logs.
            db.connection()
                .execute_batch(USERS_SCHEMA)
                .expect("Failed to create schema");
            Self {
                db,
                _temp_dir: temp_dir,
                db_path,
            }
        }

        /// Get the full database file path
        pub fn db_path(&self) -> &Path {
            &self.db_path
        }
    }
}
