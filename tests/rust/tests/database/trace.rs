//! Level filtering, slow queries and errors through a real session

use std::sync::Arc;
use std::time::{Duration, Instant};

use ctxlog_core::{Context, Logger};
use ctxlog_storage::{QueryLogger, SqlLogger, TraceConfig, TraceLevel};
use pretty_assertions::assert_eq;
use rusqlite::params;
use serde_json::json;
use tests::{db::TestDatabase, fixtures, LogCapture};
use tracing::Level;

fn slow_config(level: TraceLevel) -> TraceConfig {
    // Any statement counts as slow.
    TraceConfig::default()
        .with_level(level)
        .with_slow_threshold(Duration::from_nanos(1))
}

#[test]
fn test_fast_query_at_warn_is_quiet() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(TraceConfig::default());
    let ctx = fixtures::request_context("req-20");

    test_db
        .db
        .session()
        .execute(&ctx, "INSERT INTO users (id, name) VALUES (?, ?)", params![1, "ada"])
        .unwrap();

    assert!(logs.records().is_empty());
}

#[test]
fn test_slow_query_at_warn_logs_once() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(slow_config(TraceLevel::Warn));
    let ctx = fixtures::request_context("req-21");

    test_db
        .db
        .session()
        .execute(&ctx, "INSERT INTO users (id, name) VALUES (?, ?)", params![1, "ada"])
        .unwrap();

    let records = logs.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, Level::WARN);
    assert_eq!(records[0].message, "slow query");
    assert_eq!(records[0].attr("rows"), Some(&json!(1)));
    assert_eq!(
        records[0].attr("sql"),
        Some(&json!("INSERT INTO users (id, name) VALUES (1, 'ada')"))
    );
    assert!(records[0].attr("elapsed").is_some());
    assert_eq!(records[0].fields, json!({"request_id": "req-21"}));
}

#[test]
fn test_slow_query_at_error_level_is_quiet() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(slow_config(TraceLevel::Error));

    test_db
        .db
        .session()
        .execute(&Context::background(), "INSERT INTO users (id, name) VALUES (1, 'ada')", params![])
        .unwrap();

    assert!(logs.records().is_empty());
}

#[test]
fn test_failed_query_preempts_slow_record() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(slow_config(TraceLevel::Error));
    let ctx = fixtures::request_context("req-22");

    let result = test_db
        .db
        .session()
        .execute(&ctx, "INSERT INTO missing_table VALUES (?)", params![1]);
    assert!(result.is_err());

    let records = logs.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, Level::ERROR);
    assert_eq!(records[0].message, "query error");
    assert_eq!(records[0].attr("rows"), Some(&json!(-1)));
    assert_eq!(
        records[0].attr("sql"),
        Some(&json!("INSERT INTO missing_table VALUES (1)"))
    );
    let error = records[0].attr("error").and_then(|e| e.as_str()).unwrap();
    assert!(error.contains("missing_table"), "{}", error);
}

#[test]
fn test_ignored_record_not_found_is_quiet() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(
        TraceConfig::default()
            .with_level(TraceLevel::Warn)
            .with_ignore_record_not_found(true),
    );

    let result: rusqlite::Result<String> = test_db.db.session().query_row(
        &fixtures::request_context("req-23"),
        "SELECT name FROM users WHERE id = ?",
        params![404],
        |row| row.get(0),
    );

    assert!(matches!(result, Err(rusqlite::Error::QueryReturnedNoRows)));
    assert!(logs.records().is_empty());
}

#[test]
fn test_ignored_record_not_found_still_reports_slow_lookup() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(slow_config(TraceLevel::Warn).with_ignore_record_not_found(true));

    let _ = test_db.db.session().query_row(
        &Context::background(),
        "SELECT name FROM users WHERE id = ?",
        params![404],
        |row| row.get::<_, String>(0),
    );

    let records = logs.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, Level::WARN);
    assert_eq!(records[0].attr("rows"), Some(&json!(0)));
}

#[test]
fn test_info_level_logs_fast_query_at_debug() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(TraceConfig::default().with_level(TraceLevel::Info));
    let ctx = fixtures::request_context("req-24");
    let session = test_db.db.session();

    session
        .execute(&ctx, "INSERT INTO users (id, name) VALUES (?, ?)", params![1, "ada"])
        .unwrap();
    session
        .execute(&ctx, "INSERT INTO users (id, name) VALUES (?, ?)", params![2, "bob"])
        .unwrap();
    let names = session
        .query_map(&ctx, "SELECT name FROM users ORDER BY id", params![], |row| {
            row.get::<_, String>(0)
        })
        .unwrap();
    assert_eq!(names, vec!["ada".to_string(), "bob".to_string()]);

    let records = logs.records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.level == Level::DEBUG && r.message == "query"));
    assert_eq!(records[2].attr("rows"), Some(&json!(2)));
    assert_eq!(
        records[2].attr("sql"),
        Some(&json!("SELECT name FROM users ORDER BY id"))
    );
}

#[test]
fn test_parameterized_queries_hide_values() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(
        TraceConfig::default()
            .with_level(TraceLevel::Info)
            .with_parameterized_queries(true),
    );

    test_db
        .db
        .session()
        .execute(
            &Context::background(),
            "INSERT INTO users (id, name, email) VALUES (?, ?, ?)",
            params![1, "ada", "ada@example.com"],
        )
        .unwrap();

    let records = logs.records();
    assert_eq!(
        records[0].attr("sql"),
        Some(&json!("INSERT INTO users (id, name, email) VALUES (?, ?, ?)"))
    );
}

#[test]
fn test_debug_session_is_scoped() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(TraceConfig::default());
    let ctx = Context::background();

    test_db
        .db
        .debug()
        .execute(&ctx, "INSERT INTO users (id, name) VALUES (1, 'ada')", params![])
        .unwrap();
    test_db
        .db
        .session()
        .execute(&ctx, "INSERT INTO users (id, name) VALUES (2, 'bob')", params![])
        .unwrap();

    let records = logs.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, Level::DEBUG);
}

#[test]
fn test_silent_session_drops_errors() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(TraceConfig::default());

    let result = test_db
        .db
        .session_with_level(TraceLevel::Silent)
        .execute_batch(&Context::background(), "DROP TABLE nope;");

    assert!(result.is_err());
    assert!(logs.records().is_empty());
}

#[test]
fn test_record_not_found_behind_anyhow_context() {
    let logs = LogCapture::install();
    let sql_logger = SqlLogger::new(
        TraceConfig::default()
            .with_level(TraceLevel::Error)
            .with_ignore_record_not_found(true),
    );
    let err = anyhow::Error::from(rusqlite::Error::QueryReturnedNoRows).context("loading user 7");

    sql_logger.trace(
        &Context::background(),
        Instant::now(),
        &|| ("SELECT * FROM users WHERE id = 7".to_string(), 0),
        Some(&*err),
    );

    assert!(logs.records().is_empty());
}

#[test]
fn test_level_override_does_not_leak() {
    let logs = LogCapture::install();
    let mut test_db = TestDatabase::in_memory(TraceConfig::default());
    let base: Arc<dyn QueryLogger> = Arc::new(SqlLogger::default());
    let verbose = base.log_mode(TraceLevel::Info);
    test_db.db.set_logger(verbose);

    let ctx = ctxlog_core::attach(&Context::background(), Logger::new());
    test_db
        .db
        .session()
        .execute(&ctx, "INSERT INTO users (id, name) VALUES (1, 'ada')", params![])
        .unwrap();
    assert_eq!(logs.records().len(), 1);

    test_db.db.set_logger(base);
    test_db
        .db
        .session()
        .execute(&ctx, "INSERT INTO users (id, name) VALUES (2, 'bob')", params![])
        .unwrap();
    assert_eq!(logs.records().len(), 1);
}

#[test]
fn test_passthrough_messages_use_request_logger() {
    let logs = LogCapture::install();
    let test_db = TestDatabase::in_memory(TraceConfig::default());
    let ctx = fixtures::request_context("req-25");
    let logger = test_db.db.logger();

    logger.info(&ctx, format_args!("cache warmed with {} users", 10));
    logger.warn(&ctx, format_args!("replica lag {}ms", 1200));

    let records = logs.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, Level::WARN);
    assert_eq!(records[0].message, "replica lag 1200ms");
    assert_eq!(records[0].fields, json!({"request_id": "req-25"}));
}
