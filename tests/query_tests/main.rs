//! Tests for the query layer
//!
//! These tests verify:
//! - Statement parsing (insert/select grammar and error kinds)
//! - Execution outcomes and error propagation
//! - Row formatting and execution counters

use std::sync::Arc;

use pagedb::query::{format_row, Column, ExecuteOutcome, PrepareError, QueryExecutor, Statement};
use pagedb::{Config, DbError, Row, StorageEngine};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_executor(max_rows: usize) -> (TempDir, QueryExecutor) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().table_max_rows(max_rows).build();
    let engine = StorageEngine::open(config, temp_dir.path().join("test.db")).unwrap();
    (temp_dir, QueryExecutor::new(Arc::new(engine)))
}

fn parse_err(input: &str) -> PrepareError {
    Statement::parse(input).unwrap_err()
}

// =============================================================================
// Insert Parsing Tests
// =============================================================================

#[test]
fn test_parse_insert() {
    let statement = Statement::parse("insert 1 alice alice@example.com").unwrap();

    assert_eq!(
        statement,
        Statement::Insert(Row::new(1, "alice", "alice@example.com").unwrap())
    );
}

#[test]
fn test_parse_insert_case_insensitive() {
    let statement: Statement = "  INSERT 2 bob bob@example.com  ".parse().unwrap();

    assert!(matches!(statement, Statement::Insert(row) if row.id() == 2));
}

#[test]
fn test_parse_insert_email_keeps_remaining_text() {
    let statement = Statement::parse("insert 3 carol carol smith@example.com").unwrap();

    match statement {
        Statement::Insert(row) => assert_eq!(row.email(), "carol smith@example.com"),
        other => panic!("expected insert, got {:?}", other),
    }
}

#[test]
fn test_parse_insert_missing_fields() {
    assert!(matches!(parse_err("insert"), PrepareError::Syntax(_)));
    assert!(matches!(parse_err("insert 1"), PrepareError::Syntax(_)));
    assert!(matches!(parse_err("insert 1 alice"), PrepareError::Syntax(_)));
}

#[test]
fn test_parse_insert_bad_id() {
    assert_eq!(
        parse_err("insert abc alice a@b.c"),
        PrepareError::Syntax("Invalid ID format: abc".to_string())
    );
    assert_eq!(parse_err("insert -5 alice a@b.c"), PrepareError::NegativeId);
    assert_eq!(parse_err("insert 0 alice a@b.c"), PrepareError::NegativeId);
}

#[test]
fn test_parse_insert_invalid_data() {
    assert!(matches!(
        parse_err("insert 1 alice not-an-email"),
        PrepareError::InvalidData(_)
    ));
}

// =============================================================================
// Select Parsing Tests
// =============================================================================

#[test]
fn test_parse_select_all() {
    let expected = Statement::Select {
        columns: Column::ALL.to_vec(),
        id_filter: None,
    };

    assert_eq!(Statement::parse("select").unwrap(), expected);
    assert_eq!(Statement::parse("SELECT *").unwrap(), expected);
}

#[test]
fn test_parse_select_columns() {
    let statement = Statement::parse("select email, id").unwrap();

    assert_eq!(
        statement,
        Statement::Select {
            columns: vec![Column::Email, Column::Id],
            id_filter: None,
        }
    );
}

#[test]
fn test_parse_select_where() {
    let expected = Statement::Select {
        columns: vec![Column::Id, Column::Username],
        id_filter: Some(5),
    };

    assert_eq!(Statement::parse("select id,username where id = 5").unwrap(), expected);
    assert_eq!(Statement::parse("select id, username WHERE id=5").unwrap(), expected);
    assert_eq!(Statement::parse("select id, username where ID =5").unwrap(), expected);
}

#[test]
fn test_parse_select_errors() {
    assert_eq!(
        parse_err("select name"),
        PrepareError::UnsupportedColumn("name".to_string())
    );
    assert!(matches!(parse_err("select id,, email"), PrepareError::Syntax(_)));
    assert!(matches!(parse_err("select * where"), PrepareError::Syntax(_)));
    assert!(matches!(
        parse_err("select * where username = bob"),
        PrepareError::UnsupportedWhere(_)
    ));
    assert!(matches!(
        parse_err("select * where id = -1"),
        PrepareError::UnsupportedWhere(_)
    ));
    assert!(matches!(
        parse_err("select * where id > 3"),
        PrepareError::UnsupportedWhere(_)
    ));
}

#[test]
fn test_parse_general_errors() {
    assert_eq!(parse_err(""), PrepareError::Empty);
    assert_eq!(parse_err("   "), PrepareError::Empty);
    assert_eq!(
        parse_err("update users"),
        PrepareError::Unrecognized("update".to_string())
    );

    let long = format!("select {}", "x".repeat(1100));
    assert_eq!(parse_err(&long), PrepareError::TooLong(1024));
}

// =============================================================================
// Execution Tests
// =============================================================================

#[test]
fn test_execute_insert_and_select() {
    let (_temp, executor) = setup_temp_executor(1000);

    let outcome = executor
        .execute_query("insert 1 alice alice@example.com")
        .unwrap();
    assert_eq!(outcome, ExecuteOutcome::Inserted);

    executor.execute_query("insert 2 bob bob@example.com").unwrap();

    match executor.execute_query("select").unwrap() {
        ExecuteOutcome::Rows { columns, rows } => {
            assert_eq!(columns, Column::ALL.to_vec());
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].username(), "alice");
            assert_eq!(rows[1].username(), "bob");
        }
        other => panic!("expected rows, got {:?}", other),
    }
}

#[test]
fn test_execute_select_by_id() {
    let (_temp, executor) = setup_temp_executor(1000);
    executor.execute_query("insert 1 alice alice@example.com").unwrap();
    executor.execute_query("insert 2 bob bob@example.com").unwrap();

    match executor.execute_query("select username where id = 2").unwrap() {
        ExecuteOutcome::Rows { columns, rows } => {
            assert_eq!(columns, vec![Column::Username]);
            assert_eq!(rows, vec![Row::new(2, "bob", "bob@example.com").unwrap()]);
        }
        other => panic!("expected rows, got {:?}", other),
    }

    let outcome = executor.execute_query("select where id = 9").unwrap();
    assert!(matches!(outcome, ExecuteOutcome::Rows { rows, .. } if rows.is_empty()));
}

#[test]
fn test_execute_duplicate() {
    let (_temp, executor) = setup_temp_executor(1000);
    executor.execute_query("insert 1 alice alice@example.com").unwrap();

    let outcome = executor.execute_query("insert 1 bob bob@example.com").unwrap();

    assert_eq!(outcome, ExecuteOutcome::DuplicateKey);
    assert!(!outcome.is_success());
}

#[test]
fn test_execute_table_full() {
    let (_temp, executor) = setup_temp_executor(1);
    executor.execute_query("insert 1 alice alice@example.com").unwrap();

    let outcome = executor.execute_query("insert 2 bob bob@example.com").unwrap();

    assert_eq!(outcome, ExecuteOutcome::TableFull);
}

#[test]
fn test_execute_prepare_error() {
    let (_temp, executor) = setup_temp_executor(1000);

    let result = executor.execute_query("delete 1");

    assert!(matches!(
        result,
        Err(DbError::Prepare(PrepareError::Unrecognized(_)))
    ));
}

#[test]
fn test_execute_on_closed_engine() {
    let (_temp, executor) = setup_temp_executor(1000);
    executor.engine().close().unwrap();

    let result = executor.execute_query("insert 1 alice alice@example.com");

    assert!(matches!(result, Err(DbError::Closed)));
    assert!(executor.statistics().ends_with("1 errors"));
}

#[test]
fn test_statistics() {
    let (_temp, executor) = setup_temp_executor(1000);
    executor.execute_query("insert 1 alice alice@example.com").unwrap();
    executor.execute_query("insert 1 alice alice@example.com").unwrap();
    executor.execute_query("select").unwrap();

    assert_eq!(
        executor.statistics(),
        "Execution Statistics: 2 INSERTs, 1 SELECTs, 1 errors"
    );
}

// =============================================================================
// Formatting Tests
// =============================================================================

#[test]
fn test_format_row() {
    let row = Row::new(1, "alice", "alice@example.com").unwrap();

    assert_eq!(format_row(&Column::ALL, &row), "(1, alice, alice@example.com)");
    assert_eq!(format_row(&[Column::Email, Column::Id], &row), "(alice@example.com, 1)");
}
