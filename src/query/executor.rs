//! Statement execution
//!
//! Runs parsed statements against a `StorageEngine` and maps the storage
//! layer's capacity/conflict failures onto result codes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error};

use crate::engine::StorageEngine;
use crate::error::{DbError, Result};
use crate::row::Row;

use super::{Column, Statement};

/// Result of executing a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// The row was stored
    Inserted,

    /// Selected rows with the projection to print them with
    Rows { columns: Vec<Column>, rows: Vec<Row> },

    /// The table is at capacity
    TableFull,

    /// A row with the same id already exists
    DuplicateKey,
}

impl ExecuteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecuteOutcome::Inserted | ExecuteOutcome::Rows { .. })
    }
}

/// Executes statements and keeps simple counters
pub struct QueryExecutor {
    engine: Arc<StorageEngine>,
    insert_count: AtomicU64,
    select_count: AtomicU64,
    error_count: AtomicU64,
}

impl QueryExecutor {
    pub fn new(engine: Arc<StorageEngine>) -> Self {
        Self {
            engine,
            insert_count: AtomicU64::new(0),
            select_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
        }
    }

    /// Parse and execute one line of input
    pub fn execute_query(&self, input: &str) -> Result<ExecuteOutcome> {
        let statement = Statement::parse(input)?;
        self.execute(&statement)
    }

    /// Execute a parsed statement
    ///
    /// `TableFull` and `DuplicateKey` come back as outcomes; every other
    /// storage error is returned as-is.
    pub fn execute(&self, statement: &Statement) -> Result<ExecuteOutcome> {
        let result = match statement {
            Statement::Insert(row) => self.execute_insert(row),
            Statement::Select { columns, id_filter } => self.execute_select(columns, *id_filter),
        };

        match &result {
            Ok(outcome) if outcome.is_success() => {}
            Ok(outcome) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                debug!(?outcome, "statement rejected");
            }
            Err(e) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "statement failed");
            }
        }

        result
    }

    /// Counters as a one-line summary
    pub fn statistics(&self) -> String {
        format!(
            "Execution Statistics: {} INSERTs, {} SELECTs, {} errors",
            self.insert_count.load(Ordering::Relaxed),
            self.select_count.load(Ordering::Relaxed),
            self.error_count.load(Ordering::Relaxed)
        )
    }

    /// The engine statements run against
    pub fn engine(&self) -> &Arc<StorageEngine> {
        &self.engine
    }

    fn execute_insert(&self, row: &Row) -> Result<ExecuteOutcome> {
        self.insert_count.fetch_add(1, Ordering::Relaxed);

        match self.engine.insert_row(row) {
            Ok(()) => Ok(ExecuteOutcome::Inserted),
            Err(DbError::TableFull { .. }) => Ok(ExecuteOutcome::TableFull),
            Err(DbError::DuplicateKey(_)) => Ok(ExecuteOutcome::DuplicateKey),
            Err(e) => Err(e),
        }
    }

    fn execute_select(
        &self,
        columns: &[Column],
        id_filter: Option<i32>,
    ) -> Result<ExecuteOutcome> {
        self.select_count.fetch_add(1, Ordering::Relaxed);

        let rows: Vec<Row> = match id_filter {
            Some(id) => self.engine.get_row_by_id(id)?.into_iter().collect(),
            None => self.engine.get_all_rows()?,
        };

        Ok(ExecuteOutcome::Rows {
            columns: columns.to_vec(),
            rows,
        })
    }
}

/// Render a row restricted to `columns`, e.g. `(1, alice, alice@example.com)`
pub fn format_row(columns: &[Column], row: &Row) -> String {
    let values: Vec<String> = columns.iter().map(|c| c.value(row)).collect();
    format!("({})", values.join(", "))
}
