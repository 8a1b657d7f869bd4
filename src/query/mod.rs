//! Query Module
//!
//! A thin statement layer over the storage engine.
//!
//! ## Responsibilities
//! - Parse `insert` / `select` lines into statements
//! - Execute them through the engine's public operations only
//! - Turn capacity and duplicate-key failures into result codes
//!
//! Filtering is limited to `where id = <n>`, which becomes a primary-key
//! lookup; everything else is a full scan.

mod executor;
mod statement;

pub use executor::{format_row, ExecuteOutcome, QueryExecutor};
pub use statement::{Column, PrepareError, Statement, MAX_INPUT_LEN};
