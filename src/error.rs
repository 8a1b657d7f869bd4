//! Error types for pagedb
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::query::PrepareError;

/// Result type alias using DbError
pub type Result<T> = std::result::Result<T, DbError>;

/// Unified error type for pagedb operations
#[derive(Debug, Error)]
pub enum DbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Bounds Errors
    // -------------------------------------------------------------------------
    #[error("Page number out of bounds: {page_num} (max pages: {max_pages})")]
    PageOutOfBounds { page_num: u32, max_pages: u32 },

    #[error("Offset {offset} + length {len} exceeds page size {page_size}")]
    OffsetOutOfBounds {
        offset: usize,
        len: usize,
        page_size: usize,
    },

    #[error("Page data must be exactly {expected} bytes, got {actual}")]
    InvalidPageData { expected: usize, actual: usize },

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Storage engine not initialized")]
    NotInitialized,

    #[error("Storage engine already initialized")]
    AlreadyInitialized,

    #[error("Storage is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Table Errors
    // -------------------------------------------------------------------------
    #[error("Table is full ({max_rows} rows)")]
    TableFull { max_rows: usize },

    #[error("Row with ID {0} already exists")]
    DuplicateKey(i32),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Query Errors
    // -------------------------------------------------------------------------
    #[error("Prepare error: {0}")]
    Prepare(#[from] PrepareError),
}

impl DbError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DbError::Validation {
            field,
            message: message.into(),
        }
    }
}
