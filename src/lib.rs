//! # pagedb
//!
//! A single-table, fixed-schema relational store built on a pager:
//! - Page-addressed database file with fixed-size pages
//! - In-memory page table with explicit dirty tracking (write-back)
//! - Fixed-width binary row encoding
//! - Hash index over the integer primary key
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Query Layer / REPL                        │
//! │              (insert / select statements)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   StorageEngine                              │
//! │      (row placement, primary-key index, RwLock)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Row Codec  │          │ PageManager │
//!   │ (292 bytes) │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ Database    │
//!                           │ File        │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod row;
pub mod engine;
pub mod query;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DbError, Result};
pub use config::Config;
pub use engine::StorageEngine;
pub use row::Row;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pagedb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
