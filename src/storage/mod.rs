//! Storage Module
//!
//! Page-backed file storage with an in-memory page table.
//!
//! ## Responsibilities
//! - Bounds-checked byte access to fixed-size pages
//! - Lazy loading of pages from disk on first access
//! - Explicit dirty tracking with write-back on flush/close
//! - Sole ownership of the database file handle
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Page 0   (offset 0)                          │
//! │ ┌────────┬────────┬─────┬─────────┬────────┐ │
//! │ │ Row 0  │ Row 1  │ ... │ Row 13  │ unused │ │
//! │ └────────┴────────┴─────┴─────────┴────────┘ │
//! ├──────────────────────────────────────────────┤
//! │ Page 1   (offset PAGE_SIZE)                  │
//! │ ...                                          │
//! └──────────────────────────────────────────────┘
//!
//! Row (292 bytes):
//! ┌──────────┬─────────────────┬─────────────────┐
//! │ id (4)   │ username (32)   │ email (256)     │
//! │ i32 LE   │ zero-padded     │ zero-padded     │
//! └──────────┴─────────────────┴─────────────────┘
//! ```
//!
//! A slot whose id is `<= 0` is unused and marks the end of stored data.

mod dirty;
mod manager;
mod page;

pub use dirty::DirtyBitmap;
pub use manager::{CacheStats, PageManager, PageRef};
pub use page::Page;

pub(crate) use page::{decode_fixed_str, truncate_utf8};

// =============================================================================
// Default Sizes
// =============================================================================

/// Default page size in bytes
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default maximum number of pages in the file
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Default maximum number of rows in the table
pub const DEFAULT_TABLE_MAX_ROWS: usize = 1000;

/// Default width of the username field
pub const DEFAULT_USERNAME_SIZE: usize = 32;

/// Default width of the email field
pub const DEFAULT_EMAIL_SIZE: usize = 256;
