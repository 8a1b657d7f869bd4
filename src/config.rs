//! Configuration for pagedb
//!
//! Centralized configuration with sensible defaults. Every size here feeds
//! the on-disk layout, so changing one on an existing database file makes
//! its rows unreadable.

use std::fmt;

use crate::error::{DbError, Result};
use crate::row::RowLayout;
use crate::storage::{
    DEFAULT_EMAIL_SIZE, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_TABLE_MAX_ROWS,
    DEFAULT_USERNAME_SIZE,
};

/// Main configuration for a pagedb instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Pager Configuration
    // -------------------------------------------------------------------------
    /// Size of one page in bytes (unit of file I/O and caching)
    pub page_size: usize,

    /// Maximum number of pages the file may hold; also bounds the page cache
    pub max_pages: u32,

    // -------------------------------------------------------------------------
    // Table Configuration
    // -------------------------------------------------------------------------
    /// Maximum number of rows the table accepts
    pub table_max_rows: usize,

    /// Width of the zero-padded username field
    pub username_size: usize,

    /// Width of the zero-padded email field
    pub email_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            table_max_rows: DEFAULT_TABLE_MAX_ROWS,
            username_size: DEFAULT_USERNAME_SIZE,
            email_size: DEFAULT_EMAIL_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Row layout derived from the field sizes
    pub fn row_layout(&self) -> RowLayout {
        RowLayout::new(self.username_size, self.email_size)
    }

    /// Size of one serialized row in bytes
    pub fn row_size(&self) -> usize {
        self.row_layout().row_size()
    }

    /// Number of whole rows that fit in a page
    pub fn rows_per_page(&self) -> usize {
        self.page_size / self.row_size()
    }

    /// Effective row capacity: the table limit, clamped to what the pages can hold
    pub fn max_rows(&self) -> usize {
        let page_capacity = self.max_pages as usize * self.rows_per_page();
        self.table_max_rows.min(page_capacity)
    }

    /// Check that the configuration describes a usable layout
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(DbError::Config("Page size must be positive".to_string()));
        }
        if self.max_pages == 0 {
            return Err(DbError::Config("Max pages must be positive".to_string()));
        }
        if self.table_max_rows == 0 {
            return Err(DbError::Config(
                "Table max rows must be positive".to_string(),
            ));
        }
        if self.username_size == 0 || self.email_size == 0 {
            return Err(DbError::Config(
                "Row field sizes must be positive".to_string(),
            ));
        }
        if self.rows_per_page() == 0 {
            return Err(DbError::Config(format!(
                "Invalid row size - a {}-byte row does not fit in a {}-byte page",
                self.row_size(),
                self.page_size
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config{{pageSize={}, maxPages={}, rowSize={}, rowsPerPage={}, tableMaxRows={}}}",
            self.page_size,
            self.max_pages,
            self.row_size(),
            self.rows_per_page(),
            self.table_max_rows
        )
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the page size (in bytes)
    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    /// Set the maximum number of pages
    pub fn max_pages(mut self, count: u32) -> Self {
        self.config.max_pages = count;
        self
    }

    /// Set the maximum number of rows in the table
    pub fn table_max_rows(mut self, count: usize) -> Self {
        self.config.table_max_rows = count;
        self
    }

    /// Set the username field width (in bytes)
    pub fn username_size(mut self, size: usize) -> Self {
        self.config.username_size = size;
        self
    }

    /// Set the email field width (in bytes)
    pub fn email_size(mut self, size: usize) -> Self {
        self.config.email_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
