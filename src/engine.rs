//! Engine Module
//!
//! The storage engine: row placement, primary-key index, and the
//! initialize/close lifecycle over a `PageManager`.
//!
//! ## Responsibilities
//! - Map logical row indices to (page, slot) deterministically
//! - Append rows, rejecting duplicates and inserts into a full table
//! - Rebuild the primary-key index from disk on initialize
//! - Defer persistence to explicit flush/close (write-back)

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DbError, Result};
use crate::row::{Row, RowLayout};
use crate::storage::PageManager;

// =============================================================================
// Row Placement
// =============================================================================

/// Physical position of a logical row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLocation {
    /// Page holding the row
    pub page_num: u32,

    /// Row slot within the page
    pub slot: usize,

    /// Byte offset of the slot within the page
    pub byte_offset: usize,
}

/// Placement arithmetic for the append-only table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    row: RowLayout,
    rows_per_page: usize,
    max_rows: usize,
}

impl TableLayout {
    /// Derive placement from `config`
    ///
    /// A config whose page cannot hold a row gets zero capacity, and
    /// `rows_per_page` is floored at one so placement arithmetic never divides by zero.
    pub fn new(config: &Config) -> Self {
        Self {
            row: config.row_layout(),
            rows_per_page: config.rows_per_page().max(1),
            max_rows: config.max_rows(),
        }
    }

    /// Locate logical row `index`: page `index / rows_per_page`, slot `index % rows_per_page`
    pub fn locate(&self, index: usize) -> RowLocation {
        let slot = index % self.rows_per_page;
        RowLocation {
            page_num: (index / self.rows_per_page) as u32,
            slot,
            byte_offset: slot * self.row.row_size(),
        }
    }

    /// Number of pages needed to hold `row_count` rows
    pub fn pages_for(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.rows_per_page)
    }

    pub fn row_layout(&self) -> RowLayout {
        self.row
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }
}

// =============================================================================
// Engine State
// =============================================================================

/// An initialized table: the pager plus the in-memory index
struct OpenTable {
    pager: PageManager,
    path: PathBuf,

    /// Number of occupied slots; the next insert goes to this index
    row_count: usize,

    /// Primary key -> logical row index
    index: HashMap<i32, usize>,
}

/// Linear lifecycle: Uninitialized -> Open -> Closed
enum EngineState {
    Uninitialized,
    Open(OpenTable),
    Closed,
}

impl EngineState {
    fn table(&self) -> Result<&OpenTable> {
        match self {
            EngineState::Open(table) => Ok(table),
            EngineState::Uninitialized => Err(DbError::NotInitialized),
            EngineState::Closed => Err(DbError::Closed),
        }
    }

    fn table_mut(&mut self) -> Result<&mut OpenTable> {
        match self {
            EngineState::Open(table) => Ok(table),
            EngineState::Uninitialized => Err(DbError::NotInitialized),
            EngineState::Closed => Err(DbError::Closed),
        }
    }
}

/// The row storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// One RwLock guards the row count and the primary-key index:
/// - **Writes** (`insert_row`): write lock, so placement, serialization,
///   index update and count increment happen as one unit
/// - **Reads** (lookups, scans, `flush`): read lock, many at once
///
/// The `PageManager` has its own independent lock for the page table.
pub struct StorageEngine {
    config: Config,
    layout: TableLayout,
    state: RwLock<EngineState>,
}

impl StorageEngine {
    /// Create an uninitialized engine
    pub fn new(config: Config) -> Self {
        let layout = TableLayout::new(&config);
        Self {
            config,
            layout,
            state: RwLock::new(EngineState::Uninitialized),
        }
    }

    /// Create an engine and initialize it on `path` (convenience method)
    pub fn open(config: Config, path: impl AsRef<Path>) -> Result<Self> {
        let engine = Self::new(config);
        engine.initialize(path)?;
        Ok(engine)
    }

    /// Open or create the database file and rebuild the index
    ///
    /// On startup:
    /// 1. Validate the configuration
    /// 2. Open/create the file (and missing parent directories)
    /// 3. Scan slots from index 0 until the first empty slot
    /// 4. Ready to serve requests
    pub fn initialize(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut state = self.state.write();

        match *state {
            EngineState::Uninitialized => {}
            EngineState::Open(_) => return Err(DbError::AlreadyInitialized),
            EngineState::Closed => return Err(DbError::Closed),
        }

        // Step 1: Reject unusable layouts before touching the file
        self.config.validate()?;

        // Step 2: Open the page manager
        let pager = PageManager::open(path, &self.config)?;

        // Step 3: Rebuild row count and index from disk
        let (row_count, index) = self.scan_and_build_index(&pager)?;

        info!(path = %path.display(), rows = row_count, "storage engine initialized");

        *state = EngineState::Open(OpenTable {
            pager,
            path: path.to_path_buf(),
            row_count,
            index,
        });

        Ok(())
    }

    /// Append a row
    ///
    /// Fails with `TableFull` at capacity and `DuplicateKey` if the id is
    /// already indexed. The row is written to the cached page only; it reaches
    /// disk on `flush` or `close`.
    pub fn insert_row(&self, row: &Row) -> Result<()> {
        let mut state = self.state.write();
        let table = state.table_mut()?;

        if table.row_count >= self.layout.max_rows() {
            return Err(DbError::TableFull {
                max_rows: self.layout.max_rows(),
            });
        }

        if table.index.contains_key(&row.id()) {
            return Err(DbError::DuplicateKey(row.id()));
        }

        let row_index = table.row_count;
        let location = self.layout.locate(row_index);

        let page = table.pager.get_page(location.page_num)?;
        self.layout
            .row_layout()
            .write_row(&mut page.write(), location.byte_offset, row)?;
        table.pager.mark_page_dirty(location.page_num);

        table.index.insert(row.id(), row_index);
        table.row_count += 1;

        debug!(
            id = row.id(),
            row_index,
            page = location.page_num,
            slot = location.slot,
            "inserted row"
        );
        Ok(())
    }

    /// Look up a row by primary key
    pub fn get_row_by_id(&self, id: i32) -> Result<Option<Row>> {
        let state = self.state.read();
        let table = state.table()?;

        match table.index.get(&id) {
            Some(&row_index) => self.read_row_at(&table.pager, row_index),
            None => Ok(None),
        }
    }

    /// All rows in insertion order
    pub fn get_all_rows(&self) -> Result<Vec<Row>> {
        let state = self.state.read();
        let table = state.table()?;

        let mut rows = Vec::with_capacity(table.row_count);
        for row_index in 0..table.row_count {
            if let Some(row) = self.read_row_at(&table.pager, row_index)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Number of stored rows
    pub fn get_row_count(&self) -> Result<usize> {
        Ok(self.state.read().table()?.row_count)
    }

    /// Row capacity of the table
    pub fn get_max_rows(&self) -> usize {
        self.layout.max_rows()
    }

    /// True if no more rows can be inserted
    pub fn is_table_full(&self) -> Result<bool> {
        Ok(self.get_row_count()? >= self.layout.max_rows())
    }

    /// True if a row with `id` is stored
    pub fn row_exists(&self, id: i32) -> Result<bool> {
        Ok(self.state.read().table()?.index.contains_key(&id))
    }

    /// Write all dirty pages to disk and sync
    pub fn flush(&self) -> Result<()> {
        let state = self.state.read();
        state.table()?.pager.flush_all_pages()?;

        debug!("flushed storage engine");
        Ok(())
    }

    /// Flush, close the file, and release the index
    ///
    /// The engine cannot be initialized again afterwards.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        let table = state.table()?;

        // A failed close leaves the engine open so the caller can retry
        table.pager.close()?;

        let path = table.path.clone();
        *state = EngineState::Closed;

        info!(path = %path.display(), "storage engine closed");
        Ok(())
    }

    /// Human-readable summary of rows, pages, index, and cache
    pub fn get_statistics(&self) -> String {
        let state = self.state.read();
        let table = match state.table() {
            Ok(table) => table,
            Err(_) => return "Storage engine not initialized".to_string(),
        };

        format!(
            "Storage Statistics:\n  Rows: {}/{}\n  Pages in use: {}\n  Index entries: {}\n  {}",
            table.row_count,
            self.layout.max_rows(),
            self.layout.pages_for(table.row_count),
            table.index.len(),
            table.pager.get_cache_statistics()
        )
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Check whether a page has unflushed modifications
    pub fn is_page_dirty(&self, page_num: u32) -> Result<bool> {
        Ok(self.state.read().table()?.pager.is_page_dirty(page_num))
    }

    /// Path of the open database file
    pub fn path(&self) -> Result<PathBuf> {
        Ok(self.state.read().table()?.path.clone())
    }

    /// True between a successful `initialize` and `close`
    pub fn is_initialized(&self) -> bool {
        matches!(*self.state.read(), EngineState::Open(_))
    }

    /// Row placement arithmetic
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Forward scan until the first empty slot; rows are append-only so there are no gaps
    fn scan_and_build_index(&self, pager: &PageManager) -> Result<(usize, HashMap<i32, usize>)> {
        let mut index = HashMap::new();
        let mut row_count = 0;

        for row_index in 0..self.layout.max_rows() {
            let row = match self.read_row_at(pager, row_index)? {
                Some(row) => row,
                None => break,
            };

            if index.insert(row.id(), row_index).is_some() {
                warn!(id = row.id(), row_index, "duplicate id found while scanning");
            }
            row_count = row_index + 1;
        }

        debug!(rows = row_count, "scanned database and rebuilt index");
        Ok((row_count, index))
    }

    fn read_row_at(&self, pager: &PageManager, row_index: usize) -> Result<Option<Row>> {
        let location = self.layout.locate(row_index);
        let page = pager.get_page(location.page_num)?;
        let page = page.read();
        self.layout.row_layout().read_row(&page, location.byte_offset)
    }
}

impl fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageEngine")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
