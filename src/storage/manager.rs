//! Page Manager
//!
//! Owns the database file and the page table.
//!
//! ## Responsibilities
//! - Load pages from disk on first access (zero-padding short reads)
//! - Keep loaded pages cached until close (no eviction)
//! - Track dirty pages and write them back on flush
//! - Sync the file so a completed flush is durable

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DbError, Result};

use super::{DirtyBitmap, Page};

/// Shared handle to a cached page
///
/// Mutations through the handle land in the cached copy directly; the caller
/// must mark the page dirty after mutating for them to reach disk. Do not
/// hold a page guard across `flush_page`, `flush_all_pages` or `close`.
pub type PageRef = Arc<RwLock<Page>>;

/// Bytes of one dirty page, copied out for writing
struct PageSnapshot {
    page_num: u32,
    data: Vec<u8>,
}

/// Manages pages of a single database file
///
/// ## Concurrency:
/// - `pages`: RwLock over the page table. Cache hits take the read lock;
///   misses take the write lock and re-check before reading from disk, so
///   racing threads load a page once. Never held while waiting on a page guard.
/// - `file`: Mutex over the file handle. Never held while waiting on another lock.
/// - `flush_lock`: serializes flushes and close, so snapshots reach disk in order
/// - `dirty`: atomic bitmap, lock-free
///
/// Lock order: `flush_lock` -> page guard, `pages` -> `file`.
pub struct PageManager {
    /// Path of the database file
    path: PathBuf,

    /// Size of one page in bytes
    page_size: usize,

    /// Exclusive upper bound for page numbers
    max_pages: u32,

    /// Arena indexed by page number; `None` means not loaded yet
    pages: RwLock<Vec<Option<PageRef>>>,

    /// Open database file, `None` once closed
    file: Mutex<Option<File>>,

    flush_lock: Mutex<()>,

    /// Pages modified since their last write to disk
    dirty: DirtyBitmap,

    closed: AtomicBool,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl PageManager {
    /// Open or create the database file at `path`
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        info!(path = %path.display(), "page manager opened");

        Ok(Self {
            path: path.to_path_buf(),
            page_size: config.page_size,
            max_pages: config.max_pages,
            pages: RwLock::new(vec![None; config.max_pages as usize]),
            file: Mutex::new(Some(file)),
            flush_lock: Mutex::new(()),
            dirty: DirtyBitmap::new(config.max_pages),
            closed: AtomicBool::new(false),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        })
    }

    /// Get a page, loading it from disk on a cache miss
    pub fn get_page(&self, page_num: u32) -> Result<PageRef> {
        self.check_page_num(page_num)?;
        self.check_open()?;

        // Fast path: cache hit under the read lock
        if let Some(page) = self.cached_page(page_num) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(page);
        }

        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        // Slow path: re-check under the write lock, then load
        let mut pages = self.pages.write();
        if let Some(page) = &pages[page_num as usize] {
            return Ok(Arc::clone(page));
        }

        let page = {
            let mut file = self.file.lock();
            let file = file.as_mut().ok_or(DbError::Closed)?;
            Self::load_page(file, page_num, self.page_size)?
        };
        let page = Arc::new(RwLock::new(page));
        pages[page_num as usize] = Some(Arc::clone(&page));

        debug!(page_num, "loaded page from disk");
        Ok(page)
    }

    /// Mark a page as modified
    ///
    /// Out-of-range numbers are ignored, as is every mark after `close`.
    pub fn mark_page_dirty(&self, page_num: u32) {
        if self.is_closed() {
            return;
        }
        self.dirty.set(page_num);
    }

    /// Check whether a page has unflushed modifications; always false once closed
    pub fn is_page_dirty(&self, page_num: u32) -> bool {
        !self.is_closed() && self.dirty.get(page_num)
    }

    /// Write one page back to disk if it is dirty and cached
    ///
    /// Does not sync the file; see `flush_all_pages` for durability.
    pub fn flush_page(&self, page_num: u32) -> Result<()> {
        let _flush = self.flush_lock.lock();
        self.check_open()?;

        if !self.dirty.get(page_num) {
            return Ok(());
        }

        let snapshot = match self.cached_page(page_num) {
            Some(page) => self.snapshot(page_num, &page),
            None => return Ok(()),
        };

        self.write_snapshots(&[snapshot], false)?;

        debug!(page_num, "flushed page to disk");
        Ok(())
    }

    /// Write every dirty page in ascending order, then sync the file
    pub fn flush_all_pages(&self) -> Result<()> {
        let _flush = self.flush_lock.lock();
        self.check_open()?;
        self.flush_locked()
    }

    /// Hit/miss counters and the number of cached pages
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.cache_hits.load(Ordering::Relaxed),
            misses: self.cache_misses.load(Ordering::Relaxed),
            cached_pages: self.pages.read().iter().filter(|p| p.is_some()).count(),
        }
    }

    /// Human-readable cache statistics
    pub fn get_cache_statistics(&self) -> String {
        self.cache_stats().to_string()
    }

    /// Flush everything, close the file, and drop the cache
    ///
    /// Calling close on an already-closed manager is a no-op. If the final
    /// flush fails the manager stays open so the caller can retry.
    pub fn close(&self) -> Result<()> {
        let _flush = self.flush_lock.lock();
        if self.is_closed() {
            return Ok(());
        }

        self.flush_locked()?;

        self.closed.store(true, Ordering::Release);
        self.file.lock().take();
        self.pages.write().iter_mut().for_each(|slot| *slot = None);
        self.dirty.clear_all();

        info!(path = %self.path.display(), "page manager closed");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Page size in bytes
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Exclusive upper bound for page numbers
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// True once `close` has completed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of dirty pages; zero once closed
    pub fn dirty_page_count(&self) -> usize {
        if self.is_closed() {
            return 0;
        }
        self.dirty.count()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_page_num(&self, page_num: u32) -> Result<()> {
        if page_num >= self.max_pages {
            return Err(DbError::PageOutOfBounds {
                page_num,
                max_pages: self.max_pages,
            });
        }
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(DbError::Closed);
        }
        Ok(())
    }

    /// Clone the cached handle without holding the table lock afterwards
    fn cached_page(&self, page_num: u32) -> Option<PageRef> {
        self.pages.read().get(page_num as usize)?.clone()
    }

    /// Copy a page's bytes and clear its dirty bit under the page guard
    ///
    /// A writer that mutates the page afterwards and marks it sets the bit
    /// again, so its change is picked up by the next flush.
    fn snapshot(&self, page_num: u32, page: &PageRef) -> PageSnapshot {
        let page = page.read();
        self.dirty.clear(page_num);
        PageSnapshot {
            page_num,
            data: page.data().to_vec(),
        }
    }

    /// Flush with `flush_lock` already held
    fn flush_locked(&self) -> Result<()> {
        let snapshots: Vec<PageSnapshot> = self
            .dirty
            .dirty_pages()
            .into_iter()
            .filter_map(|page_num| {
                self.cached_page(page_num)
                    .map(|page| self.snapshot(page_num, &page))
            })
            .collect();

        self.write_snapshots(&snapshots, true)?;

        debug!(pages = snapshots.len(), "flushed dirty pages to disk");
        Ok(())
    }

    /// Write snapshots in order, optionally syncing
    ///
    /// On failure every snapshot's page is marked dirty again.
    fn write_snapshots(&self, snapshots: &[PageSnapshot], sync: bool) -> Result<()> {
        let mut file = self.file.lock();

        let result = match file.as_mut() {
            Some(file) => self.write_and_sync(file, snapshots, sync),
            None => Err(DbError::Closed),
        };

        if result.is_err() {
            for snapshot in snapshots {
                self.dirty.set(snapshot.page_num);
            }
        }
        result
    }

    fn write_and_sync(
        &self,
        file: &mut File,
        snapshots: &[PageSnapshot],
        sync: bool,
    ) -> Result<()> {
        for snapshot in snapshots {
            let offset = snapshot.page_num as u64 * self.page_size as u64;
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&snapshot.data)?;
        }

        if sync {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Read a page from disk; beyond EOF yields a fresh page, short reads are zero-padded
    fn load_page(file: &mut File, page_num: u32, page_size: usize) -> Result<Page> {
        let offset = page_num as u64 * page_size as u64;

        if offset >= file.metadata()?.len() {
            return Ok(Page::new(page_num, page_size));
        }

        file.seek(SeekFrom::Start(offset))?;

        let mut data = vec![0u8; page_size];
        let mut filled = 0;
        while filled < page_size {
            match file.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < page_size {
            debug!(page_num, bytes_read = filled, "short read, zero-padded page");
        }

        Page::from_bytes(page_num, data, page_size)
    }
}

impl Drop for PageManager {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "failed to flush pages on drop");
        }
    }
}

impl fmt::Debug for PageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageManager")
            .field("path", &self.path)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("dirty_pages", &self.dirty.count())
            .finish()
    }
}

// =============================================================================
// Cache Statistics
// =============================================================================

/// Snapshot of page cache counters (observability only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub cached_pages: usize,
}

impl CacheStats {
    /// Hit ratio in percent, `None` before any lookup
    pub fn hit_ratio(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            return None;
        }
        Some(self.hits as f64 / total as f64 * 100.0)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hit_ratio() {
            None => write!(f, "Cache: no operations"),
            Some(ratio) => write!(
                f,
                "Cache: {} hits, {} misses ({:.1}% hit ratio), {} pages cached",
                self.hits, self.misses, ratio, self.cached_pages
            ),
        }
    }
}
