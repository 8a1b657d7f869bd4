//! Page
//!
//! A fixed-size byte buffer with bounds-checked typed accessors.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{DbError, Result};

/// Size of an encoded integer (i32, little-endian)
const INT_SIZE: usize = 4;

/// A single page of the database file
///
/// The buffer length never changes after construction. Every accessor checks
/// `offset + len` against the page size, not against row boundaries, and
/// refreshes the last-access timestamp. The timestamp is diagnostic only:
/// nothing evicts pages based on it.
pub struct Page {
    /// Page number within the file
    number: u32,

    /// Raw page bytes, exactly page-size long
    data: Box<[u8]>,

    /// Unix millis of the most recent access
    last_accessed: AtomicU64,
}

impl Page {
    /// Create a zero-filled page
    pub fn new(number: u32, page_size: usize) -> Self {
        Self {
            number,
            data: vec![0u8; page_size].into_boxed_slice(),
            last_accessed: AtomicU64::new(now_millis()),
        }
    }

    /// Create a page from existing bytes
    ///
    /// Fails if `data` is not exactly `page_size` bytes.
    pub fn from_bytes(number: u32, data: Vec<u8>, page_size: usize) -> Result<Self> {
        if data.len() != page_size {
            return Err(DbError::InvalidPageData {
                expected: page_size,
                actual: data.len(),
            });
        }

        Ok(Self {
            number,
            data: data.into_boxed_slice(),
            last_accessed: AtomicU64::new(now_millis()),
        })
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Page number within the file
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Page size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Full page contents
    pub fn data(&self) -> &[u8] {
        self.touch();
        &self.data
    }

    /// Unix millis of the most recent access
    pub fn last_accessed(&self) -> u64 {
        self.last_accessed.load(Ordering::Relaxed)
    }

    /// Refresh the last-access timestamp
    pub fn touch(&self) {
        self.last_accessed.store(now_millis(), Ordering::Relaxed);
    }

    /// Milliseconds since the last access
    pub fn age_millis(&self) -> u64 {
        now_millis().saturating_sub(self.last_accessed())
    }

    /// True if the page has not been accessed for more than `max_age_ms`
    pub fn is_older_than(&self, max_age_ms: u64) -> bool {
        self.age_millis() > max_age_ms
    }

    /// Zero-fill the whole page
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.touch();
    }

    // =========================================================================
    // Typed Accessors
    // =========================================================================

    /// Read a little-endian i32 at `offset`
    pub fn read_int(&self, offset: usize) -> Result<i32> {
        self.check_range(offset, INT_SIZE)?;
        self.touch();

        let mut bytes = [0u8; INT_SIZE];
        bytes.copy_from_slice(&self.data[offset..offset + INT_SIZE]);
        Ok(i32::from_le_bytes(bytes))
    }

    /// Write `value` as a little-endian i32 at `offset`
    pub fn write_int(&mut self, value: i32, offset: usize) -> Result<()> {
        self.check_range(offset, INT_SIZE)?;

        self.data[offset..offset + INT_SIZE].copy_from_slice(&value.to_le_bytes());
        self.touch();
        Ok(())
    }

    /// Borrow `len` raw bytes starting at `offset`
    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.check_range(offset, len)?;
        self.touch();

        Ok(&self.data[offset..offset + len])
    }

    /// Copy `bytes` into the page starting at `offset`
    pub fn write_bytes(&mut self, bytes: &[u8], offset: usize) -> Result<()> {
        self.check_range(offset, bytes.len())?;

        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.touch();
        Ok(())
    }

    /// Read a null-terminated string from a field of `max_len` bytes
    ///
    /// Stops at the first zero byte, or takes the whole field if there is
    /// none. Surrounding whitespace is trimmed.
    pub fn read_string(&self, offset: usize, max_len: usize) -> Result<String> {
        self.check_range(offset, max_len)?;
        self.touch();

        Ok(decode_fixed_str(&self.data[offset..offset + max_len]))
    }

    /// Write `value` into a zero-padded field of `max_len` bytes
    ///
    /// Values longer than the field are truncated silently at a character
    /// boundary.
    pub fn write_string(&mut self, value: &str, offset: usize, max_len: usize) -> Result<()> {
        self.check_range(offset, max_len)?;

        let field = &mut self.data[offset..offset + max_len];
        field.fill(0);

        let bytes = truncate_utf8(value, max_len).as_bytes();
        field[..bytes.len()].copy_from_slice(bytes);

        self.touch();
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_range(&self, offset: usize, len: usize) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(DbError::OffsetOutOfBounds {
                offset,
                len,
                page_size: self.data.len(),
            }),
        }
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("number", &self.number)
            .field("size", &self.data.len())
            .field("last_accessed", &self.last_accessed())
            .finish()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Page{{number={}, lastAccessed={}, age={}ms}}",
            self.number,
            self.last_accessed(),
            self.age_millis()
        )
    }
}

// =============================================================================
// Fixed-Width String Helpers (shared with the row codec)
// =============================================================================

/// Longest prefix of `value` that fits in `max_len` bytes without splitting a character
pub(crate) fn truncate_utf8(value: &str, max_len: usize) -> &str {
    if value.len() <= max_len {
        return value;
    }

    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Decode a zero-padded field: up to the first zero byte, lossy UTF-8, trimmed
pub(crate) fn decode_fixed_str(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).trim().to_string()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
