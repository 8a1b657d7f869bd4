//! Row codec
//!
//! Fixed-width binary encoding of rows.
//!
//! ## Layout (defaults)
//! ```text
//! ┌──────────┬─────────────────┬─────────────────┐
//! │ id (4)   │ username (32)   │ email (256)     │
//! └──────────┴─────────────────┴─────────────────┘
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{DbError, Result};
use crate::storage::{
    decode_fixed_str, truncate_utf8, Page, DEFAULT_EMAIL_SIZE, DEFAULT_USERNAME_SIZE,
};

use super::Row;

/// Field widths of the on-disk row record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    username_size: usize,
    email_size: usize,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME_SIZE, DEFAULT_EMAIL_SIZE)
    }
}

impl RowLayout {
    /// Width of the id field
    pub const ID_SIZE: usize = 4;

    /// Offset of the id field
    pub const ID_OFFSET: usize = 0;

    pub const fn new(username_size: usize, email_size: usize) -> Self {
        Self {
            username_size,
            email_size,
        }
    }

    /// Total record size in bytes
    pub const fn row_size(&self) -> usize {
        Self::ID_SIZE + self.username_size + self.email_size
    }

    pub const fn username_offset(&self) -> usize {
        Self::ID_OFFSET + Self::ID_SIZE
    }

    pub const fn email_offset(&self) -> usize {
        self.username_offset() + self.username_size
    }

    pub const fn username_size(&self) -> usize {
        self.username_size
    }

    pub const fn email_size(&self) -> usize {
        self.email_size
    }

    // =========================================================================
    // Byte Encoding
    // =========================================================================

    /// Serialize a row into exactly `row_size()` bytes
    pub fn encode(&self, row: &Row) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.row_size());
        buf.put_i32_le(row.id());
        put_fixed_str(&mut buf, row.username(), self.username_size);
        put_fixed_str(&mut buf, row.email(), self.email_size);
        buf.freeze()
    }

    /// Deserialize a row from the first `row_size()` bytes of `data`
    ///
    /// Returns `Ok(None)` for an empty slot (id <= 0).
    pub fn decode(&self, data: &[u8]) -> Result<Option<Row>> {
        let row_size = self.row_size();
        if data.len() < row_size {
            return Err(DbError::OffsetOutOfBounds {
                offset: 0,
                len: row_size,
                page_size: data.len(),
            });
        }

        let mut buf = &data[..row_size];
        let id = buf.get_i32_le();
        if id <= 0 {
            return Ok(None);
        }

        let username = decode_fixed_str(&buf[..self.username_size]);
        buf.advance(self.username_size);
        let email = decode_fixed_str(&buf[..self.email_size]);

        Ok(Some(Row::from_stored(id, username, email)))
    }

    // =========================================================================
    // Page Access
    // =========================================================================

    /// Write a row into `page` at byte `offset`
    pub fn write_row(&self, page: &mut Page, offset: usize, row: &Row) -> Result<()> {
        page.write_bytes(&self.encode(row), offset)
    }

    /// Read the row stored in `page` at byte `offset`, if the slot is occupied
    pub fn read_row(&self, page: &Page, offset: usize) -> Result<Option<Row>> {
        self.decode(page.read_bytes(offset, self.row_size())?)
    }
}

/// Append `value` as a zero-padded field of exactly `size` bytes
fn put_fixed_str(buf: &mut BytesMut, value: &str, size: usize) {
    let bytes = truncate_utf8(value, size).as_bytes();
    buf.put_slice(bytes);
    buf.put_bytes(0, size - bytes.len());
}
