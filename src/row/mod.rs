//! Row Module
//!
//! The single fixed-schema record type and its binary layout.
//!
//! ## Schema
//! - `id`: positive i32 primary key
//! - `username`: non-blank, at most 32 bytes
//! - `email`: empty or containing `@`, at most 256 bytes
//! - neither string may contain NUL, which terminates a field on disk
//!
//! Fields are trimmed and oversized values are truncated (never rejected),
//! so a constructed row always fits its on-disk fields exactly.

mod codec;

pub use codec::RowLayout;

use std::fmt;

use crate::error::{DbError, Result};
use crate::storage::{truncate_utf8, DEFAULT_EMAIL_SIZE, DEFAULT_USERNAME_SIZE};

/// An immutable, validated table row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row {
    id: i32,
    username: String,
    email: String,
}

impl Row {
    /// Maximum username length in bytes
    pub const MAX_USERNAME_LEN: usize = DEFAULT_USERNAME_SIZE;

    /// Maximum email length in bytes
    pub const MAX_EMAIL_LEN: usize = DEFAULT_EMAIL_SIZE;

    /// Create a row, validating and normalizing every field
    pub fn new(id: i32, username: impl AsRef<str>, email: impl AsRef<str>) -> Result<Self> {
        if id <= 0 {
            return Err(DbError::validation("id", "ID must be positive"));
        }

        let username = username.as_ref().trim();
        if username.is_empty() {
            return Err(DbError::validation(
                "username",
                "Username cannot be null or empty",
            ));
        }
        if username.contains('\0') {
            return Err(DbError::validation(
                "username",
                "Username cannot contain NUL characters",
            ));
        }

        let email = email.as_ref().trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(DbError::validation("email", "Email must contain @ symbol"));
        }
        if email.contains('\0') {
            return Err(DbError::validation("email", "Email cannot contain NUL characters"));
        }

        Ok(Self {
            id,
            username: truncate_utf8(username, Self::MAX_USERNAME_LEN)
                .trim_end()
                .to_string(),
            email: truncate_utf8(email, Self::MAX_EMAIL_LEN)
                .trim_end()
                .to_string(),
        })
    }

    /// Rebuild a row decoded from a page
    ///
    /// Fields were validated when the row was written and are not re-checked.
    pub(crate) fn from_stored(id: i32, username: String, email: String) -> Self {
        Self {
            id,
            username,
            email,
        }
    }

    /// Primary key
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Copy of this row with a different id
    pub fn with_id(&self, id: i32) -> Result<Self> {
        Self::new(id, &self.username, &self.email)
    }

    /// Copy of this row with a different username
    pub fn with_username(&self, username: impl AsRef<str>) -> Result<Self> {
        Self::new(self.id, username, &self.email)
    }

    /// Copy of this row with a different email
    pub fn with_email(&self, email: impl AsRef<str>) -> Result<Self> {
        Self::new(self.id, &self.username, email)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}
