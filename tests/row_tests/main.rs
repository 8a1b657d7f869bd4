//! Tests for Row and its binary layout
//!
//! These tests verify:
//! - Field validation and normalization (trim, truncate)
//! - Fixed-width encoding at the documented offsets
//! - Empty-slot detection
//! - Reading and writing rows inside a page

use pagedb::row::RowLayout;
use pagedb::storage::Page;
use pagedb::{DbError, Row};

// =============================================================================
// Helper Functions
// =============================================================================

fn alice() -> Row {
    Row::new(1, "alice", "alice@example.com").unwrap()
}

fn assert_invalid(result: pagedb::Result<Row>, expected_field: &str) {
    match result {
        Err(DbError::Validation { field, .. }) => assert_eq!(field, expected_field),
        other => panic!("expected validation error on {}, got {:?}", expected_field, other),
    }
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_new_valid_row() {
    let row = alice();

    assert_eq!(row.id(), 1);
    assert_eq!(row.username(), "alice");
    assert_eq!(row.email(), "alice@example.com");
}

#[test]
fn test_non_positive_id_rejected() {
    assert_invalid(Row::new(0, "alice", "a@b.c"), "id");
    assert_invalid(Row::new(-1, "alice", "a@b.c"), "id");
}

#[test]
fn test_blank_username_rejected() {
    assert_invalid(Row::new(1, "", "a@b.c"), "username");
    assert_invalid(Row::new(1, "   ", "a@b.c"), "username");
}

#[test]
fn test_email_without_at_rejected() {
    assert_invalid(Row::new(1, "alice", "not-an-email"), "email");
}

#[test]
fn test_nul_characters_rejected() {
    assert_invalid(Row::new(1, "al\0ice", "a@b.c"), "username");
    assert_invalid(Row::new(1, "\0", "a@b.c"), "username");
    assert_invalid(Row::new(1, "alice", "alice@exa\0mple.com"), "email");
    assert_invalid(Row::new(1, "alice", "\0"), "email");

    assert!(alice().with_username("bo\0b").is_err());
}

#[test]
fn test_empty_email_allowed() {
    let row = Row::new(1, "alice", "").unwrap();
    assert_eq!(row.email(), "");

    let row = Row::new(1, "alice", "   ").unwrap();
    assert_eq!(row.email(), "");
}

#[test]
fn test_fields_are_trimmed() {
    let row = Row::new(5, "  bob  ", " bob@example.com ").unwrap();

    assert_eq!(row.username(), "bob");
    assert_eq!(row.email(), "bob@example.com");
}

#[test]
fn test_long_fields_are_truncated() {
    let username = "u".repeat(40);
    let email = format!("{}@example.com", "e".repeat(300));

    let row = Row::new(1, &username, &email).unwrap();

    assert_eq!(row.username(), "u".repeat(32));
    assert_eq!(row.email().len(), 256);
    assert!(email.starts_with(row.email()));
}

#[test]
fn test_truncation_keeps_whole_characters() {
    // 20 two-byte characters = 40 bytes
    let username = "é".repeat(20);

    let row = Row::new(1, &username, "").unwrap();

    assert_eq!(row.username(), "é".repeat(16));
    assert_eq!(row.username().len(), 32);
}

#[test]
fn test_with_helpers() {
    let row = alice();

    let renamed = row.with_username("alicia").unwrap();
    assert_eq!(renamed.username(), "alicia");
    assert_eq!(renamed.id(), 1);

    let moved = row.with_email("alice@other.org").unwrap();
    assert_eq!(moved.email(), "alice@other.org");

    let renumbered = row.with_id(9).unwrap();
    assert_eq!(renumbered.id(), 9);
    assert_eq!(renumbered.username(), "alice");

    assert!(row.with_id(0).is_err());
    assert!(row.with_email("nope").is_err());
}

#[test]
fn test_display() {
    assert_eq!(alice().to_string(), "(1, alice, alice@example.com)");
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_default_layout() {
    let layout = RowLayout::default();

    assert_eq!(layout.row_size(), 292);
    assert_eq!(RowLayout::ID_OFFSET, 0);
    assert_eq!(layout.username_offset(), 4);
    assert_eq!(layout.email_offset(), 36);
    assert_eq!(layout.username_size(), 32);
    assert_eq!(layout.email_size(), 256);
}

#[test]
fn test_encode_byte_layout() {
    let layout = RowLayout::default();

    let bytes = layout.encode(&alice());

    assert_eq!(bytes.len(), 292);
    assert_eq!(&bytes[0..4], &1i32.to_le_bytes());
    assert_eq!(&bytes[4..9], b"alice");
    assert!(bytes[9..36].iter().all(|&b| b == 0));
    assert_eq!(&bytes[36..53], b"alice@example.com");
    assert!(bytes[53..].iter().all(|&b| b == 0));
}

#[test]
fn test_encode_decode() {
    let layout = RowLayout::default();
    let row = Row::new(42, "u".repeat(32), "bob@example.com").unwrap();

    let decoded = layout.decode(&layout.encode(&row)).unwrap();

    assert_eq!(decoded, Some(row));
}

#[test]
fn test_truncated_email_decodes() {
    let layout = RowLayout::default();
    let email = format!("{}@example.com", "e".repeat(300));
    let row = Row::new(7, "carol", &email).unwrap();

    let decoded = layout.decode(&layout.encode(&row)).unwrap();

    assert_eq!(decoded, Some(row));
}

#[test]
fn test_decode_empty_slot() {
    let layout = RowLayout::default();

    assert_eq!(layout.decode(&[0u8; 292]).unwrap(), None);

    let mut negative = vec![0u8; 292];
    negative[0..4].copy_from_slice(&(-3i32).to_le_bytes());
    assert_eq!(layout.decode(&negative).unwrap(), None);
}

#[test]
fn test_decode_short_buffer() {
    let layout = RowLayout::default();

    assert!(layout.decode(&[1u8; 100]).is_err());
}

#[test]
fn test_custom_layout_truncates_on_encode() {
    let layout = RowLayout::new(8, 16);
    let row = Row::new(3, "abcdefghij", "c@d.e").unwrap();

    assert_eq!(layout.row_size(), 28);
    let decoded = layout.decode(&layout.encode(&row)).unwrap().unwrap();

    assert_eq!(decoded.username(), "abcdefgh");
    assert_eq!(decoded.email(), "c@d.e");
}

// =============================================================================
// Page Access Tests
// =============================================================================

#[test]
fn test_write_and_read_row_in_page() {
    let layout = RowLayout::default();
    let mut page = Page::new(0, 4096);
    let row = alice();

    layout.write_row(&mut page, 292, &row).unwrap();

    assert_eq!(layout.read_row(&page, 292).unwrap(), Some(row));
    assert_eq!(layout.read_row(&page, 0).unwrap(), None);
    assert_eq!(page.read_int(292).unwrap(), 1);
    assert_eq!(page.read_string(296, 32).unwrap(), "alice");
}

#[test]
fn test_row_past_page_end_rejected() {
    let layout = RowLayout::default();
    let mut page = Page::new(0, 4096);

    let result = layout.write_row(&mut page, 4096 - 291, &alice());

    assert!(matches!(result, Err(DbError::OffsetOutOfBounds { .. })));
    assert!(layout.read_row(&page, 4096 - 291).is_err());
}
