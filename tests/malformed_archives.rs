//! Tests for malformed and corrupted archive handling.
//!
//! A payload that cannot be parsed must fail with `CorruptArchive` and must
//! never leave a workspace behind.

mod common;

use common::{count_entries, create_archive, expect_err, manager};
use zipspace::ExtractError;

fn assert_corrupt(err: &ExtractError) {
    assert!(err.is_corruption(), "expected CorruptArchive, got {err:?}");
    assert!(!err.is_security_error());
}

#[test]
fn test_empty_payload() {
    let (_dir, manager) = manager();
    assert_corrupt(&expect_err(manager.extract(&[])));
    assert_eq!(count_entries(manager.base_directory()), 0);
}

#[test]
fn test_not_a_zip() {
    let (_dir, manager) = manager();
    let zeros = [0u8; 512];
    let payloads: [&[u8]; 4] = [
        b"this is plain text, not an archive",
        b"7z\xbc\xaf\x27\x1c\x00\x04",
        b"PK\x03\x04",
        &zeros,
    ];
    for payload in payloads {
        assert_corrupt(&expect_err(manager.extract(payload)));
    }
    assert_eq!(count_entries(manager.base_directory()), 0);
    assert!(manager.active().is_empty());
}

#[test]
fn test_truncated_archive() {
    let (_dir, manager) = manager();
    let bytes = create_archive(&[("a.txt", b"some content" as &[u8])]);

    for cut in [bytes.len() / 2, bytes.len() - 1, 10] {
        assert_corrupt(&expect_err(manager.extract(&bytes[..cut])));
    }
    assert_eq!(count_entries(manager.base_directory()), 0);
}

#[test]
fn test_crc_mismatch_rolls_back() {
    let (_dir, manager) = manager();
    let content = b"payload that will be damaged in place";
    let mut bytes = create_archive(&[
        ("first.txt", b"intact" as &[u8]),
        ("damaged.txt", content.as_slice()),
    ]);

    let offset = bytes
        .windows(content.len())
        .position(|w| w == content)
        .expect("stored content present");
    bytes[offset] ^= 0xFF;

    let err = expect_err(manager.extract(&bytes));
    assert_corrupt(&err);
    assert_eq!(count_entries(manager.base_directory()), 0);
    assert!(manager.active().is_empty());
}

#[test]
fn test_corruption_does_not_affect_existing_workspaces() {
    let (_dir, manager) = manager();
    let good = manager
        .extract(&create_archive(&[("keep.txt", b"keep" as &[u8])]))
        .unwrap();

    assert_corrupt(&expect_err(manager.extract(b"garbage")));

    assert_eq!(manager.active(), vec![good]);
    assert_eq!(manager.read(&good, "keep.txt").unwrap(), "keep");
}
