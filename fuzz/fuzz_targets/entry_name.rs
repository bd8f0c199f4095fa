//! Fuzz target for EntryName::parse with arbitrary string input.
//!
//! Run with: cargo +nightly fuzz run entry_name
//!
//! Key security properties being tested:
//! - Absolute and drive-letter names are never accepted
//! - NUL bytes are never accepted
//! - Accepted names always have at least one meaningful segment

#![no_main]

use libfuzzer_sys::fuzz_target;
use zipspace::EntryName;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(name) = EntryName::parse(raw) else {
        return;
    };

    let normalized = name.as_str();
    assert!(
        !normalized.starts_with('/'),
        "Absolute name accepted: {:?}",
        raw
    );
    assert!(
        !normalized.contains('\\'),
        "Backslash survived normalization: {:?}",
        raw
    );
    assert!(!normalized.contains('\0'), "NUL byte accepted: {:?}", raw);

    let first = name.segments().next();
    assert!(first.is_some(), "Empty name accepted: {:?}", raw);
    if let Some(first) = first {
        let bytes = first.as_bytes();
        assert!(
            !(bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'),
            "Drive prefix accepted: {:?}",
            raw
        );
    }
});
