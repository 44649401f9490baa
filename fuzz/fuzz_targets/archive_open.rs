//! Fuzz target for Archive::open with arbitrary byte input.
//!
//! This target exercises header, pointer list, dirent, and cluster parsing
//! with potentially malformed or adversarial input, looking for panics,
//! hangs, or runaway allocations.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

/// Entries visited per input; counts in the header are attacker-controlled.
const MAX_ENTRIES: u32 = 256;

fuzz_target!(|data: &[u8]| {
    let Ok(archive) = zimrecreate::Archive::open(Cursor::new(data)) else {
        return;
    };

    for index in 0..archive.entry_count().min(MAX_ENTRIES) {
        let Ok(entry) = archive.entry(index) else {
            continue;
        };
        let _ = entry.full_url();
        let _ = entry.title();
        let _ = entry.mime_type();
        if entry.is_redirect() {
            let _ = entry.redirect_target();
        } else {
            let _ = entry.data();
        }
    }

    let _ = archive.main_page().map(|index| archive.entry(index));
    let _ = archive.verify_checksum();
});
