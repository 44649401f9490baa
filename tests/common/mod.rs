//! Shared test utilities for integration tests.
//!
//! Source archives are authored with [`Creator`] and [`MemoryEntry`], then
//! read back with [`Archive`].
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zimrecreate::write::{FixedPages, MemoryEntry};
use zimrecreate::{ArchiveBuilder, Compression, CreateResult, Creator, CreatorOptions, EntryUrl};

/// Writes `entries` to `path` as a ZIM archive.
pub fn write_archive(
    path: &Path,
    options: CreatorOptions,
    compression: Compression,
    entries: &[MemoryEntry],
    pages: &FixedPages,
) -> zimrecreate::Result<CreateResult> {
    let mut creator = Creator::new(options);
    creator.start_creation(path, compression)?;
    for entry in entries {
        creator.add_entry(entry)?;
    }
    creator.finish_creation(pages)
}

/// Content of a small website: pages, a stylesheet, an image, a redirect,
/// and metadata.
pub fn sample_entries() -> Vec<MemoryEntry> {
    vec![
        MemoryEntry::content('C', "index.html", "text/html", b"<h1>Welcome</h1>".to_vec())
            .with_title("Home")
            .indexed(true),
        MemoryEntry::content('C', "about.html", "text/html", b"<p>About us</p>".to_vec())
            .with_title("About")
            .indexed(true),
        MemoryEntry::content('C', "style.css", "text/css", b"body { margin: 0 }".to_vec()),
        MemoryEntry::content('C', "logo.png", "image/png", png_bytes()).compressed(false),
        MemoryEntry::content('C', "data.json", "application/json", br#"{"k":1}"#.to_vec())
            .with_parameter(vec![1, 2, 3]),
        MemoryEntry::redirect('C', "home", EntryUrl::new('C', "index.html"))
            .with_title("Home page"),
        MemoryEntry::content('M', "Title", "text/plain", b"Sample site".to_vec()),
    ]
}

/// Main page `C/index.html`, layout page `C/style.css`.
pub fn sample_pages() -> FixedPages {
    FixedPages {
        main: Some(EntryUrl::new('C', "index.html")),
        layout: Some(EntryUrl::new('C', "style.css")),
    }
}

/// Writes the sample site to a fresh temp dir and returns its path.
pub fn sample_archive(compression: Compression) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("origin.zim");
    write_archive(
        &path,
        CreatorOptions::new().indexing("eng"),
        compression,
        &sample_entries(),
        &sample_pages(),
    )
    .expect("Failed to write sample archive");
    (dir, path)
}

/// Bytes that look like a PNG and do not compress well.
pub fn png_bytes() -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    let mut state = 0x2545_F491_u32;
    for _ in 0..512 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        data.push(state as u8);
    }
    data
}

/// Extracts the error from a Result, panicking if it's Ok.
pub fn expect_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => e,
    }
}
