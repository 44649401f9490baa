//! Tests for malformed and corrupted archive handling.
//!
//! These tests verify that zimrecreate correctly detects and reports errors
//! when opening or recreating malformed, corrupted, or truncated archives.

mod common;

use std::io::Cursor;

use common::expect_err;
use tempfile::TempDir;
use zimrecreate::recreate::RecreateState;
use zimrecreate::{Archive, Compression, Error, NoProgress, RecreateOptions, Recreator};

/// Checks if an error indicates data corruption or invalid archive format.
fn is_corruption_error(error: &Error) -> bool {
    if error.is_source_error() {
        return true;
    }

    // I/O errors wrapping decompression failures
    if let Error::Io(io_err) = error {
        use std::io::ErrorKind;
        return matches!(
            io_err.kind(),
            ErrorKind::InvalidData | ErrorKind::UnexpectedEof | ErrorKind::Other
        );
    }

    false
}

/// Bytes of the sample archive, compressed with xz.
fn sample_bytes() -> Vec<u8> {
    let (_dir, path) = common::sample_archive(Compression::Lzma);
    std::fs::read(path).unwrap()
}

fn put_u64(bytes: &mut [u8], at: usize, value: u64) {
    bytes[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

/// Offset of the cluster holding `C/index.html`.
fn index_cluster_offset(bytes: &[u8]) -> usize {
    let archive = Archive::open(Cursor::new(bytes)).unwrap();
    let page = archive.find('C', "index.html").unwrap().unwrap();
    let at = (archive.header().cluster_ptr_pos + u64::from(page.cluster_number()) * 8) as usize;
    u64::from_le_bytes(bytes[at..at + 8].try_into().unwrap()) as usize
}

// =============================================================================
// Truncated/Empty Archive Tests
// =============================================================================

#[test]
fn test_empty_input_returns_error() {
    let data: &[u8] = &[];
    let err = expect_err(Archive::open(Cursor::new(data)));
    assert!(matches!(err, Error::InvalidFormat(_)), "{err:?}");
}

#[test]
fn test_truncated_header_returns_error() {
    let bytes = sample_bytes();
    let err = expect_err(Archive::open(Cursor::new(&bytes[..60])));
    assert!(matches!(err, Error::InvalidFormat(_)), "{err:?}");
}

#[test]
fn test_truncated_archive_returns_error() {
    let bytes = sample_bytes();
    let half = &bytes[..bytes.len() / 2];
    let err = expect_err(Archive::open(Cursor::new(half)));
    assert!(is_corruption_error(&err), "{err:?}");
}

// =============================================================================
// Invalid Header Tests
// =============================================================================

#[test]
fn test_bad_magic() {
    let mut bytes = sample_bytes();
    bytes[0] ^= 0xFF;
    let err = expect_err(Archive::open(Cursor::new(bytes)));
    assert!(matches!(err, Error::InvalidFormat(_)), "{err:?}");
}

#[test]
fn test_unsupported_version() {
    for major in [4u16, 7] {
        let mut bytes = sample_bytes();
        bytes[4..6].copy_from_slice(&major.to_le_bytes());
        let err = expect_err(Archive::open(Cursor::new(bytes)));
        assert!(
            matches!(err, Error::UnsupportedVersion { major: m, .. } if m == major),
            "{err:?}"
        );
    }
}

#[test]
fn test_mime_list_must_follow_header() {
    let mut bytes = sample_bytes();
    put_u64(&mut bytes, 56, 96);
    let err = expect_err(Archive::open(Cursor::new(bytes)));
    assert!(
        matches!(err, Error::CorruptHeader { offset: 56, .. }),
        "{err:?}"
    );
}

#[test]
fn test_pointer_list_outside_file() {
    for field in [32usize, 40, 48] {
        let mut bytes = sample_bytes();
        let past_end = bytes.len() as u64 + 100;
        put_u64(&mut bytes, field, past_end);
        let err = expect_err(Archive::open(Cursor::new(bytes)));
        assert!(
            matches!(err, Error::CorruptHeader { offset, .. } if offset == field as u64),
            "field {field}: {err:?}"
        );
    }
}

#[test]
fn test_dirent_pointer_outside_file() {
    let mut bytes = sample_bytes();
    let archive = Archive::open(Cursor::new(&bytes)).unwrap();
    let url_ptr_pos = archive.header().url_ptr_pos as usize;
    drop(archive);
    let past_end = bytes.len() as u64;
    put_u64(&mut bytes, url_ptr_pos, past_end);
    let err = expect_err(Archive::open(Cursor::new(bytes)));
    assert!(err.is_corruption(), "{err:?}");
}

// =============================================================================
// Corrupted Cluster Tests
// =============================================================================

#[test]
fn test_unsupported_cluster_compression() {
    let mut bytes = sample_bytes();
    let offset = index_cluster_offset(&bytes);
    // zlib, which ZIM writers no longer produce
    bytes[offset] = (bytes[offset] & 0xF0) | 2;

    let archive = Archive::open(Cursor::new(bytes)).unwrap();
    let page = archive.find('C', "index.html").unwrap().unwrap();
    let err = expect_err(page.data());
    assert!(
        matches!(err, Error::UnsupportedCompression { kind: 2 }),
        "{err:?}"
    );
}

#[test]
fn test_corrupted_cluster_payload() {
    let mut bytes = sample_bytes();
    let offset = index_cluster_offset(&bytes);
    for b in &mut bytes[offset + 1..offset + 9] {
        *b ^= 0x5A;
    }

    let archive = Archive::open(Cursor::new(bytes)).unwrap();
    let page = archive.find('C', "index.html").unwrap().unwrap();
    let err = expect_err(page.data());
    assert!(is_corruption_error(&err), "{err:?}");
    assert!(matches!(
        archive.verify_checksum(),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_recreation_stops_at_corrupted_cluster() {
    let mut bytes = sample_bytes();
    let offset = index_cluster_offset(&bytes);
    bytes[offset] = (bytes[offset] & 0xF0) | 3;

    let dir = TempDir::new().unwrap();
    let source = Archive::open(Cursor::new(bytes)).unwrap();
    let mut recreator = Recreator::new(source, &RecreateOptions::new());
    let err = expect_err(recreator.run(&dir.path().join("output.zim"), NoProgress));
    assert!(err.is_source_error(), "{err:?}");
    assert_eq!(recreator.state(), RecreateState::Creating);
}
