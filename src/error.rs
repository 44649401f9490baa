//! Error types for ZIM archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when reading a source archive, building a target archive,
//! or driving a recreation run, along with a convenient [`Result<T>`]
//! type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. The
//! recreation pipeline performs no local recovery: every error unwinds to
//! the caller, which should discard the (incomplete) output.
//!
//! ```rust,no_run
//! use zimrecreate::{Archive, Error};
//!
//! fn open(path: &str) -> zimrecreate::Result<()> {
//!     match Archive::open_path(path) {
//!         Ok(archive) => {
//!             println!("{} entries", archive.entry_count());
//!             Ok(())
//!         }
//!         Err(Error::InvalidFormat(msg)) => {
//!             eprintln!("Not a ZIM file: {}", msg);
//!             Err(Error::InvalidFormat(msg))
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! # fn main() {}
//! ```

use std::io;

/// Errors that can occur during ZIM archive operations.
///
/// | Category | Variants |
/// |----------|----------|
/// | I/O | [`Io`][Self::Io] |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader], [`UnsupportedVersion`][Self::UnsupportedVersion] |
/// | Codecs | [`UnsupportedCompression`][Self::UnsupportedCompression] |
/// | Lookup | [`EntryIndexOutOfRange`][Self::EntryIndexOutOfRange], [`ClusterIndexOutOfRange`][Self::ClusterIndexOutOfRange], [`BlobIndexOutOfRange`][Self::BlobIndexOutOfRange], [`NotARedirect`][Self::NotARedirect] |
/// | Integrity | [`ChecksumMismatch`][Self::ChecksumMismatch] |
/// | Creation | [`DuplicateEntry`][Self::DuplicateEntry], [`InvalidUrl`][Self::InvalidUrl], [`InvalidCompressionLevel`][Self::InvalidCompressionLevel], [`InvalidState`][Self::InvalidState] |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a ZIM archive.
    #[error("Invalid ZIM format: {0}")]
    InvalidFormat(String),

    /// A structure of the archive is damaged.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// Byte offset of the damaged structure.
        offset: u64,
        /// Description of the problem.
        reason: String,
    },

    /// The archive declares a format version this crate does not read.
    #[error("Unsupported ZIM version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version from the file header.
        major: u16,
        /// Minor version from the file header.
        minor: u16,
    },

    /// A cluster uses a compression type this crate cannot decode.
    #[error("Unsupported cluster compression: {kind}")]
    UnsupportedCompression {
        /// The raw compression nibble of the cluster info byte.
        kind: u8,
    },

    /// An entry index outside `[0, count)` was requested.
    #[error("Entry index {index} out of range (archive has {count} entries)")]
    EntryIndexOutOfRange {
        /// Requested index.
        index: u32,
        /// Number of entries in the archive.
        count: u32,
    },

    /// A cluster index outside `[0, count)` was referenced.
    #[error("Cluster index {index} out of range (archive has {count} clusters)")]
    ClusterIndexOutOfRange {
        /// Referenced cluster.
        index: u32,
        /// Number of clusters in the archive.
        count: u32,
    },

    /// A blob index outside the cluster's blob table was referenced.
    #[error("Blob {blob} out of range in cluster {cluster} ({count} blobs)")]
    BlobIndexOutOfRange {
        /// Cluster holding the blob.
        cluster: u32,
        /// Referenced blob.
        blob: u32,
        /// Number of blobs in the cluster.
        count: u32,
    },

    /// The MD5 checksum stored in the archive does not match its content.
    #[error("Checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Checksum stored in the archive (hex).
        expected: String,
        /// Checksum computed over the archive (hex).
        actual: String,
    },

    /// A redirect target was requested from an entry that is not a redirect.
    #[error("Entry {url} is not a redirect")]
    NotARedirect {
        /// Namespaced URL of the entry.
        url: String,
    },

    /// The same namespaced URL was added twice to a target archive.
    #[error("Entry already exists: {url}")]
    DuplicateEntry {
        /// Namespaced URL of the entry.
        url: String,
    },

    /// A URL, title, or MIME type cannot be stored in a ZIM archive.
    #[error("Invalid entry URL: {0}")]
    InvalidUrl(String),

    /// The requested compression level is outside the codec's range.
    #[error("Invalid compression level {level} for {compression}")]
    InvalidCompressionLevel {
        /// Requested level.
        level: u32,
        /// Codec name.
        compression: &'static str,
    },

    /// A creation call was made out of protocol order.
    #[error("Invalid creator state: {0}")]
    InvalidState(&'static str),
}

impl Error {
    /// Returns `true` if this is a data corruption error.
    ///
    /// Corruption errors indicate the source archive is damaged.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CorruptHeader { .. }
                | Error::ChecksumMismatch { .. }
                | Error::ClusterIndexOutOfRange { .. }
                | Error::BlobIndexOutOfRange { .. }
        )
    }

    /// Returns `true` if this error describes a bad or unreadable source archive
    /// rather than a failure of the target being built.
    pub fn is_source_error(&self) -> bool {
        self.is_corruption()
            || matches!(
                self,
                Error::InvalidFormat(_)
                    | Error::UnsupportedVersion { .. }
                    | Error::UnsupportedCompression { .. }
                    | Error::EntryIndexOutOfRange { .. }
            )
    }

    /// Creates a corrupt header error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Self::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type alias for ZIM archive operations.
pub type Result<T> = std::result::Result<T, Error>;
