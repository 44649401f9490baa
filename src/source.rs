//! Source-side view of an archive.
//!
//! The recreation pipeline reads its input through [`SourceArchive`] and
//! [`SourceEntry`] rather than through [`read::Archive`](crate::read::Archive)
//! directly, so the pipeline can be driven from any archive engine (and from
//! in-memory fixtures in tests).

use std::io::{Read, Seek};

use crate::Result;
use crate::read::{Archive, Entry as ArchiveEntry};

/// A read-only archive the pipeline enumerates.
pub trait SourceArchive {
    /// Entry view type, borrowing the archive.
    type Entry<'a>: SourceEntry
    where
        Self: 'a;

    /// Returns the number of entries.
    fn entry_count(&self) -> u32;

    /// Returns the entry at `index`.
    fn entry(&self, index: u32) -> Result<Self::Entry<'_>>;

    /// Returns the entry index of the main page, if the header declares one.
    fn main_page(&self) -> Option<u32>;

    /// Returns the entry index of the layout page, if the header declares one.
    fn layout_page(&self) -> Option<u32>;
}

/// One entry of a [`SourceArchive`].
pub trait SourceEntry: Sized {
    /// Single-character namespace.
    fn namespace(&self) -> char;

    /// URL within the namespace.
    fn url(&self) -> &str;

    /// Title (the URL when the entry has no title of its own).
    fn title(&self) -> &str;

    /// MIME type; empty for redirects.
    fn mime_type(&self) -> &str;

    /// Whether this entry redirects to another one.
    fn is_redirect(&self) -> bool;

    /// Resolves the redirect target.
    fn redirect_target(&self) -> Result<Self>;

    /// Opaque extra parameter.
    fn parameter(&self) -> &[u8];

    /// Payload bytes.
    fn data(&self) -> Result<Vec<u8>>;

    /// Payload size in bytes.
    fn size(&self) -> Result<u64>;

    /// Cluster currently holding the payload.
    fn cluster_number(&self) -> u32;
}

impl<R: Read + Seek> SourceArchive for Archive<R> {
    type Entry<'a>
        = ArchiveEntry<'a, R>
    where
        Self: 'a;

    fn entry_count(&self) -> u32 {
        Archive::entry_count(self)
    }

    fn entry(&self, index: u32) -> Result<Self::Entry<'_>> {
        Archive::entry(self, index)
    }

    fn main_page(&self) -> Option<u32> {
        Archive::main_page(self)
    }

    fn layout_page(&self) -> Option<u32> {
        Archive::layout_page(self)
    }
}

impl<R: Read + Seek> SourceEntry for ArchiveEntry<'_, R> {
    fn namespace(&self) -> char {
        ArchiveEntry::namespace(self)
    }

    fn url(&self) -> &str {
        ArchiveEntry::url(self)
    }

    fn title(&self) -> &str {
        ArchiveEntry::title(self)
    }

    fn mime_type(&self) -> &str {
        ArchiveEntry::mime_type(self)
    }

    fn is_redirect(&self) -> bool {
        ArchiveEntry::is_redirect(self)
    }

    fn redirect_target(&self) -> Result<Self> {
        ArchiveEntry::redirect_target(self)
    }

    fn parameter(&self) -> &[u8] {
        ArchiveEntry::parameter(self)
    }

    fn data(&self) -> Result<Vec<u8>> {
        ArchiveEntry::data(self)
    }

    fn size(&self) -> Result<u64> {
        ArchiveEntry::size(self)
    }

    fn cluster_number(&self) -> u32 {
        ArchiveEntry::cluster_number(self)
    }
}
