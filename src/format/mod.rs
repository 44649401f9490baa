//! ZIM archive format constants, definitions, and low-level parsing utilities.
//!
//! A ZIM file is laid out as:
//!
//! | Section | Content |
//! |---------|---------|
//! | Header | 80 bytes, see [`header::Fileheader`] |
//! | MIME list | NUL-terminated MIME types, ended by an empty string |
//! | URL pointer list | `u64` offset of each dirent, sorted by (namespace, URL) |
//! | Title pointer list | `u32` entry index, sorted by (namespace, title) |
//! | Dirents | see [`dirent::Dirent`] |
//! | Cluster pointer list | `u64` offset of each cluster |
//! | Clusters | see [`cluster`] |
//! | Checksum | 16-byte MD5 of everything above |

pub mod cluster;
pub mod dirent;
pub mod header;
pub mod reader;

/// The ZIM magic number stored in the first four header bytes.
pub const MAGIC: u32 = 72_173_914;

/// Size of the file header in bytes.
pub const HEADER_SIZE: u64 = 80;

/// Major version written for archives using the single-character
/// namespace scheme (`A`, `I`, `M`, `X`, ...).
pub const VERSION_MAJOR: u16 = 5;

/// Highest major version this crate reads.
pub const VERSION_MAJOR_MAX: u16 = 6;

/// Minor version written by this crate.
pub const VERSION_MINOR: u16 = 0;

/// Version written for archives using the `C` content namespace.
pub const NEW_SCHEME_VERSION: (u16, u16) = (6, 1);

/// Header value meaning "no main page" / "no layout page".
pub const NO_PAGE: u32 = u32::MAX;

/// Special values of the dirent MIME-type field.
pub mod mime_marker {
    /// The dirent is a redirect.
    pub const REDIRECT: u16 = 0xFFFF;
    /// The dirent is a link target without content.
    pub const LINK_TARGET: u16 = 0xFFFE;
    /// The dirent was deleted.
    pub const DELETED: u16 = 0xFFFD;
}

/// Well-known namespaces.
pub mod namespace {
    /// Articles (old scheme).
    pub const ARTICLE: char = 'A';
    /// Content (new scheme).
    pub const CONTENT: char = 'C';
    /// Images and other media (old scheme).
    pub const IMAGE: char = 'I';
    /// Archive metadata.
    pub const METADATA: char = 'M';
    /// Search indexes and listings, regenerated by the writer.
    pub const INDEX: char = 'X';
    /// Legacy full-text index, regenerated by the writer.
    pub const LEGACY_INDEX: char = 'Z';
    /// Layout files (stylesheets, scripts).
    pub const LAYOUT: char = '-';

    /// Returns `true` for namespaces whose entries a writer produces on its own.
    pub fn is_generated_index(ns: char) -> bool {
        ns == INDEX || ns == LEGACY_INDEX
    }
}
