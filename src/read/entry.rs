//! Archive entry view.

use std::io::{Read, Seek};

use crate::format::dirent::{Dirent, DirentKind};
use crate::{Error, Result};

use super::Archive;

/// An entry of a ZIM archive.
///
/// Entries borrow their archive: the payload is only read, and its cluster
/// only decompressed, when [`data`](Self::data) or [`size`](Self::size) is
/// called.
pub struct Entry<'a, R> {
    archive: &'a Archive<R>,
    index: u32,
    dirent: Dirent,
}

impl<R> std::fmt::Debug for Entry<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("index", &self.index)
            .field("dirent", &self.dirent)
            .finish()
    }
}

impl<'a, R: Read + Seek> Entry<'a, R> {
    pub(super) fn new(archive: &'a Archive<R>, index: u32, dirent: Dirent) -> Self {
        Self {
            archive,
            index,
            dirent,
        }
    }

    /// Returns the entry index (position in URL order).
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the raw directory entry.
    pub fn dirent(&self) -> &Dirent {
        &self.dirent
    }

    /// Returns the namespace character.
    pub fn namespace(&self) -> char {
        self.dirent.namespace
    }

    /// Returns the URL within the namespace.
    pub fn url(&self) -> &str {
        &self.dirent.url
    }

    /// Returns `namespace/url`.
    pub fn full_url(&self) -> String {
        self.dirent.full_url()
    }

    /// Returns the title, or the URL when the entry has no title of its own.
    pub fn title(&self) -> &str {
        self.dirent.title()
    }

    /// Returns the MIME type; empty for redirects and placeholders.
    pub fn mime_type(&self) -> &'a str {
        match self.dirent.kind {
            DirentKind::Content { mime_type, .. } => self
                .archive
                .mime_types
                .get(mime_type as usize)
                .map(String::as_str)
                .unwrap_or(""),
            _ => "",
        }
    }

    /// Returns the opaque extra parameter.
    pub fn parameter(&self) -> &[u8] {
        &self.dirent.parameter
    }

    /// Returns `true` if this entry redirects to another one.
    pub fn is_redirect(&self) -> bool {
        self.dirent.is_redirect()
    }

    /// Returns the index of the redirect target, if this is a redirect.
    pub fn redirect_index(&self) -> Option<u32> {
        match self.dirent.kind {
            DirentKind::Redirect { target } => Some(target),
            _ => None,
        }
    }

    /// Resolves the redirect target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotARedirect`] if this entry is not a redirect.
    pub fn redirect_target(&self) -> Result<Entry<'a, R>> {
        let target = self.redirect_index().ok_or_else(|| Error::NotARedirect {
            url: self.full_url(),
        })?;
        self.archive.entry(target)
    }

    /// Returns the number of the cluster holding this entry's payload.
    ///
    /// Redirects and placeholders have no payload and report cluster 0.
    pub fn cluster_number(&self) -> u32 {
        match self.dirent.kind {
            DirentKind::Content { cluster, .. } => cluster,
            _ => 0,
        }
    }

    /// Returns the blob number within the cluster (0 without payload).
    pub fn blob_number(&self) -> u32 {
        match self.dirent.kind {
            DirentKind::Content { blob, .. } => blob,
            _ => 0,
        }
    }

    /// Reads the payload.
    ///
    /// Redirects and placeholders have an empty payload.
    pub fn data(&self) -> Result<Vec<u8>> {
        let DirentKind::Content { cluster, blob, .. } = self.dirent.kind else {
            return Ok(Vec::new());
        };
        let data = self.archive.cluster(cluster)?;
        let bytes = data.blob(blob).ok_or(Error::BlobIndexOutOfRange {
            cluster,
            blob,
            count: data.blob_count(),
        })?;
        Ok(bytes.to_vec())
    }

    /// Returns the payload size in bytes.
    pub fn size(&self) -> Result<u64> {
        let DirentKind::Content { cluster, blob, .. } = self.dirent.kind else {
            return Ok(0);
        };
        let data = self.archive.cluster(cluster)?;
        data.blob_size(blob).ok_or(Error::BlobIndexOutOfRange {
            cluster,
            blob,
            count: data.blob_count(),
        })
    }
}
