//! Directory entries (dirents).
//!
//! A dirent describes one entry: its namespace, URL, title, and either the
//! (cluster, blob) pair holding its content or the index of the entry it
//! redirects to.
//!
//! ```text
//! content:  mime:u16 param_len:u8 ns:u8 revision:u32 cluster:u32 blob:u32 url\0 title\0 param
//! redirect: 0xffff   param_len:u8 ns:u8 revision:u32 target:u32           url\0 title\0 param
//! ```

use std::io::{Read, Write};

use crate::{Error, Result};

use super::mime_marker;
use super::reader::{
    read_bytes, read_cstring, read_u8, read_u16_le, read_u32_le, write_cstring, write_u16_le,
    write_u32_le,
};

/// What a dirent points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirentKind {
    /// Content stored as blob `blob` of cluster `cluster`.
    Content {
        /// Index into the MIME list.
        mime_type: u16,
        /// Cluster number.
        cluster: u32,
        /// Blob number within the cluster.
        blob: u32,
    },
    /// Redirect to the entry at `target` (URL order).
    Redirect {
        /// Entry index of the target.
        target: u32,
    },
    /// A link target or deleted entry; carries no content.
    Unlinked {
        /// The raw marker value.
        marker: u16,
    },
}

/// A parsed directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirent {
    /// Single-character namespace.
    pub namespace: char,
    /// Revision (always 0 in practice).
    pub revision: u32,
    /// URL, unique within the namespace.
    pub url: String,
    /// Stored title; empty means "same as URL".
    pub title: String,
    /// Opaque extra parameter.
    pub parameter: Vec<u8>,
    /// Content, redirect, or placeholder.
    pub kind: DirentKind,
}

impl Dirent {
    /// Parses a dirent.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace byte is not ASCII, a string is not
    /// valid UTF-8, or the reader ends early.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let mime = read_u16_le(r)?;
        let parameter_len = read_u8(r)?;
        let ns = read_u8(r)?;
        if !ns.is_ascii() {
            return Err(Error::InvalidFormat(format!(
                "namespace byte {:#04x} is not ASCII",
                ns
            )));
        }
        let revision = read_u32_le(r)?;

        let kind = match mime {
            mime_marker::REDIRECT => DirentKind::Redirect {
                target: read_u32_le(r)?,
            },
            mime_marker::LINK_TARGET | mime_marker::DELETED => {
                DirentKind::Unlinked { marker: mime }
            }
            _ => {
                let cluster = read_u32_le(r)?;
                let blob = read_u32_le(r)?;
                DirentKind::Content {
                    mime_type: mime,
                    cluster,
                    blob,
                }
            }
        };

        let url = read_cstring(r)?;
        let title = read_cstring(r)?;
        let parameter = read_bytes(r, parameter_len as usize)?;

        Ok(Self {
            namespace: ns as char,
            revision,
            url,
            title,
            parameter,
            kind,
        })
    }

    /// Writes the dirent in its on-disk form.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        let parameter_len = u8::try_from(self.parameter.len()).map_err(|_| {
            Error::InvalidUrl(format!(
                "{}: parameter of {} bytes exceeds 255",
                self.full_url(),
                self.parameter.len()
            ))
        })?;
        if !self.namespace.is_ascii() {
            return Err(Error::InvalidUrl(format!(
                "namespace '{}' is not ASCII",
                self.namespace
            )));
        }

        let mime = match self.kind {
            DirentKind::Content { mime_type, .. } => mime_type,
            DirentKind::Redirect { .. } => mime_marker::REDIRECT,
            DirentKind::Unlinked { marker } => marker,
        };
        write_u16_le(w, mime)?;
        w.write_all(&[parameter_len, self.namespace as u8])?;
        write_u32_le(w, self.revision)?;
        match self.kind {
            DirentKind::Content { cluster, blob, .. } => {
                write_u32_le(w, cluster)?;
                write_u32_le(w, blob)?;
            }
            DirentKind::Redirect { target } => write_u32_le(w, target)?,
            DirentKind::Unlinked { .. } => {}
        }
        write_cstring(w, &self.url)?;
        write_cstring(w, &self.title)?;
        w.write_all(&self.parameter)?;
        Ok(())
    }

    /// Returns the encoded size in bytes.
    pub fn encoded_len(&self) -> u64 {
        let fixed = match self.kind {
            DirentKind::Content { .. } => 16,
            DirentKind::Redirect { .. } => 12,
            DirentKind::Unlinked { .. } => 8,
        };
        (fixed + self.url.len() + 1 + self.title.len() + 1 + self.parameter.len()) as u64
    }

    /// Returns `true` for redirect dirents.
    pub fn is_redirect(&self) -> bool {
        matches!(self.kind, DirentKind::Redirect { .. })
    }

    /// Returns the title, falling back to the URL when none is stored.
    pub fn title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    /// Returns `namespace/url`.
    pub fn full_url(&self) -> String {
        format!("{}/{}", self.namespace, self.url)
    }
}
