//! Presents a source entry through the writer-entry contract.

use crate::source::SourceEntry;
use crate::write::{EntryUrl, WriterEntry};
use crate::{Error, Result};

/// MIME types outside `text/*` that still go into compressed clusters.
const COMPRESSIBLE_MIME_TYPES: [&str; 3] =
    ["application/javascript", "application/json", "image/svg+xml"];

/// Returns `true` if content of `mime_type` is worth compressing.
///
/// Text and a few text-based formats are; images, video, and other binary
/// media are assumed to be compressed already.
pub fn is_compressible_mime(mime_type: &str) -> bool {
    mime_type.starts_with("text") || COMPRESSIBLE_MIME_TYPES.contains(&mime_type)
}

/// Returns `true` if content of `mime_type` belongs in the title index.
pub fn is_indexable_mime(mime_type: &str) -> bool {
    mime_type.starts_with("text/html")
}

/// A source entry seen as a [`WriterEntry`].
///
/// Nothing is copied up front: metadata is borrowed from the source entry
/// and the payload is read when the writer asks for it.
#[derive(Debug, Clone)]
pub struct EntryAdapter<E> {
    entry: E,
}

impl<E: SourceEntry> EntryAdapter<E> {
    /// Wraps a source entry.
    pub fn new(entry: E) -> Self {
        Self { entry }
    }

    /// Returns the wrapped source entry.
    pub fn source(&self) -> &E {
        &self.entry
    }

    /// Unwraps the source entry.
    pub fn into_inner(self) -> E {
        self.entry
    }
}

impl<E: SourceEntry> WriterEntry for EntryAdapter<E> {
    fn url(&self) -> EntryUrl {
        EntryUrl::new(self.entry.namespace(), self.entry.url())
    }

    fn title(&self) -> &str {
        self.entry.title()
    }

    fn is_redirect(&self) -> bool {
        self.entry.is_redirect()
    }

    fn mime_type(&self) -> &str {
        if self.entry.is_redirect() {
            ""
        } else {
            self.entry.mime_type()
        }
    }

    fn redirect_url(&self) -> Result<EntryUrl> {
        if !self.entry.is_redirect() {
            return Err(Error::NotARedirect {
                url: self.url().to_string(),
            });
        }
        let target = self.entry.redirect_target()?;
        Ok(EntryUrl::new(target.namespace(), target.url()))
    }

    fn parameter(&self) -> &[u8] {
        self.entry.parameter()
    }

    fn data(&self) -> Result<Vec<u8>> {
        self.entry.data()
    }

    fn size(&self) -> Result<u64> {
        self.entry.size()
    }

    fn should_compress(&self) -> bool {
        is_compressible_mime(self.mime_type())
    }

    fn should_index(&self) -> bool {
        is_indexable_mime(self.mime_type())
    }
}
