//! The writer-entry contract and its in-memory implementation.

use std::fmt;
use std::path::PathBuf;

use crate::{Error, Result};

/// A (namespace, URL) pair identifying an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryUrl {
    namespace: char,
    url: String,
}

impl EntryUrl {
    /// Creates a URL in `namespace`.
    pub fn new(namespace: char, url: impl Into<String>) -> Self {
        Self {
            namespace,
            url: url.into(),
        }
    }

    /// Returns the namespace character.
    pub fn namespace(&self) -> char {
        self.namespace
    }

    /// Returns the URL within the namespace.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Checks that the URL can be stored in a dirent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for an empty URL, a non-ASCII namespace,
    /// or a URL containing a NUL byte.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::InvalidUrl(format!("empty URL in namespace '{}'", self.namespace)));
        }
        if !self.namespace.is_ascii() || self.namespace == '\0' {
            return Err(Error::InvalidUrl(format!(
                "namespace {:?} is not a printable ASCII character",
                self.namespace
            )));
        }
        if self.url.contains('\0') {
            return Err(Error::InvalidUrl(format!("{}: URL contains NUL", self)));
        }
        Ok(())
    }
}

impl fmt::Display for EntryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.url)
    }
}

/// An entry as the archive writer consumes it.
///
/// Implementors expose the metadata eagerly and the payload lazily: the
/// writer calls [`data`](Self::data) at most once, and only for content
/// entries.
pub trait WriterEntry {
    /// Namespace and URL of the entry.
    fn url(&self) -> EntryUrl;

    /// Title of the entry.
    fn title(&self) -> &str;

    /// Whether the entry is a redirect.
    fn is_redirect(&self) -> bool;

    /// MIME type; empty for redirects.
    fn mime_type(&self) -> &str;

    /// Target of a redirect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotARedirect`] when called on a content entry.
    fn redirect_url(&self) -> Result<EntryUrl>;

    /// Opaque extra parameter, at most 255 bytes.
    fn parameter(&self) -> &[u8] {
        &[]
    }

    /// Payload bytes.
    fn data(&self) -> Result<Vec<u8>>;

    /// Payload size in bytes.
    fn size(&self) -> Result<u64>;

    /// A file the payload can be read from instead of [`data`](Self::data).
    fn filename(&self) -> Option<PathBuf> {
        None
    }

    /// Whether the payload goes into a compressed cluster.
    fn should_compress(&self) -> bool;

    /// Whether the entry is listed in the title index.
    fn should_index(&self) -> bool;
}

/// An owned [`WriterEntry`] built in memory.
///
/// # Example
///
/// ```rust
/// use zimrecreate::write::{MemoryEntry, WriterEntry};
///
/// let page = MemoryEntry::content('C', "index.html", "text/html", b"<p>hi</p>".to_vec())
///     .with_title("Home")
///     .indexed(true);
/// assert_eq!(page.url().to_string(), "C/index.html");
/// assert!(page.should_compress());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    url: EntryUrl,
    title: String,
    mime_type: String,
    redirect: Option<EntryUrl>,
    parameter: Vec<u8>,
    data: Vec<u8>,
    compress: bool,
    index: bool,
}

impl MemoryEntry {
    /// Creates a content entry. Compression is on, title indexing off.
    pub fn content(
        namespace: char,
        url: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        let url = url.into();
        Self {
            title: url.clone(),
            url: EntryUrl::new(namespace, url),
            mime_type: mime_type.into(),
            redirect: None,
            parameter: Vec::new(),
            data,
            compress: true,
            index: false,
        }
    }

    /// Creates a redirect to `target`.
    pub fn redirect(namespace: char, url: impl Into<String>, target: EntryUrl) -> Self {
        let url = url.into();
        Self {
            title: url.clone(),
            url: EntryUrl::new(namespace, url),
            mime_type: String::new(),
            redirect: Some(target),
            parameter: Vec::new(),
            data: Vec::new(),
            compress: false,
            index: false,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the extra parameter.
    pub fn with_parameter(mut self, parameter: Vec<u8>) -> Self {
        self.parameter = parameter;
        self
    }

    /// Selects the compressed or the uncompressed cluster.
    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Includes the entry in the title index.
    pub fn indexed(mut self, index: bool) -> Self {
        self.index = index;
        self
    }
}

impl WriterEntry for MemoryEntry {
    fn url(&self) -> EntryUrl {
        self.url.clone()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn redirect_url(&self) -> Result<EntryUrl> {
        self.redirect.clone().ok_or_else(|| Error::NotARedirect {
            url: self.url.to_string(),
        })
    }

    fn parameter(&self) -> &[u8] {
        &self.parameter
    }

    fn data(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn should_compress(&self) -> bool {
        self.compress
    }

    fn should_index(&self) -> bool {
        self.index
    }
}
