//! In-memory source archive and recording builder for pipeline tests.

use std::path::{Path, PathBuf};

use crate::codec::Compression;
use crate::source::{SourceArchive, SourceEntry};
use crate::write::{ArchiveBuilder, EntryUrl, SpecialPages, WriterEntry};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct MockEntry {
    pub(crate) namespace: char,
    pub(crate) url: String,
    pub(crate) title: String,
    pub(crate) mime_type: String,
    pub(crate) redirect: Option<u32>,
    pub(crate) parameter: Vec<u8>,
    pub(crate) data: Vec<u8>,
    pub(crate) cluster: u32,
}

impl MockEntry {
    pub(crate) fn content(namespace: char, url: &str, mime_type: &str, cluster: u32) -> Self {
        Self {
            namespace,
            url: url.to_owned(),
            title: url.to_owned(),
            mime_type: mime_type.to_owned(),
            redirect: None,
            parameter: Vec::new(),
            data: format!("payload of {url}").into_bytes(),
            cluster,
        }
    }

    pub(crate) fn redirect(namespace: char, url: &str, target: u32) -> Self {
        Self {
            namespace,
            url: url.to_owned(),
            title: url.to_owned(),
            mime_type: String::new(),
            redirect: Some(target),
            parameter: Vec::new(),
            data: Vec::new(),
            cluster: 0,
        }
    }

    pub(crate) fn in_cluster(mut self, cluster: u32) -> Self {
        self.cluster = cluster;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockArchive {
    pub(crate) entries: Vec<MockEntry>,
    pub(crate) main_page: Option<u32>,
    pub(crate) layout_page: Option<u32>,
}

impl MockArchive {
    pub(crate) fn new(entries: Vec<MockEntry>) -> Self {
        Self {
            entries,
            main_page: None,
            layout_page: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MockView<'a> {
    archive: &'a MockArchive,
    entry: &'a MockEntry,
}

impl SourceArchive for MockArchive {
    type Entry<'a>
        = MockView<'a>
    where
        Self: 'a;

    fn entry_count(&self) -> u32 {
        self.entries.len() as u32
    }

    fn entry(&self, index: u32) -> Result<MockView<'_>> {
        let entry = self
            .entries
            .get(index as usize)
            .ok_or(Error::EntryIndexOutOfRange {
                index,
                count: self.entry_count(),
            })?;
        Ok(MockView {
            archive: self,
            entry,
        })
    }

    fn main_page(&self) -> Option<u32> {
        self.main_page
    }

    fn layout_page(&self) -> Option<u32> {
        self.layout_page
    }
}

impl SourceEntry for MockView<'_> {
    fn namespace(&self) -> char {
        self.entry.namespace
    }

    fn url(&self) -> &str {
        &self.entry.url
    }

    fn title(&self) -> &str {
        &self.entry.title
    }

    fn mime_type(&self) -> &str {
        &self.entry.mime_type
    }

    fn is_redirect(&self) -> bool {
        self.entry.redirect.is_some()
    }

    fn redirect_target(&self) -> Result<Self> {
        let target = self.entry.redirect.ok_or_else(|| Error::NotARedirect {
            url: format!("{}/{}", self.entry.namespace, self.entry.url),
        })?;
        self.archive.entry(target)
    }

    fn parameter(&self) -> &[u8] {
        &self.entry.parameter
    }

    fn data(&self) -> Result<Vec<u8>> {
        Ok(self.entry.data.clone())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.entry.data.len() as u64)
    }

    fn cluster_number(&self) -> u32 {
        self.entry.cluster
    }
}

/// What the recording builder saw of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Recorded {
    pub(crate) url: EntryUrl,
    pub(crate) title: String,
    pub(crate) mime_type: String,
    pub(crate) redirect: Option<EntryUrl>,
    pub(crate) data: Vec<u8>,
    pub(crate) compress: bool,
    pub(crate) index: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Recording {
    pub(crate) started: Option<(PathBuf, Compression)>,
    pub(crate) entries: Vec<Recorded>,
    pub(crate) main: Option<EntryUrl>,
    pub(crate) layout: Option<EntryUrl>,
}

/// Builder that records calls; fails on the `fail_at`-th added entry.
#[derive(Debug, Default)]
pub(crate) struct RecordingBuilder {
    pub(crate) recording: Recording,
    pub(crate) fail_at: Option<usize>,
}

impl ArchiveBuilder for RecordingBuilder {
    type Summary = Recording;

    fn start_creation(&mut self, path: &Path, compression: Compression) -> Result<()> {
        self.recording.started = Some((path.to_path_buf(), compression));
        Ok(())
    }

    fn add_entry<E: WriterEntry + ?Sized>(&mut self, entry: &E) -> Result<()> {
        if self.fail_at == Some(self.recording.entries.len()) {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        let data = entry.data()?;
        assert_eq!(data.len() as u64, entry.size()?);
        assert!(entry.filename().is_none());
        self.recording.entries.push(Recorded {
            url: entry.url(),
            title: entry.title().to_owned(),
            mime_type: entry.mime_type().to_owned(),
            redirect: if entry.is_redirect() {
                Some(entry.redirect_url()?)
            } else {
                None
            },
            data,
            compress: entry.should_compress(),
            index: entry.should_index(),
        });
        Ok(())
    }

    fn finish_creation<P: SpecialPages + ?Sized>(&mut self, pages: &P) -> Result<Recording> {
        self.recording.main = pages.main_url()?;
        self.recording.layout = pages.layout_url()?;
        Ok(self.recording.clone())
    }
}
