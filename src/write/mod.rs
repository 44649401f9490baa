//! Archive writing API for ZIM archives.
//!
//! [`Creator`] builds a ZIM file in two phases: entries are added one at a
//! time after [`start_creation`](ArchiveBuilder::start_creation), and
//! [`finish_creation`](ArchiveBuilder::finish_creation) lays out the
//! directory and writes the file. Payloads are packed into clusters in the
//! order they arrive, so callers control compression locality through the
//! order of their `add_entry` calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use zimrecreate::Compression;
//! use zimrecreate::write::{
//!     ArchiveBuilder, Creator, CreatorOptions, EntryUrl, FixedPages, MemoryEntry,
//! };
//!
//! let mut creator = Creator::new(CreatorOptions::new().indexing("eng"));
//! creator.start_creation("out.zim".as_ref(), Compression::Zstd)?;
//! creator.add_entry(&MemoryEntry::content('C', "index.html", "text/html", b"<p>hi</p>".to_vec()))?;
//! let pages = FixedPages {
//!     main: Some(EntryUrl::new('C', "index.html")),
//!     layout: None,
//! };
//! let result = creator.finish_creation(&pages)?;
//! println!("Wrote {} entries", result.entries_written);
//! # Ok::<(), zimrecreate::Error>(())
//! ```

mod clusters;
mod directory;
mod entry;
pub(crate) mod options;

pub use entry::{EntryUrl, MemoryEntry, WriterEntry};
pub use options::{CreateResult, CreatorOptions, DEFAULT_MIN_CHUNK_SIZE};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::checksum::{MD5_SIZE, Md5Writer};
use crate::codec::Compression;
use crate::format::header::Fileheader;
use crate::format::reader::{write_cstring, write_u32_le, write_u64_le};
use crate::format::{HEADER_SIZE, NEW_SCHEME_VERSION, VERSION_MAJOR, VERSION_MINOR, mime_marker, namespace};
use crate::{Error, Result};

use clusters::{ClusterSpill, OpenCluster};
use directory::{Directory, PendingEntry, Target, UNASSIGNED};

/// URL of the regenerated title listing, in namespace `X`.
pub const TITLE_LISTING_URL: &str = "listing/titleOrdered/v1";

/// MIME type of the title listing.
pub const LISTING_MIME_TYPE: &str = "application/octet-stream+zimlisting";

/// Main and layout pages of an archive being finished.
///
/// The creator pulls both URLs once, during
/// [`finish_creation`](ArchiveBuilder::finish_creation).
pub trait SpecialPages {
    /// URL of the main page, if any.
    fn main_url(&self) -> Result<Option<EntryUrl>>;

    /// URL of the layout page, if any.
    fn layout_url(&self) -> Result<Option<EntryUrl>>;
}

/// An archive with neither a main nor a layout page.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpecialPages;

impl SpecialPages for NoSpecialPages {
    fn main_url(&self) -> Result<Option<EntryUrl>> {
        Ok(None)
    }

    fn layout_url(&self) -> Result<Option<EntryUrl>> {
        Ok(None)
    }
}

/// Special pages known up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedPages {
    /// Main page URL.
    pub main: Option<EntryUrl>,
    /// Layout page URL.
    pub layout: Option<EntryUrl>,
}

impl SpecialPages for FixedPages {
    fn main_url(&self) -> Result<Option<EntryUrl>> {
        Ok(self.main.clone())
    }

    fn layout_url(&self) -> Result<Option<EntryUrl>> {
        Ok(self.layout.clone())
    }
}

/// The two-phase archive creation protocol.
///
/// Calls must come from a single writer in program order:
/// `start_creation`, any number of `add_entry`, then `finish_creation`.
pub trait ArchiveBuilder {
    /// What a successful `finish_creation` reports.
    type Summary;

    /// Starts writing a new archive to `path`, compressing with `compression`.
    fn start_creation(&mut self, path: &Path, compression: Compression) -> Result<()>;

    /// Adds one entry.
    fn add_entry<E: WriterEntry + ?Sized>(&mut self, entry: &E) -> Result<()>;

    /// Finalizes the archive, querying `pages` for the main and layout pages.
    fn finish_creation<P: SpecialPages + ?Sized>(&mut self, pages: &P) -> Result<Self::Summary>;
}

/// State of the creator.
#[derive(Debug)]
enum CreatorState {
    /// No archive in progress.
    Idle,
    /// Accepting entries.
    Creating(Box<Session>),
    /// The last archive was finished (or abandoned by an error in finish).
    Finished,
}

/// ZIM archive writer.
#[derive(Debug)]
pub struct Creator {
    options: CreatorOptions,
    state: CreatorState,
}

impl Default for Creator {
    fn default() -> Self {
        Self::new(CreatorOptions::default())
    }
}

impl Creator {
    /// Creates a writer with the given options.
    pub fn new(options: CreatorOptions) -> Self {
        Self {
            options,
            state: CreatorState::Idle,
        }
    }

    /// Returns the options.
    pub fn options(&self) -> &CreatorOptions {
        &self.options
    }

    /// Returns `true` between `start_creation` and `finish_creation`.
    pub fn is_creating(&self) -> bool {
        matches!(self.state, CreatorState::Creating(_))
    }

    /// Returns the number of entries added to the archive in progress.
    pub fn entry_count(&self) -> usize {
        match &self.state {
            CreatorState::Creating(session) => session.entries.len(),
            _ => 0,
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        match &mut self.state {
            CreatorState::Creating(session) => Ok(&mut **session),
            _ => Err(Error::InvalidState("add_entry called outside of creation")),
        }
    }
}

impl ArchiveBuilder for Creator {
    type Summary = CreateResult;

    fn start_creation(&mut self, path: &Path, compression: Compression) -> Result<()> {
        if self.is_creating() {
            return Err(Error::InvalidState("creation already started"));
        }
        let level = self.options.level_for(compression)?;
        let session = Session::start(path, compression, level, self.options.min_chunk_bytes())?;
        log::info!(
            "Creating {} ({} level {}, clusters of {} KiB)",
            path.display(),
            compression,
            level,
            self.options.min_chunk_size
        );
        self.state = CreatorState::Creating(Box::new(session));
        Ok(())
    }

    fn add_entry<E: WriterEntry + ?Sized>(&mut self, entry: &E) -> Result<()> {
        self.session_mut()?.add(entry)
    }

    fn finish_creation<P: SpecialPages + ?Sized>(&mut self, pages: &P) -> Result<CreateResult> {
        let session = match std::mem::replace(&mut self.state, CreatorState::Finished) {
            CreatorState::Creating(session) => session,
            other => {
                self.state = other;
                return Err(Error::InvalidState("finish_creation called outside of creation"));
            }
        };
        (*session).finish(pages, self.options.indexing.as_deref())
    }
}

/// One archive in progress.
#[derive(Debug)]
struct Session {
    path: PathBuf,
    output: File,
    level: u32,
    min_chunk_bytes: u64,
    entries: Vec<PendingEntry>,
    by_url: HashMap<EntryUrl, usize>,
    mime_types: Vec<String>,
    mime_index: HashMap<String, u16>,
    compressed: OpenCluster,
    stored: OpenCluster,
    spill: ClusterSpill,
    total_size: u64,
}

impl Session {
    fn start(path: &Path, compression: Compression, level: u32, min_chunk_bytes: u64) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            output: File::create(path)?,
            level,
            min_chunk_bytes,
            entries: Vec::new(),
            by_url: HashMap::new(),
            mime_types: Vec::new(),
            mime_index: HashMap::new(),
            compressed: OpenCluster::new(compression),
            stored: OpenCluster::new(Compression::None),
            spill: ClusterSpill::new()?,
            total_size: 0,
        })
    }

    fn add<E: WriterEntry + ?Sized>(&mut self, entry: &E) -> Result<()> {
        let url = entry.url();
        url.validate()?;
        if self.by_url.contains_key(&url) {
            return Err(Error::DuplicateEntry {
                url: url.to_string(),
            });
        }
        let title = entry.title();
        if title.contains('\0') {
            return Err(Error::InvalidUrl(format!("{}: title contains NUL", url)));
        }
        if entry.parameter().len() > u8::MAX as usize {
            return Err(Error::InvalidUrl(format!(
                "{}: parameter of {} bytes exceeds 255",
                url,
                entry.parameter().len()
            )));
        }

        let (target, data) = if entry.is_redirect() {
            let target = entry.redirect_url()?;
            target.validate()?;
            (Target::Redirect(target), None)
        } else {
            let mime_type = self.mime_type_index(entry.mime_type())?;
            let target = Target::Content {
                mime_type,
                cluster: UNASSIGNED,
                blob: 0,
            };
            (target, Some(entry.data()?))
        };

        let index = self.push_entry(PendingEntry {
            url,
            title: title.to_owned(),
            parameter: entry.parameter().to_vec(),
            indexed: entry.should_index(),
            target,
        });
        if let Some(data) = data {
            self.total_size += data.len() as u64;
            self.store_payload(index, &data, entry.should_compress())?;
        }
        Ok(())
    }

    fn push_entry(&mut self, entry: PendingEntry) -> usize {
        let index = self.entries.len();
        self.by_url.insert(entry.url.clone(), index);
        self.entries.push(entry);
        index
    }

    fn mime_type_index(&mut self, mime_type: &str) -> Result<u16> {
        if let Some(&index) = self.mime_index.get(mime_type) {
            return Ok(index);
        }
        if mime_type.is_empty() || mime_type.contains('\0') {
            return Err(Error::InvalidUrl(format!(
                "MIME type {:?} cannot be stored",
                mime_type
            )));
        }
        let index = u16::try_from(self.mime_types.len())
            .ok()
            .filter(|&i| i < mime_marker::DELETED)
            .ok_or(Error::InvalidState("too many distinct MIME types"))?;
        self.mime_types.push(mime_type.to_owned());
        self.mime_index.insert(mime_type.to_owned(), index);
        Ok(index)
    }

    fn store_payload(&mut self, entry: usize, data: &[u8], compress: bool) -> Result<()> {
        let open = if compress {
            &mut self.compressed
        } else {
            &mut self.stored
        };
        let blob = open.add(entry, data);
        let full = open.raw_size() >= self.min_chunk_bytes;
        if let Target::Content { blob: slot, .. } = &mut self.entries[entry].target {
            *slot = blob;
        }
        if full {
            self.close_cluster(compress)?;
        }
        Ok(())
    }

    fn close_cluster(&mut self, compressed: bool) -> Result<()> {
        let open = if compressed {
            &mut self.compressed
        } else {
            &mut self.stored
        };
        if open.is_empty() {
            return Ok(());
        }
        let (builder, members) = open.take();
        let bytes = builder.finish(self.level)?;
        let number = self.spill.push(&bytes)?;
        log::debug!(
            "Closed cluster {} ({} blobs, {} -> {} bytes, {})",
            number,
            builder.blob_count(),
            builder.raw_size(),
            bytes.len(),
            builder.compression()
        );
        for member in members {
            if let Target::Content { cluster, .. } = &mut self.entries[member].target {
                *cluster = number;
            }
        }
        Ok(())
    }

    fn resolve_page(&self, what: &str, url: Option<EntryUrl>, dir: &Directory) -> Option<u32> {
        let url = url?;
        let position = self.by_url.get(&url).and_then(|&i| dir.position(i));
        if position.is_none() {
            log::warn!("{} page {} is not in the archive; leaving it unset", what, url);
        }
        position
    }

    fn finish<P: SpecialPages + ?Sized>(mut self, pages: &P, indexing: Option<&str>) -> Result<CreateResult> {
        let listing = match indexing {
            Some(language) => {
                let url = EntryUrl::new(namespace::INDEX, TITLE_LISTING_URL);
                if self.by_url.contains_key(&url) {
                    return Err(Error::DuplicateEntry {
                        url: url.to_string(),
                    });
                }
                log::debug!("Generating title listing (language {})", language);
                let mime_type = self.mime_type_index(LISTING_MIME_TYPE)?;
                Some(self.push_entry(PendingEntry {
                    url,
                    title: String::new(),
                    parameter: Vec::new(),
                    indexed: false,
                    target: Target::Content {
                        mime_type,
                        cluster: UNASSIGNED,
                        blob: 0,
                    },
                }))
            }
            None => None,
        };

        let live = directory::live_entries(&self.entries, &self.by_url);
        let dir = Directory::new(&self.entries, &live);

        if let Some(listing) = listing {
            let data = dir.title_listing(&self.entries);
            self.total_size += data.len() as u64;
            self.store_payload(listing, &data, true)?;
        }
        self.close_cluster(true)?;
        self.close_cluster(false)?;

        let main_page = self.resolve_page("Main", pages.main_url()?, &dir);
        let layout_page = self.resolve_page("Layout", pages.layout_url()?, &dir);

        let dirents = dir.dirents(&self.entries, &self.by_url)?;
        let title_ptrs = dir.title_order(&self.entries);

        let count = dir.len() as u64;
        let mime_list_len: u64 = self
            .mime_types
            .iter()
            .map(|m| m.len() as u64 + 1)
            .sum::<u64>()
            + 1;
        let url_ptr_pos = HEADER_SIZE + mime_list_len;
        let title_ptr_pos = url_ptr_pos + count * 8;
        let dirents_pos = title_ptr_pos + count * 4;
        let dirents_len: u64 = dirents.iter().map(|d| d.encoded_len()).sum();
        let cluster_ptr_pos = dirents_pos + dirents_len;
        let clusters_pos = cluster_ptr_pos + u64::from(self.spill.count()) * 8;
        let checksum_pos = clusters_pos + self.spill.len();

        let new_scheme = self
            .entries
            .iter()
            .any(|e| e.url.namespace() == namespace::CONTENT);
        let (major_version, minor_version) = if new_scheme {
            NEW_SCHEME_VERSION
        } else {
            (VERSION_MAJOR, VERSION_MINOR)
        };
        let header = Fileheader {
            major_version,
            minor_version,
            uuid: rand::random(),
            article_count: dir.len(),
            cluster_count: self.spill.count(),
            url_ptr_pos,
            title_ptr_pos,
            cluster_ptr_pos,
            mime_list_pos: HEADER_SIZE,
            main_page,
            layout_page,
            checksum_pos,
        };

        let mut out = Md5Writer::new(BufWriter::new(&self.output));
        header.write(&mut out)?;
        for mime in &self.mime_types {
            write_cstring(&mut out, mime)?;
        }
        out.write_all(&[0])?;

        let mut offset = dirents_pos;
        for dirent in &dirents {
            write_u64_le(&mut out, offset)?;
            offset += dirent.encoded_len();
        }
        for position in &title_ptrs {
            write_u32_le(&mut out, *position)?;
        }
        for dirent in &dirents {
            dirent.write(&mut out)?;
        }
        for cluster_offset in self.spill.offsets() {
            write_u64_le(&mut out, clusters_pos + cluster_offset)?;
        }
        self.spill.copy_to(&mut out)?;
        debug_assert_eq!(out.bytes_written(), checksum_pos);

        let digest = out.digest();
        let mut inner = out.into_inner();
        inner.write_all(&digest)?;
        inner.flush()?;

        let redirects_written = dir
            .order()
            .iter()
            .filter(|&&i| matches!(self.entries[i].target, Target::Redirect(_)))
            .count() as u32;
        let result = CreateResult {
            entries_written: dir.len(),
            redirects_written,
            redirects_dropped: live.iter().filter(|&&alive| !alive).count() as u32,
            clusters_written: self.spill.count(),
            total_size: self.total_size,
            compressed_size: self.spill.len(),
            file_size: checksum_pos + MD5_SIZE as u64,
        };
        log::info!(
            "Finished {}: {} entries ({} redirects) in {} clusters, {} bytes",
            self.path.display(),
            result.entries_written,
            result.redirects_written,
            result.clusters_written,
            result.file_size
        );
        Ok(result)
    }
}
