//! Archive reading API for ZIM archives.
//!
//! [`Archive`] gives random access to the directory entries of an existing
//! ZIM file and to the payload of each entry. Dirents are parsed on demand;
//! decompressed clusters are kept in a small LRU cache so that reading the
//! entries of one cluster back to back decompresses it only once.
//!
//! Every query takes `&self`: the underlying reader and the cache live behind
//! `RefCell`s, so entries can hold a shared borrow of their archive while
//! their payload is fetched lazily.
//!
//! # Example
//!
//! ```rust,no_run
//! use zimrecreate::read::Archive;
//!
//! let archive = Archive::open_path("wikipedia.zim")?;
//! for index in 0..archive.entry_count() {
//!     let entry = archive.entry(index)?;
//!     println!("{} ({})", entry.full_url(), entry.mime_type());
//! }
//! # Ok::<(), zimrecreate::Error>(())
//! ```

mod entry;

pub use entry::Entry;

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use lru::LruCache;

use crate::checksum::{MD5_SIZE, md5_of_prefix};
use crate::format::HEADER_SIZE;
use crate::format::cluster::Cluster;
use crate::format::dirent::{Dirent, DirentKind};
use crate::format::header::Fileheader;
use crate::format::reader::{read_cstring, read_u64_le};
use crate::{Error, Result};

/// Number of decompressed clusters kept by default.
pub const DEFAULT_CLUSTER_CACHE: usize = 16;

/// Cluster cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Cluster reads answered from the cache.
    pub hits: u64,
    /// Cluster reads that had to decompress.
    pub misses: u64,
}

/// A ZIM archive reader.
pub struct Archive<R> {
    reader: RefCell<R>,
    header: Fileheader,
    file_size: u64,
    mime_types: Vec<String>,
    url_ptrs: Vec<u64>,
    cluster_ptrs: Vec<u64>,
    cache: RefCell<LruCache<u32, Arc<Cluster>>>,
    stats: Cell<CacheStats>,
}

impl<R> std::fmt::Debug for Archive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("header", &self.header)
            .field("file_size", &self.file_size)
            .field("mime_types", &self.mime_types)
            .finish_non_exhaustive()
    }
}

impl Archive<BufReader<File>> {
    /// Opens an archive from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a valid ZIM archive.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Opens an archive from any seekable reader.
    ///
    /// Parses the header, MIME list, URL pointer list, and cluster pointer
    /// list, checking that every pointer lies inside the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a ZIM archive or its index
    /// structures point outside the file.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_cache(reader, DEFAULT_CLUSTER_CACHE)
    }

    /// Opens an archive keeping up to `cache_size` decompressed clusters.
    pub fn open_with_cache(mut reader: R, cache_size: usize) -> Result<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        if file_size < HEADER_SIZE {
            return Err(Error::InvalidFormat(format!(
                "file of {} bytes is too small for a ZIM header",
                file_size
            )));
        }
        let header = Fileheader::parse(&mut reader)?;

        let count = header.article_count as u64;
        check_table(file_size, header.url_ptr_pos, count * 8, "URL pointer list", 32)?;
        check_table(file_size, header.title_ptr_pos, count * 4, "title pointer list", 40)?;
        check_table(
            file_size,
            header.cluster_ptr_pos,
            header.cluster_count as u64 * 8,
            "cluster pointer list",
            48,
        )?;
        if header.checksum_pos > file_size {
            return Err(Error::corrupt_header(72, "checksum position past end of file"));
        }

        reader.seek(SeekFrom::Start(header.mime_list_pos))?;
        let mut mime_types = Vec::new();
        loop {
            let mime = read_cstring(&mut reader)?;
            if mime.is_empty() {
                break;
            }
            mime_types.push(mime);
        }
        log::debug!("MIME list: {:?}", mime_types);

        let url_ptrs = read_pointers(&mut reader, header.url_ptr_pos, header.article_count)?;
        let cluster_ptrs = read_pointers(&mut reader, header.cluster_ptr_pos, header.cluster_count)?;
        // Clusters end where the next one starts; the last one at the checksum.
        let data_end = if header.checksum_pos > 0 {
            header.checksum_pos
        } else {
            file_size
        };
        for (i, &ptr) in url_ptrs.iter().enumerate() {
            if ptr < HEADER_SIZE || ptr >= file_size {
                return Err(Error::corrupt_header(
                    header.url_ptr_pos + i as u64 * 8,
                    format!("dirent {} at {} outside the file", i, ptr),
                ));
            }
        }
        for (i, &ptr) in cluster_ptrs.iter().enumerate() {
            if ptr < HEADER_SIZE || ptr >= data_end {
                return Err(Error::corrupt_header(
                    header.cluster_ptr_pos + i as u64 * 8,
                    format!("cluster {} at {} outside the data area", i, ptr),
                ));
            }
        }

        log::info!(
            "Opened ZIM {}.{} with {} entries in {} clusters",
            header.major_version,
            header.minor_version,
            header.article_count,
            header.cluster_count
        );

        let cache_size = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            reader: RefCell::new(reader),
            header,
            file_size,
            mime_types,
            url_ptrs,
            cluster_ptrs,
            cache: RefCell::new(LruCache::new(cache_size)),
            stats: Cell::new(CacheStats::default()),
        })
    }

    /// Returns the parsed file header.
    pub fn header(&self) -> &Fileheader {
        &self.header
    }

    /// Returns the number of entries.
    pub fn entry_count(&self) -> u32 {
        self.header.article_count
    }

    /// Returns the number of clusters.
    pub fn cluster_count(&self) -> u32 {
        self.header.cluster_count
    }

    /// Returns the MIME type list.
    pub fn mime_types(&self) -> &[String] {
        &self.mime_types
    }

    /// Returns the size of the archive file.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Returns the entry index of the main page, if the header declares one.
    pub fn main_page(&self) -> Option<u32> {
        self.header.main_page
    }

    /// Returns the entry index of the layout page, if the header declares one.
    pub fn layout_page(&self) -> Option<u32> {
        self.header.layout_page
    }

    /// Returns cluster cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.stats.get()
    }

    /// Reads the entry at `index` (URL order).
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryIndexOutOfRange`] for a bad index, or a format
    /// error if the dirent cannot be parsed.
    pub fn entry(&self, index: u32) -> Result<Entry<'_, R>> {
        let dirent = self.read_dirent(index)?;
        Ok(Entry::new(self, index, dirent))
    }

    /// Finds an entry by namespace and URL.
    ///
    /// Binary search over the URL pointer list, which is sorted by
    /// (namespace, URL).
    pub fn find(&self, namespace: char, url: &str) -> Result<Option<Entry<'_, R>>> {
        let (mut lo, mut hi) = (0u32, self.entry_count());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let dirent = self.read_dirent(mid)?;
            match (dirent.namespace, dirent.url.as_str()).cmp(&(namespace, url)) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Ok(Some(Entry::new(self, mid, dirent))),
            }
        }
        Ok(None)
    }

    /// Verifies the trailing MD5 checksum.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChecksumMismatch`] if the stored digest differs from
    /// the content, or [`Error::InvalidFormat`] if the archive has no checksum.
    pub fn verify_checksum(&self) -> Result<()> {
        let pos = self.header.checksum_pos;
        if pos == 0 || pos + MD5_SIZE as u64 > self.file_size {
            return Err(Error::InvalidFormat("archive has no checksum".into()));
        }
        let mut reader = self.reader.borrow_mut();
        reader.seek(SeekFrom::Start(pos))?;
        let mut expected = [0u8; MD5_SIZE];
        reader.read_exact(&mut expected)?;

        reader.seek(SeekFrom::Start(0))?;
        let actual = md5_of_prefix(&mut *reader, pos)?;
        if actual != expected {
            return Err(Error::ChecksumMismatch {
                expected: hex::encode(expected),
                actual: hex::encode(actual),
            });
        }
        Ok(())
    }

    fn read_dirent(&self, index: u32) -> Result<Dirent> {
        let ptr = *self
            .url_ptrs
            .get(index as usize)
            .ok_or(Error::EntryIndexOutOfRange {
                index,
                count: self.entry_count(),
            })?;
        let mut reader = self.reader.borrow_mut();
        reader.seek(SeekFrom::Start(ptr))?;
        let dirent = Dirent::parse(&mut *reader).map_err(|e| match e {
            Error::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                Error::corrupt_header(ptr, format!("dirent {} truncated", index))
            }
            other => other,
        })?;

        match dirent.kind {
            DirentKind::Content { mime_type, .. }
                if mime_type as usize >= self.mime_types.len() =>
            {
                Err(Error::corrupt_header(
                    ptr,
                    format!("dirent {} uses unknown MIME type {}", index, mime_type),
                ))
            }
            DirentKind::Redirect { target } if target >= self.entry_count() => {
                Err(Error::corrupt_header(
                    ptr,
                    format!("dirent {} redirects to missing entry {}", index, target),
                ))
            }
            _ => Ok(dirent),
        }
    }

    pub(crate) fn cluster(&self, index: u32) -> Result<Arc<Cluster>> {
        if let Some(cluster) = self.cache.borrow_mut().get(&index) {
            let mut stats = self.stats.get();
            stats.hits += 1;
            self.stats.set(stats);
            return Ok(Arc::clone(cluster));
        }

        let start = *self
            .cluster_ptrs
            .get(index as usize)
            .ok_or(Error::ClusterIndexOutOfRange {
                index,
                count: self.cluster_count(),
            })?;
        let end = match self.cluster_ptrs.get(index as usize + 1) {
            Some(&next) => next,
            None if self.header.checksum_pos > 0 => self.header.checksum_pos,
            None => self.file_size,
        };
        if end <= start {
            return Err(Error::corrupt_header(
                self.header.cluster_ptr_pos + index as u64 * 8,
                format!("cluster {} has no data", index),
            ));
        }

        let cluster = {
            let mut reader = self.reader.borrow_mut();
            reader.seek(SeekFrom::Start(start))?;
            Arc::new(Cluster::read(&mut *reader, end - start)?)
        };
        log::debug!(
            "Decompressed cluster {} ({} blobs, {})",
            index,
            cluster.blob_count(),
            cluster.compression()
        );

        let mut stats = self.stats.get();
        stats.misses += 1;
        self.stats.set(stats);
        self.cache.borrow_mut().put(index, Arc::clone(&cluster));
        Ok(cluster)
    }
}

fn check_table(file_size: u64, pos: u64, len: u64, what: &str, field: u64) -> Result<()> {
    if pos < HEADER_SIZE || pos.saturating_add(len) > file_size {
        return Err(Error::corrupt_header(
            field,
            format!("{} at {} (+{} bytes) outside the file", what, pos, len),
        ));
    }
    Ok(())
}

fn read_pointers<R: Read + Seek>(reader: &mut R, pos: u64, count: u32) -> Result<Vec<u64>> {
    reader.seek(SeekFrom::Start(pos))?;
    let mut ptrs = Vec::with_capacity(count as usize);
    for _ in 0..count {
        ptrs.push(read_u64_le(reader)?);
    }
    Ok(ptrs)
}
