//! Creator options and the result of a finished archive.

use crate::codec::Compression;
use crate::{Error, Result};

/// Default cluster fill threshold, in KiB.
pub const DEFAULT_MIN_CHUNK_SIZE: u32 = 1024;

/// Options for creating archives.
///
/// The compression codec is not an option: it is passed to
/// [`ArchiveBuilder::start_creation`](super::ArchiveBuilder::start_creation)
/// for each archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorOptions {
    /// Language of the title index; `None` disables indexing.
    pub indexing: Option<String>,
    /// A cluster is closed once its uncompressed payload reaches this many KiB.
    pub min_chunk_size: u32,
    /// Codec level; `None` uses [`Compression::default_level`].
    pub compression_level: Option<u32>,
}

impl Default for CreatorOptions {
    fn default() -> Self {
        Self {
            indexing: None,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            compression_level: None,
        }
    }
}

impl CreatorOptions {
    /// Creates default options: no indexing, 1 MiB clusters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the title index for `language`.
    pub fn indexing(mut self, language: impl Into<String>) -> Self {
        self.indexing = Some(language.into());
        self
    }

    /// Disables the title index.
    pub fn no_indexing(mut self) -> Self {
        self.indexing = None;
        self
    }

    /// Sets the cluster fill threshold in KiB (at least 1).
    pub fn min_chunk_size(mut self, kib: u32) -> Self {
        self.min_chunk_size = kib.max(1);
        self
    }

    /// Sets the codec level.
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Returns the cluster fill threshold in bytes.
    pub fn min_chunk_bytes(&self) -> u64 {
        u64::from(self.min_chunk_size) * 1024
    }

    /// Resolves the level to use with `compression`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if the configured level is
    /// above what the codec accepts.
    pub fn level_for(&self, compression: Compression) -> Result<u32> {
        match self.compression_level {
            None => Ok(compression.default_level()),
            Some(level) if level <= compression.max_level() => Ok(level),
            Some(level) => Err(Error::InvalidCompressionLevel {
                level,
                compression: compression.name(),
            }),
        }
    }
}

/// Result of creating an archive.
#[must_use = "creation results should be checked to ensure the archive was written"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateResult {
    /// Number of directory entries written (title listing included).
    pub entries_written: u32,
    /// Number of redirect entries written.
    pub redirects_written: u32,
    /// Redirects dropped because their target was never added.
    pub redirects_dropped: u32,
    /// Number of clusters written.
    pub clusters_written: u32,
    /// Total uncompressed payload bytes.
    pub total_size: u64,
    /// Total bytes of all clusters as stored.
    pub compressed_size: u64,
    /// Size of the output file, checksum included.
    pub file_size: u64,
}

impl CreateResult {
    /// Returns the compression ratio (stored / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.total_size as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_options_default() {
        let opts = CreatorOptions::default();
        assert_eq!(opts.indexing, None);
        assert_eq!(opts.min_chunk_size, 1024);
        assert_eq!(opts.min_chunk_bytes(), 1024 * 1024);
    }

    #[test]
    fn test_creator_options_builder() {
        let opts = CreatorOptions::new()
            .indexing("eng")
            .min_chunk_size(2048)
            .compression_level(3);
        assert_eq!(opts.indexing.as_deref(), Some("eng"));
        assert_eq!(opts.min_chunk_bytes(), 2048 * 1024);
        assert_eq!(opts.level_for(Compression::Zstd).unwrap(), 3);
        assert_eq!(CreatorOptions::new().min_chunk_size(0).min_chunk_size, 1);
    }

    #[test]
    fn test_level_for() {
        let opts = CreatorOptions::new();
        assert_eq!(opts.level_for(Compression::Lzma).unwrap(), 9);
        assert_eq!(opts.level_for(Compression::Zstd).unwrap(), 19);

        let opts = CreatorOptions::new().compression_level(20);
        assert_eq!(opts.level_for(Compression::Zstd).unwrap(), 20);
        assert!(matches!(
            opts.level_for(Compression::Lzma),
            Err(Error::InvalidCompressionLevel { level: 20, .. })
        ));
    }

    #[test]
    fn test_compression_ratio() {
        let result = CreateResult {
            total_size: 1000,
            compressed_size: 250,
            ..Default::default()
        };
        assert!((result.compression_ratio() - 0.25).abs() < f64::EPSILON);
        assert_eq!(CreateResult::default().compression_ratio(), 1.0);
    }
}
