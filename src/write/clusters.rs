//! Open clusters and the spill file holding closed ones.
//!
//! The MIME list must directly follow the header, and its length is only
//! known once every entry was added, so clusters cannot be streamed to the
//! output as they close. They go to an anonymous temporary file instead and
//! are copied behind the directory at finish.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};

use crate::Result;
use crate::codec::Compression;
use crate::format::cluster::ClusterBuilder;

/// A cluster still accepting blobs, with the pending entries it holds.
#[derive(Debug)]
pub(super) struct OpenCluster {
    builder: ClusterBuilder,
    members: Vec<usize>,
}

impl OpenCluster {
    pub(super) fn new(compression: Compression) -> Self {
        Self {
            builder: ClusterBuilder::new(compression),
            members: Vec::new(),
        }
    }

    /// Adds the payload of pending entry `entry`; returns its blob number.
    pub(super) fn add(&mut self, entry: usize, data: &[u8]) -> u32 {
        self.members.push(entry);
        self.builder.add_blob(data)
    }

    pub(super) fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }

    pub(super) fn raw_size(&self) -> u64 {
        self.builder.raw_size()
    }

    /// Takes the content out, leaving an empty cluster with the same codec.
    pub(super) fn take(&mut self) -> (ClusterBuilder, Vec<usize>) {
        let fresh = ClusterBuilder::new(self.builder.compression());
        (
            std::mem::replace(&mut self.builder, fresh),
            std::mem::take(&mut self.members),
        )
    }
}

/// Closed clusters, serialized back to back in a temporary file.
#[derive(Debug)]
pub(super) struct ClusterSpill {
    file: File,
    offsets: Vec<u64>,
    len: u64,
}

impl ClusterSpill {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            file: tempfile::tempfile()?,
            offsets: Vec::new(),
            len: 0,
        })
    }

    /// Appends a serialized cluster and returns its cluster number.
    pub(super) fn push(&mut self, cluster: &[u8]) -> Result<u32> {
        self.file.write_all(cluster)?;
        self.offsets.push(self.len);
        self.len += cluster.len() as u64;
        Ok((self.offsets.len() - 1) as u32)
    }

    /// Returns the number of clusters spilled.
    pub(super) fn count(&self) -> u32 {
        self.offsets.len() as u32
    }

    /// Returns the total size of all spilled clusters.
    pub(super) fn len(&self) -> u64 {
        self.len
    }

    /// Returns the offset of each cluster relative to the first one.
    pub(super) fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Copies every spilled cluster to `out`.
    pub(super) fn copy_to<W: Write>(&mut self, out: &mut W) -> Result<u64> {
        self.file.flush()?;
        self.file.seek(SeekFrom::Start(0))?;
        let copied = io::copy(&mut self.file, out)?;
        if copied != self.len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("cluster spill file holds {} of {} bytes", copied, self.len),
            )
            .into());
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_cluster_take_resets() {
        let mut open = OpenCluster::new(Compression::Zstd);
        assert!(open.is_empty());
        assert_eq!(open.add(4, b"abc"), 0);
        assert_eq!(open.add(9, b"de"), 1);
        assert_eq!(open.raw_size(), 5);

        let (builder, members) = open.take();
        assert_eq!(builder.blob_count(), 2);
        assert_eq!(builder.compression(), Compression::Zstd);
        assert_eq!(members, vec![4, 9]);
        assert!(open.is_empty());
        assert_eq!(open.add(1, b"x"), 0);
    }

    #[test]
    fn test_spill_numbers_and_copies_clusters() {
        let mut spill = ClusterSpill::new().unwrap();
        assert_eq!(spill.push(b"first").unwrap(), 0);
        assert_eq!(spill.push(b"second").unwrap(), 1);
        assert_eq!(spill.count(), 2);
        assert_eq!(spill.offsets(), &[0, 5]);
        assert_eq!(spill.len(), 11);

        let mut out = Vec::new();
        assert_eq!(spill.copy_to(&mut out).unwrap(), 11);
        assert_eq!(out, b"firstsecond");
    }
}
