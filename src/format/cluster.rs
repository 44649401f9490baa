//! Clusters: compressed blocks holding the payload of many entries.
//!
//! A cluster is one info byte followed by a (possibly compressed) body.
//! The info byte's low nibble is the [`Compression`] kind; bit `0x10`
//! marks 64-bit blob offsets. The body starts with `n + 1` offsets, each
//! relative to the body start, followed by the `n` blobs:
//!
//! ```text
//! [info] [off_0 .. off_n] [blob_0] [blob_1] ... [blob_n-1]
//! ```
//!
//! `off_0` is the size of the offset table, so the blob count is
//! `off_0 / offset_size - 1`.

use std::io::Read;

use crate::codec::{self, Compression};
use crate::{Error, Result};

/// Info-byte flag for 64-bit blob offsets.
pub const EXTENDED_FLAG: u8 = 0x10;

/// Mask of the compression nibble.
pub const COMPRESSION_MASK: u8 = 0x0F;

/// A decompressed cluster with its blob table.
#[derive(Debug, Clone)]
pub struct Cluster {
    compression: Compression,
    offsets: Vec<u64>,
    body: Vec<u8>,
}

impl Cluster {
    /// Reads and decompresses a cluster of `packed_size` bytes (info byte included).
    ///
    /// # Errors
    ///
    /// Returns an error if the compression kind is unsupported, the body
    /// does not decompress, or the offset table is inconsistent.
    pub fn read<R: Read>(r: &mut R, packed_size: u64) -> Result<Self> {
        if packed_size == 0 {
            return Err(Error::InvalidFormat("empty cluster".into()));
        }
        let mut info = [0u8; 1];
        r.read_exact(&mut info)?;
        let compression = Compression::from_kind(info[0] & COMPRESSION_MASK)?;
        let extended = info[0] & EXTENDED_FLAG != 0;

        let mut packed = Vec::with_capacity((packed_size - 1) as usize);
        r.take(packed_size - 1).read_to_end(&mut packed)?;
        let body = codec::decompress(packed, compression)?;

        let offsets = parse_offsets(&body, extended)?;
        Ok(Self {
            compression,
            offsets,
            body,
        })
    }

    /// Returns the compression this cluster was stored with.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Returns the number of blobs.
    pub fn blob_count(&self) -> u32 {
        (self.offsets.len() - 1) as u32
    }

    /// Returns the content of blob `index`, if present.
    pub fn blob(&self, index: u32) -> Option<&[u8]> {
        let i = index as usize;
        if i + 1 >= self.offsets.len() {
            return None;
        }
        Some(&self.body[self.offsets[i] as usize..self.offsets[i + 1] as usize])
    }

    /// Returns the size of blob `index`, if present.
    pub fn blob_size(&self, index: u32) -> Option<u64> {
        let i = index as usize;
        if i + 1 >= self.offsets.len() {
            return None;
        }
        Some(self.offsets[i + 1] - self.offsets[i])
    }
}

fn parse_offsets(body: &[u8], extended: bool) -> Result<Vec<u64>> {
    let width = if extended { 8 } else { 4 };
    let read_at = |pos: usize| -> Option<u64> {
        let bytes = body.get(pos..pos + width)?;
        Some(if extended {
            u64::from_le_bytes(bytes.try_into().ok()?)
        } else {
            u32::from_le_bytes(bytes.try_into().ok()?) as u64
        })
    };

    let first = read_at(0).ok_or_else(|| Error::InvalidFormat("cluster body too short".into()))?;
    if first == 0 || first % width as u64 != 0 || first > body.len() as u64 {
        return Err(Error::InvalidFormat(format!(
            "invalid cluster offset table size {}",
            first
        )));
    }

    let count = (first / width as u64) as usize;
    let mut offsets = Vec::with_capacity(count);
    offsets.push(first);
    for i in 1..count {
        let offset = read_at(i * width)
            .ok_or_else(|| Error::InvalidFormat("cluster offset table truncated".into()))?;
        if offset < offsets[i - 1] || offset > body.len() as u64 {
            return Err(Error::InvalidFormat(format!(
                "cluster blob offset {} out of order or past end",
                offset
            )));
        }
        offsets.push(offset);
    }
    Ok(offsets)
}

/// Accumulates blobs and serializes them as a cluster.
#[derive(Debug)]
pub struct ClusterBuilder {
    compression: Compression,
    sizes: Vec<u64>,
    data: Vec<u8>,
}

impl ClusterBuilder {
    /// Creates an empty cluster that will be stored with `compression`.
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            sizes: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Appends a blob and returns its index within the cluster.
    pub fn add_blob(&mut self, blob: &[u8]) -> u32 {
        self.sizes.push(blob.len() as u64);
        self.data.extend_from_slice(blob);
        (self.sizes.len() - 1) as u32
    }

    /// Returns the number of blobs added so far.
    pub fn blob_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    /// Returns `true` if no blob was added.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Returns the uncompressed payload size.
    pub fn raw_size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns the compression this cluster will be stored with.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Serializes the cluster: info byte followed by the compressed body.
    pub fn finish(&self, level: u32) -> Result<Vec<u8>> {
        let count = self.sizes.len() as u64 + 1;
        let extended = count * 4 + self.raw_size() > u32::MAX as u64;
        let width: u64 = if extended { 8 } else { 4 };

        let mut body = Vec::with_capacity((count * width + self.raw_size()) as usize);
        let mut offset = count * width;
        let push = |value: u64, body: &mut Vec<u8>| {
            if extended {
                body.extend_from_slice(&value.to_le_bytes());
            } else {
                body.extend_from_slice(&(value as u32).to_le_bytes());
            }
        };
        push(offset, &mut body);
        for size in &self.sizes {
            offset += size;
            push(offset, &mut body);
        }
        body.extend_from_slice(&self.data);

        let info = self.compression.kind() | if extended { EXTENDED_FLAG } else { 0 };
        let mut out = vec![info];
        out.extend(codec::compress(&body, self.compression, level)?);
        Ok(out)
    }
}
