//! Compression codec infrastructure for ZIM clusters.
//!
//! Every cluster starts with an info byte whose low nibble names the codec
//! used for the rest of the cluster. This module maps that nibble to a
//! [`Compression`] and builds streaming decoders and encoders for it.
//!
//! Only three codecs are produced or consumed: no compression, xz (the
//! legacy ZIM codec, historically called "lzma") and Zstandard.

pub mod xz;
pub mod zstd;

mod copy;

use std::io::{self, Read, Write};

use crate::{Error, Result};

/// A decoder that reads compressed data and produces uncompressed output.
pub trait Decoder: Read + Send {
    /// Returns the compression this decoder undoes.
    fn compression(&self) -> Compression;
}

/// An encoder that takes uncompressed data and produces compressed output.
pub trait Encoder: Write + Send {
    /// Returns the compression this encoder applies.
    fn compression(&self) -> Compression;

    /// Finishes encoding and flushes any remaining data.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

pub use copy::{CopyDecoder, CopyEncoder};
pub use xz::{XzStreamDecoder, XzStreamEncoder};
pub use self::zstd::{ZstdStreamDecoder, ZstdStreamEncoder};

/// Raw compression nibble values stored in a cluster info byte.
pub mod kind {
    /// No compression (pre-2010 writers).
    pub const DEFAULT: u8 = 0;
    /// No compression.
    pub const NONE: u8 = 1;
    /// zlib (deprecated, never produced).
    pub const ZIP: u8 = 2;
    /// bzip2 (deprecated, never produced).
    pub const BZIP2: u8 = 3;
    /// xz stream (LZMA2).
    pub const LZMA: u8 = 4;
    /// Zstandard frame.
    pub const ZSTD: u8 = 5;
}

/// Compression applied to a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    /// Stored as-is.
    None,
    /// xz stream; the legacy ZIM codec.
    #[default]
    Lzma,
    /// Zstandard; the modern ZIM codec.
    Zstd,
}

impl Compression {
    /// Parses the compression nibble of a cluster info byte.
    pub fn from_kind(kind: u8) -> Result<Self> {
        match kind {
            kind::DEFAULT | kind::NONE => Ok(Self::None),
            kind::LZMA => Ok(Self::Lzma),
            kind::ZSTD => Ok(Self::Zstd),
            _ => Err(Error::UnsupportedCompression { kind }),
        }
    }

    /// Returns the nibble written into cluster info bytes.
    pub fn kind(self) -> u8 {
        match self {
            Self::None => kind::NONE,
            Self::Lzma => kind::LZMA,
            Self::Zstd => kind::ZSTD,
        }
    }

    /// Returns the default compression level for this codec.
    pub fn default_level(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Lzma => 9,
            Self::Zstd => 19,
        }
    }

    /// Returns the highest level the codec accepts.
    pub fn max_level(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Lzma => 9,
            Self::Zstd => 22,
        }
    }

    /// Returns a human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lzma => "xz",
            Self::Zstd => "zstd",
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds a decoder for the given compression.
///
/// # Arguments
///
/// * `input` - The compressed data source
/// * `compression` - Codec used for the data
/// * `packed_size` - Number of bytes available from `input`
pub fn build_decoder<R: Read + Send + 'static>(
    input: R,
    compression: Compression,
    packed_size: u64,
) -> Result<Box<dyn Decoder>> {
    match compression {
        Compression::None => Ok(Box::new(CopyDecoder::new(input, packed_size))),
        Compression::Lzma => Ok(Box::new(XzStreamDecoder::new(input))),
        Compression::Zstd => Ok(Box::new(ZstdStreamDecoder::new(input)?)),
    }
}

/// Builds an encoder for the given compression.
///
/// # Arguments
///
/// * `output` - Destination of the compressed data
/// * `compression` - Codec to apply
/// * `level` - Codec-specific level; see [`Compression::default_level`]
pub fn build_encoder<'a, W: Write + Send + 'a>(
    output: W,
    compression: Compression,
    level: u32,
) -> Result<Box<dyn Encoder + 'a>> {
    match compression {
        Compression::None => Ok(Box::new(CopyEncoder::new(output))),
        Compression::Lzma => Ok(Box::new(XzStreamEncoder::new(
            output,
            &xz::XzEncoderOptions { preset: level },
        ))),
        Compression::Zstd => Ok(Box::new(ZstdStreamEncoder::new(
            output,
            &self::zstd::ZstdEncoderOptions {
                level: level as i32,
            },
        )?)),
    }
}

/// Compresses a buffer in one shot.
pub fn compress(data: &[u8], compression: Compression, level: u32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    {
        let mut encoder = build_encoder(&mut out, compression, level)?;
        encoder.write_all(data)?;
        encoder.finish()?;
    }
    Ok(out)
}

/// Decompresses a buffer in one shot.
pub fn decompress(data: Vec<u8>, compression: Compression) -> Result<Vec<u8>> {
    if compression == Compression::None {
        return Ok(data);
    }
    let packed_size = data.len() as u64;
    let mut decoder = build_decoder(io::Cursor::new(data), compression, packed_size)?;
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
