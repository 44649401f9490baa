//! xz codec, the legacy ZIM cluster compression.
//!
//! ZIM type-4 clusters hold a complete xz container (LZMA2 filter,
//! CRC32 check), so the stream is framed with its own header and footer
//! and needs no out-of-band size.

use std::io::{self, Read, Write};

use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use super::{Compression, Decoder, Encoder};

/// xz decoder.
pub struct XzStreamDecoder<R: Read> {
    inner: XzDecoder<R>,
}

impl<R: Read> std::fmt::Debug for XzStreamDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XzStreamDecoder").finish_non_exhaustive()
    }
}

impl<R: Read + Send> XzStreamDecoder<R> {
    /// Creates a new xz decoder.
    pub fn new(input: R) -> Self {
        Self {
            inner: XzDecoder::new(input),
        }
    }
}

impl<R: Read + Send> Read for XzStreamDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Send> Decoder for XzStreamDecoder<R> {
    fn compression(&self) -> Compression {
        Compression::Lzma
    }
}

/// xz encoder options.
#[derive(Debug, Clone)]
pub struct XzEncoderOptions {
    /// Preset (0-9, default 9 as used for ZIM clusters).
    pub preset: u32,
}

impl Default for XzEncoderOptions {
    fn default() -> Self {
        Self { preset: 9 }
    }
}

/// xz encoder.
pub struct XzStreamEncoder<W: Write> {
    inner: XzEncoder<W>,
}

impl<W: Write + Send> XzStreamEncoder<W> {
    /// Creates a new xz encoder.
    pub fn new(output: W, options: &XzEncoderOptions) -> Self {
        Self {
            inner: XzEncoder::new(output, options.preset.min(9)),
        }
    }

    /// Finishes encoding and returns the underlying writer.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write + Send> Write for XzStreamEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Send> Encoder for XzStreamEncoder<W> {
    fn compression(&self) -> Compression {
        Compression::Lzma
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.inner.finish()?;
        Ok(())
    }
}
