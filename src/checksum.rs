//! Checksum computation utilities.
//!
//! ZIM archives end with a 16-byte MD5 digest of every byte that precedes
//! it. The writer computes it on the fly through [`Md5Writer`]; the reader
//! recomputes it with [`md5_of_prefix`] when asked to verify an archive.
//!
//! # Example
//!
//! ```rust
//! use zimrecreate::checksum::Md5Writer;
//! use std::io::Write;
//!
//! let mut buffer = Vec::new();
//! let mut writer = Md5Writer::new(&mut buffer);
//! writer.write_all(b"Hello, World!").unwrap();
//! assert_eq!(writer.bytes_written(), 13);
//! let digest = writer.digest();
//! assert_eq!(digest.len(), 16);
//! ```

use std::io::{self, Read, Write};

use md5::{Digest, Md5};

use crate::READ_BUFFER_SIZE;

/// Size of an MD5 digest in bytes.
pub const MD5_SIZE: usize = 16;

/// A writer wrapper that computes MD5 while writing.
pub struct Md5Writer<W> {
    inner: W,
    hasher: Md5,
    bytes_written: u64,
}

impl<W> Md5Writer<W> {
    /// Creates a new MD5 writer wrapping the given writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Md5::new(),
            bytes_written: 0,
        }
    }

    /// Returns the digest of everything written so far.
    pub fn digest(&self) -> [u8; MD5_SIZE] {
        self.hasher.clone().finalize().into()
    }

    /// Returns the number of bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns a mutable reference to the inner writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consumes the wrapper and returns the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Md5Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Computes the MD5 digest of the first `len` bytes of a reader.
///
/// # Errors
///
/// Returns an error if the reader ends before `len` bytes were consumed.
pub fn md5_of_prefix<R: Read>(reader: &mut R, len: u64) -> io::Result<[u8; MD5_SIZE]> {
    let mut hasher = Md5::new();
    let mut remaining = len;
    let mut buf = [0u8; READ_BUFFER_SIZE];
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = reader.read(&mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive shorter than its checksum position",
            ));
        }
        hasher.update(&buf[..n]);
        remaining -= n as u64;
    }
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_md5_known_value() {
        let mut writer = Md5Writer::new(Vec::new());
        writer.write_all(b"abc").unwrap();
        assert_eq!(
            hex::encode(writer.digest()),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(writer.into_inner(), b"abc");
    }

    #[test]
    fn test_prefix_matches_writer() {
        let data = b"0123456789abcdef".repeat(1000);
        let mut writer = Md5Writer::new(Vec::new());
        writer.write_all(&data[..9000]).unwrap();

        let digest = md5_of_prefix(&mut Cursor::new(&data), 9000).unwrap();
        assert_eq!(digest, writer.digest());
    }

    #[test]
    fn test_prefix_past_end() {
        let err = md5_of_prefix(&mut Cursor::new(b"short"), 10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
