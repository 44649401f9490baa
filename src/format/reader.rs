//! Low-level binary reading and writing utilities for ZIM format parsing.
//!
//! All integers in a ZIM file are little-endian; strings are NUL-terminated
//! UTF-8.

use std::io::{self, Read, Write};

/// Upper bound on a NUL-terminated string (URLs, titles, MIME types).
pub const MAX_CSTRING_LEN: usize = 64 * 1024;

/// Reads a single byte.
pub fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Reads an unsigned 16-bit little-endian integer.
pub fn read_u16_le<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Reads an unsigned 32-bit little-endian integer.
pub fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Reads an unsigned 64-bit little-endian integer.
pub fn read_u64_le<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Reads exact number of bytes into a new vector.
pub fn read_bytes<R: Read>(r: &mut R, count: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; count];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads a NUL-terminated UTF-8 string.
///
/// # Errors
///
/// Returns `InvalidData` if the string is not valid UTF-8 or exceeds
/// [`MAX_CSTRING_LEN`], and `UnexpectedEof` if the terminator is missing.
pub fn read_cstring<R: Read>(r: &mut R) -> io::Result<String> {
    let mut bytes = Vec::new();
    loop {
        let b = read_u8(r)?;
        if b == 0 {
            break;
        }
        if bytes.len() == MAX_CSTRING_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "string exceeds maximum length",
            ));
        }
        bytes.push(b);
    }
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Writes an unsigned 16-bit little-endian integer.
pub fn write_u16_le<W: Write>(w: &mut W, value: u16) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

/// Writes an unsigned 32-bit little-endian integer.
pub fn write_u32_le<W: Write>(w: &mut W, value: u32) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

/// Writes an unsigned 64-bit little-endian integer.
pub fn write_u64_le<W: Write>(w: &mut W, value: u64) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

/// Writes a string followed by a NUL terminator.
pub fn write_cstring<W: Write>(w: &mut W, value: &str) -> io::Result<()> {
    w.write_all(value.as_bytes())?;
    w.write_all(&[0])
}
