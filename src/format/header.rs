//! ZIM file header structure and parsing.

use std::io::{Read, Write};

use crate::{Error, Result};

use super::reader::{read_u16_le, read_u32_le, read_u64_le, write_u16_le, write_u32_le, write_u64_le};
use super::{HEADER_SIZE, MAGIC, NO_PAGE, VERSION_MAJOR, VERSION_MAJOR_MAX, VERSION_MINOR};

/// The 80-byte header at the start of every ZIM file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fileheader {
    /// Format version - major number.
    pub major_version: u16,
    /// Format version - minor number.
    pub minor_version: u16,
    /// Unique identifier of this archive.
    pub uuid: [u8; 16],
    /// Number of directory entries.
    pub article_count: u32,
    /// Number of clusters.
    pub cluster_count: u32,
    /// Position of the URL pointer list.
    pub url_ptr_pos: u64,
    /// Position of the title pointer list.
    pub title_ptr_pos: u64,
    /// Position of the cluster pointer list.
    pub cluster_ptr_pos: u64,
    /// Position of the MIME type list.
    pub mime_list_pos: u64,
    /// Entry index of the main page, if any.
    pub main_page: Option<u32>,
    /// Entry index of the layout page, if any.
    pub layout_page: Option<u32>,
    /// Position of the MD5 checksum.
    pub checksum_pos: u64,
}

impl Default for Fileheader {
    fn default() -> Self {
        Self {
            major_version: VERSION_MAJOR,
            minor_version: VERSION_MINOR,
            uuid: [0; 16],
            article_count: 0,
            cluster_count: 0,
            url_ptr_pos: HEADER_SIZE,
            title_ptr_pos: HEADER_SIZE,
            cluster_ptr_pos: HEADER_SIZE,
            mime_list_pos: HEADER_SIZE,
            main_page: None,
            layout_page: None,
            checksum_pos: HEADER_SIZE,
        }
    }
}

impl Fileheader {
    /// Parses the header from a reader positioned at the start of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The magic number is wrong
    /// - The major version is not 5 or 6
    /// - The MIME list does not directly follow the header
    /// - An I/O error occurs
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let magic = read_u32_le(r)?;
        if magic != MAGIC {
            return Err(Error::InvalidFormat(format!(
                "invalid magic number {:#010x}",
                magic
            )));
        }

        let major_version = read_u16_le(r)?;
        let minor_version = read_u16_le(r)?;
        if !(VERSION_MAJOR..=VERSION_MAJOR_MAX).contains(&major_version) {
            return Err(Error::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let mut uuid = [0u8; 16];
        r.read_exact(&mut uuid)?;

        let article_count = read_u32_le(r)?;
        let cluster_count = read_u32_le(r)?;
        let url_ptr_pos = read_u64_le(r)?;
        let title_ptr_pos = read_u64_le(r)?;
        let cluster_ptr_pos = read_u64_le(r)?;
        let mime_list_pos = read_u64_le(r)?;
        let main_page = read_u32_le(r)?;
        let layout_page = read_u32_le(r)?;
        let checksum_pos = read_u64_le(r)?;

        if mime_list_pos != HEADER_SIZE {
            return Err(Error::corrupt_header(
                56,
                format!("MIME list at {} does not follow the header", mime_list_pos),
            ));
        }

        Ok(Self {
            major_version,
            minor_version,
            uuid,
            article_count,
            cluster_count,
            url_ptr_pos,
            title_ptr_pos,
            cluster_ptr_pos,
            mime_list_pos,
            main_page: (main_page != NO_PAGE).then_some(main_page),
            layout_page: (layout_page != NO_PAGE).then_some(layout_page),
            checksum_pos,
        })
    }

    /// Writes the header in its 80-byte on-disk form.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        write_u32_le(w, MAGIC)?;
        write_u16_le(w, self.major_version)?;
        write_u16_le(w, self.minor_version)?;
        w.write_all(&self.uuid)?;
        write_u32_le(w, self.article_count)?;
        write_u32_le(w, self.cluster_count)?;
        write_u64_le(w, self.url_ptr_pos)?;
        write_u64_le(w, self.title_ptr_pos)?;
        write_u64_le(w, self.cluster_ptr_pos)?;
        write_u64_le(w, self.mime_list_pos)?;
        write_u32_le(w, self.main_page.unwrap_or(NO_PAGE))?;
        write_u32_le(w, self.layout_page.unwrap_or(NO_PAGE))?;
        write_u64_le(w, self.checksum_pos)?;
        Ok(())
    }

    /// Returns `true` if the header designates a main page.
    pub fn has_main_page(&self) -> bool {
        self.main_page.is_some()
    }

    /// Returns `true` if the header designates a layout page.
    pub fn has_layout_page(&self) -> bool {
        self.layout_page.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Fileheader {
        Fileheader {
            uuid: *b"0123456789abcdef",
            article_count: 3,
            cluster_count: 1,
            url_ptr_pos: 100,
            title_ptr_pos: 124,
            cluster_ptr_pos: 200,
            main_page: Some(1),
            checksum_pos: 400,
            ..Fileheader::default()
        }
    }

    #[test]
    fn test_header_layout() {
        let mut buf = Vec::new();
        sample().write(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, HEADER_SIZE);
        assert_eq!(&buf[0..4], &MAGIC.to_le_bytes());
        // layout page absent
        assert_eq!(&buf[68..72], &[0xFF; 4]);

        let parsed = Fileheader::parse(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed, sample());
        assert!(parsed.has_main_page());
        assert!(!parsed.has_layout_page());
    }

    #[test]
    fn test_bad_magic() {
        let buf = [0u8; 80];
        let err = Fileheader::parse(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut buf = Vec::new();
        Fileheader {
            major_version: 4,
            ..sample()
        }
        .write(&mut buf)
        .unwrap();
        let err = Fileheader::parse(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { major: 4, .. }));
    }

    #[test]
    fn test_misplaced_mime_list() {
        let mut buf = Vec::new();
        Fileheader {
            mime_list_pos: 1000,
            ..sample()
        }
        .write(&mut buf)
        .unwrap();
        let err = Fileheader::parse(&mut Cursor::new(&buf)).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_truncated_header() {
        let mut buf = Vec::new();
        sample().write(&mut buf).unwrap();
        buf.truncate(40);
        let err = Fileheader::parse(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
