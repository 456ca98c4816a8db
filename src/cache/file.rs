//! Cached file contents and the read-only file view over them.

use std::fs::Metadata;
use std::io::{self, Read, Seek, SeekFrom};
use std::time::SystemTime;

use axum::body::Bytes;

/// Stat metadata captured when a file enters the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Content length in bytes.
    pub len: u64,
    /// Last modification time, when the platform reports one.
    pub modified: Option<SystemTime>,
    pub is_dir: bool,
}

impl FileMeta {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
            is_dir: metadata.is_dir(),
        }
    }
}

/// A cache entry: the full file content plus its metadata.
#[derive(Debug, Clone)]
pub struct CacheFile {
    pub contents: Bytes,
    pub meta: FileMeta,
}

impl CacheFile {
    pub fn new(contents: impl Into<Bytes>, meta: FileMeta) -> Self {
        Self {
            contents: contents.into(),
            meta,
        }
    }

    /// Size charged against the cache capacity.
    pub fn size(&self) -> u64 {
        self.meta.len
    }
}

/// Random-access, read-only view of a cached file.
///
/// Reads start at offset zero and advance a private cursor; the underlying
/// buffer is shared with the cache and never mutated.
#[derive(Debug)]
pub struct VirtualFile {
    contents: Bytes,
    meta: FileMeta,
    position: u64,
}

impl VirtualFile {
    pub fn new(contents: Bytes, meta: FileMeta) -> Self {
        Self {
            contents,
            meta,
            position: 0,
        }
    }

    pub fn stat(&self) -> &FileMeta {
        &self.meta
    }

    /// Release the view. Nothing is held besides a reference count.
    pub fn close(self) -> io::Result<()> {
        Ok(())
    }

    /// Hand the remaining bytes to a response body without copying.
    pub fn into_bytes(self) -> Bytes {
        let start = (self.position as usize).min(self.contents.len());
        self.contents.slice(start..)
    }
}

impl Read for VirtualFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = (self.position as usize).min(self.contents.len());
        let remaining = &self.contents[start..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for VirtualFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.contents.len() as i128;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(offset) => len + offset as i128,
            SeekFrom::Current(offset) => self.position as i128 + offset as i128,
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            ));
        }

        self.position = target as u64;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(len: u64) -> FileMeta {
        FileMeta {
            len,
            modified: None,
            is_dir: false,
        }
    }

    #[test]
    fn test_read_advances_and_hits_eof() {
        let mut file = VirtualFile::new(Bytes::from_static(b"de_dust2"), meta(8));
        let mut buf = [0u8; 5];

        assert_eq!(file.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"de_du");
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"st2");
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_seek_and_remaining_bytes() {
        let mut file = VirtualFile::new(Bytes::from_static(b"0123456789"), meta(10));

        assert_eq!(file.seek(SeekFrom::End(-4)).unwrap(), 6);
        assert_eq!(file.into_bytes(), Bytes::from_static(b"6789"));

        let mut file = VirtualFile::new(Bytes::from_static(b"0123"), meta(4));
        assert!(file.seek(SeekFrom::Current(-1)).is_err());
        file.seek(SeekFrom::Start(100)).unwrap();
        assert!(file.into_bytes().is_empty());
    }

    #[test]
    fn test_stat_reports_captured_metadata() {
        let file = VirtualFile::new(Bytes::from_static(b"abc"), meta(3));
        assert_eq!(file.stat().len, 3);
        assert!(!file.stat().is_dir);
        file.close().unwrap();
    }
}
