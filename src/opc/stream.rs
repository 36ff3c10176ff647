//! Byte streams: the seekable source/sink a package is stored in, and the scoped
//! stream opened on a single part.

use crate::opc::part::Part;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// A seekable byte store a package can be loaded from and flushed back into.
///
/// Flushing rewrites the whole store, so the store must be able to shrink.
pub trait PackageStream: Read + Write + Seek {
    /// Truncate or extend the underlying store to `len` bytes.
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl PackageStream for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

impl PackageStream for Cursor<Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

impl<T: PackageStream + ?Sized> PackageStream for &mut T {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len)
    }
}

impl<T: PackageStream + ?Sized> PackageStream for Box<T> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len)
    }
}

/// How a stream on a part is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Existing content, positioned at the start.
    Open,
    /// Truncated to empty content.
    Create,
}

/// A scoped read/write stream over one part's content.
///
/// The stream holds the package mutably borrowed, so only one stream exists at a
/// time and the package can neither be cleared nor closed while it is alive. The
/// buffer is committed back to the part when the stream is dropped.
pub struct PartStream<'a> {
    part: &'a mut Part,
    cursor: Cursor<Vec<u8>>,
    writable: bool,
    modified: bool,
    package_dirty: &'a mut bool,
}

impl<'a> PartStream<'a> {
    pub(crate) fn new(
        part: &'a mut Part,
        mode: StreamMode,
        writable: bool,
        package_dirty: &'a mut bool,
    ) -> Self {
        let (blob, modified) = match mode {
            StreamMode::Open => (part.take_blob(), false),
            StreamMode::Create => {
                part.take_blob();
                (Vec::new(), true)
            },
        };
        Self {
            part,
            cursor: Cursor::new(blob),
            writable,
            modified,
            package_dirty,
        }
    }

    /// Length of the part's content in bytes.
    pub fn len(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    /// Truncate or zero-extend the content to `len` bytes.
    pub fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.ensure_writable()?;
        let len = usize::try_from(len).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        self.cursor.get_mut().resize(len, 0);
        self.modified = true;
        Ok(())
    }

    fn ensure_writable(&self) -> io::Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("part {} is read-only", self.part.partname()),
            ))
        }
    }
}

impl Read for PartStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Write for PartStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_writable()?;
        self.modified = true;
        self.cursor.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for PartStream<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl Drop for PartStream<'_> {
    fn drop(&mut self) {
        let blob = std::mem::take(self.cursor.get_mut());
        self.part.set_blob(blob);
        if self.modified {
            *self.package_dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::packuri::PackURI;

    fn part(content: &[u8]) -> Part {
        Part::new(
            PackURI::new("/Files/a.txt").unwrap(),
            "application/unknown".to_string(),
            Default::default(),
            content.to_vec(),
        )
    }

    #[test]
    fn test_open_reads_existing_content() {
        let mut part = part(b"hello");
        let mut dirty = false;
        {
            let mut stream = PartStream::new(&mut part, StreamMode::Open, true, &mut dirty);
            assert_eq!(stream.len(), 5);
            let mut text = String::new();
            stream.read_to_string(&mut text).unwrap();
            assert_eq!(text, "hello");
        }
        assert_eq!(part.blob(), b"hello");
        assert!(!dirty);
    }

    #[test]
    fn test_create_truncates_and_commits_on_drop() {
        let mut part = part(b"old content");
        let mut dirty = false;
        {
            let mut stream = PartStream::new(&mut part, StreamMode::Create, true, &mut dirty);
            assert!(stream.is_empty());
            stream.write_all(b"new").unwrap();
        }
        assert_eq!(part.blob(), b"new");
        assert!(dirty);
    }

    #[test]
    fn test_read_only_stream_rejects_writes_and_keeps_content() {
        let mut part = part(b"keep");
        let mut dirty = false;
        {
            let mut stream = PartStream::new(&mut part, StreamMode::Open, false, &mut dirty);
            let err = stream.write_all(b"x").unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        }
        assert_eq!(part.blob(), b"keep");
        assert!(!dirty);
    }

    #[test]
    fn test_cursor_set_len_shrinks() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3, 4]);
        PackageStream::set_len(&mut cursor, 2).unwrap();
        assert_eq!(cursor.get_ref(), &vec![1u8, 2]);
    }
}
