use std::fmt;
use std::fs::File;
use std::io::{self, Read};

/// Positioned reads over a shared byte source.
///
/// Unlike [`std::io::Read`], `read_at` takes `&self` and an absolute offset,
/// so there is no shared cursor: any number of readers may walk disjoint or
/// nested ranges of the same source without coordinating.
pub trait ReadAt {
    /// Read into `buf` starting at `offset`, returning the number of bytes
    /// read. A return of 0 means the offset is at or past the end.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Read until `buf` is full or the source runs out, returning how many
    /// bytes were read. Never returns less than `buf.len()` due to a short
    /// intermediate read.
    fn read_full_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Read exactly `buf.len()` bytes at `offset`, failing with
    /// [`io::ErrorKind::UnexpectedEof`] if the source runs out first.
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        let n = self.read_full_at(buf, offset)?;
        if n < buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "failed to fill whole buffer",
            ));
        }
        Ok(())
    }
}

impl ReadAt for [u8] {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset >= self.len() as u64 {
            return Ok(0);
        }
        let avail = &self[offset as usize..];
        let n = avail.len().min(buf.len());
        buf[..n].copy_from_slice(&avail[..n]);
        Ok(n)
    }
}

impl ReadAt for Vec<u8> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.as_slice().read_at(buf, offset)
    }
}

impl ReadAt for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        #[cfg(unix)]
        {
            std::os::unix::fs::FileExt::read_at(self, buf, offset)
        }
        #[cfg(windows)]
        {
            std::os::windows::fs::FileExt::seek_read(self, buf, offset)
        }
    }
}

impl<R: ReadAt + ?Sized> ReadAt for &R {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read_at(buf, offset)
    }
}

/// A bounded window onto a [`ReadAt`] source: the (source, offset, length)
/// triple behind every atom's payload view.
///
/// A `Section` borrows its source and never owns bytes. Offsets passed to its
/// own [`ReadAt`] impl are relative to the window start and clamped to the
/// window, so a parser recursing into a nested atom sequence can treat the
/// section exactly like a top-level source. The [`Read`] impl maintains a
/// cursor local to this value only.
pub struct Section<'a, R: ?Sized> {
    src: &'a R,
    base: u64,
    len: u64,
    pos: u64,
}

impl<'a, R: ReadAt + ?Sized> Section<'a, R> {
    pub fn new(src: &'a R, base: u64, len: u64) -> Self {
        Section {
            src,
            base,
            len,
            pos: 0,
        }
    }

    /// Length of the window in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drain the whole window into an owned buffer. Fails with
    /// [`io::ErrorKind::UnexpectedEof`] if the underlying source is shorter
    /// than the window claims.
    pub fn read_to_vec(&self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; self.len as usize];
        self.read_exact_at(&mut buf, 0)?;
        Ok(buf)
    }
}

impl<R: ReadAt + ?Sized> ReadAt for Section<'_, R> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset >= self.len {
            return Ok(0);
        }
        let remaining = self.len - offset;
        let cap = (buf.len() as u64).min(remaining) as usize;
        self.src.read_at(&mut buf[..cap], self.base + offset)
    }
}

impl<R: ReadAt + ?Sized> Read for Section<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.pos;
        let n = ReadAt::read_at(self, buf, pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: ?Sized> Clone for Section<'_, R> {
    fn clone(&self) -> Self {
        Section {
            src: self.src,
            base: self.base,
            len: self.len,
            pos: self.pos,
        }
    }
}

impl<R: ?Sized> fmt::Debug for Section<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("base", &self.base)
            .field("len", &self.len)
            .finish()
    }
}
