use crate::atoms::{Atom, FourCC};
use crate::source::{ReadAt, Section};
use byteorder::{BigEndian, ByteOrder};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("truncated atom header at offset {offset}: got {got} of {want} bytes")]
    TruncatedHeader { offset: u64, got: usize, want: usize },
    #[error("invalid atom size {size} at offset {offset}")]
    InvalidSize { offset: u64, size: u64 },
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Sequential reader over the sibling atoms of a byte range.
///
/// Each call to [`next`](AtomReader::next) reads one header at the current
/// offset and yields the atom with a bounded payload view, advancing past the
/// atom's full on-disk size. The payload itself is never read. Walking a
/// nested container means constructing a fresh `AtomReader` over the parent
/// atom's `data` section.
///
/// A clean end of the sequence (zero bytes left at the cursor) yields `None`
/// with [`error`](AtomReader::error) remaining empty. A header or
/// extended-size field cut short mid-field latches a terminal error: `next`
/// returns `None` from then on without touching the source again, and
/// `error` reports what happened.
pub struct AtomReader<'a, R: ?Sized> {
    src: &'a R,
    offset: u64,
    err: Option<ParseError>,
}

impl<'a, R: ReadAt + ?Sized> AtomReader<'a, R> {
    pub fn new(src: &'a R) -> Self {
        AtomReader {
            src,
            offset: 0,
            err: None,
        }
    }

    /// The latched terminal error, if the walk stopped on a malformed or
    /// truncated stream rather than a clean end.
    pub fn error(&self) -> Option<&ParseError> {
        self.err.as_ref()
    }

    pub fn next(&mut self) -> Option<Atom<'a, R>> {
        if self.err.is_some() {
            return None;
        }

        let mut header = [0u8; 8];
        let n = match self.src.read_full_at(&mut header, self.offset) {
            Ok(n) => n,
            Err(e) => {
                self.err = Some(e.into());
                return None;
            }
        };
        if n == 0 {
            // Clean end of the atom sequence.
            return None;
        }
        if n < header.len() {
            self.err = Some(ParseError::TruncatedHeader {
                offset: self.offset,
                got: n,
                want: header.len(),
            });
            return None;
        }

        let size32 = BigEndian::read_u32(&header[..4]);
        let typ = FourCC([header[4], header[5], header[6], header[7]]);

        // size == 1 is the sentinel for a 64-bit extended size following the
        // standard header.
        let (size, header_len) = if size32 == 1 {
            let mut ext = [0u8; 8];
            match self.src.read_full_at(&mut ext, self.offset + 8) {
                Ok(8) => {}
                Ok(n) => {
                    self.err = Some(ParseError::TruncatedHeader {
                        offset: self.offset + 8,
                        got: n,
                        want: ext.len(),
                    });
                    return None;
                }
                Err(e) => {
                    self.err = Some(e.into());
                    return None;
                }
            }
            (BigEndian::read_u64(&ext), 16u64)
        } else {
            (size32 as u64, 8u64)
        };

        if size < header_len {
            self.err = Some(ParseError::InvalidSize {
                offset: self.offset,
                size,
            });
            return None;
        }

        let data = Section::new(self.src, self.offset + header_len, size - header_len);
        self.offset += size;
        Some(Atom { typ, size, data })
    }
}
