use crate::source::Section;
use serde::{Serialize, Serializer};
use std::fmt;

/// A four-character atom type tag, stored as its 4 big-endian bytes.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

/// Movie metadata container.
pub const MOOV: FourCC = FourCC(*b"moov");
/// Raw media data container.
pub const MDAT: FourCC = FourCC(*b"mdat");

impl FourCC {
    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else {
            None
        }
    }

    pub fn from_u32(v: u32) -> Self {
        FourCC(v.to_be_bytes())
    }

    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// 4-character string form; non-printable bytes come out as '.'.
    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str_lossy())
    }
}

/// A single atom as produced by [`crate::AtomReader`].
///
/// `data` is a bounded view onto the payload bytes only (header excluded);
/// it borrows the underlying source and is never read eagerly. The caller
/// decides whether to decode the payload, skip it, or walk it as a nested
/// atom sequence by constructing a new reader over `data`.
#[derive(Debug, Clone)]
pub struct Atom<'a, R: ?Sized> {
    pub typ: FourCC,
    /// Total on-disk size, including the 8-byte header (16 bytes when the
    /// extended-size form is used).
    pub size: u64,
    pub data: Section<'a, R>,
}
