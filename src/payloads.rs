//! Decoded payloads of the structural sample-table and media-metadata atoms.
//!
//! Every `decode` here is a one-shot, total transformation of a payload
//! buffer into owned values: lengths are checked against the declared entry
//! counts before any indexing, and nothing retains a reference to the input.

use crate::atoms::FourCC;
use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("data too short: need {need} bytes, have {have}")]
    TooShort { need: u64, have: u64 },
}

fn require(buf: &[u8], need: u64) -> Result<(), DecodeError> {
    if (buf.len() as u64) < need {
        return Err(DecodeError::TooShort {
            need,
            have: buf.len() as u64,
        });
    }
    Ok(())
}

/// Media header (`mdhd`): time scale and duration.
///
/// The version/flags/creation/modification preamble is skipped; the first
/// decoded field sits at byte offset 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaHeaderData {
    pub time_scale: u32,
    pub duration: u32,
}

impl MediaHeaderData {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        require(buf, 24)?;
        Ok(MediaHeaderData {
            time_scale: BigEndian::read_u32(&buf[12..]),
            duration: BigEndian::read_u32(&buf[16..]),
        })
    }
}

/// Handler reference (`hdlr`): component type and subtype tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandlerReferenceData {
    pub component_type: FourCC,
    pub component_subtype: FourCC,
}

impl HandlerReferenceData {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        require(buf, 24)?;
        Ok(HandlerReferenceData {
            component_type: FourCC::from_u32(BigEndian::read_u32(&buf[4..])),
            component_subtype: FourCC::from_u32(BigEndian::read_u32(&buf[8..])),
        })
    }
}

/// Chunk offset table (`stco`), 32-bit offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkOffsetData {
    pub entry_count: u32,
    pub offsets: Vec<u32>,
}

impl ChunkOffsetData {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        require(buf, 8)?;
        let entry_count = BigEndian::read_u32(&buf[4..]);
        require(buf, 8 + entry_count as u64 * 4)?;
        let offsets = (0..entry_count as usize)
            .map(|i| BigEndian::read_u32(&buf[8 + i * 4..]))
            .collect();
        Ok(ChunkOffsetData {
            entry_count,
            offsets,
        })
    }
}

/// Chunk offset table (`co64`), 64-bit offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkOffset64Data {
    pub entry_count: u32,
    pub offsets: Vec<u64>,
}

impl ChunkOffset64Data {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        require(buf, 8)?;
        let entry_count = BigEndian::read_u32(&buf[4..]);
        require(buf, 8 + entry_count as u64 * 8)?;
        let offsets = (0..entry_count as usize)
            .map(|i| BigEndian::read_u64(&buf[8 + i * 8..]))
            .collect();
        Ok(ChunkOffset64Data {
            entry_count,
            offsets,
        })
    }
}

/// Sample size table (`stsz`).
///
/// A non-zero `constant_sample_size` means every sample shares that size and
/// the per-sample table is absent; otherwise `sample_sizes` holds one entry
/// per sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSizeData {
    pub constant_sample_size: u32,
    pub sample_count: u32,
    pub sample_sizes: Vec<u32>,
}

impl SampleSizeData {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        require(buf, 12)?;
        let constant_sample_size = BigEndian::read_u32(&buf[4..]);
        if constant_sample_size != 0 {
            return Ok(SampleSizeData {
                constant_sample_size,
                sample_count: 0,
                sample_sizes: Vec::new(),
            });
        }
        let sample_count = BigEndian::read_u32(&buf[8..]);
        require(buf, 12 + sample_count as u64 * 4)?;
        let sample_sizes = (0..sample_count as usize)
            .map(|i| BigEndian::read_u32(&buf[12 + i * 4..]))
            .collect();
        Ok(SampleSizeData {
            constant_sample_size,
            sample_count,
            sample_sizes,
        })
    }

    /// Size of sample `n` (1-based).
    ///
    /// In constant mode this is the constant regardless of `n`; otherwise the
    /// caller must keep `1 <= n <= sample_count`, or this panics.
    pub fn sample_size(&self, n: usize) -> u32 {
        if self.constant_sample_size != 0 {
            return self.constant_sample_size;
        }
        self.sample_sizes[n - 1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleToChunkEntry {
    /// 1-based number of the first chunk this run applies to.
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
}

/// Sample-to-chunk run table (`stsc`).
///
/// Each entry covers the chunks from its `first_chunk` up to (but not
/// including) the next entry's, or to infinity for the last entry; every
/// chunk in that span holds `samples_per_chunk` samples. The two translation
/// operations below run in O(entries), never O(samples).
///
/// Both operations take and return 1-based numbers and require a non-empty,
/// internally consistent table with strictly increasing `first_chunk`;
/// anything else is a precondition violation with unspecified results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleToChunkData {
    pub entry_count: u32,
    pub entries: Vec<SampleToChunkEntry>,
}

impl SampleToChunkData {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        require(buf, 8)?;
        let entry_count = BigEndian::read_u32(&buf[4..]);
        require(buf, 8 + entry_count as u64 * 12)?;
        let entries = (0..entry_count as usize)
            .map(|i| SampleToChunkEntry {
                first_chunk: BigEndian::read_u32(&buf[8 + i * 12..]),
                samples_per_chunk: BigEndian::read_u32(&buf[8 + i * 12 + 4..]),
            })
            .collect();
        Ok(SampleToChunkData {
            entry_count,
            entries,
        })
    }

    /// Sample number of the first sample in chunk `chunk`.
    pub fn chunk_first_sample(&self, chunk: u64) -> u64 {
        if self.entries.len() == 1 {
            return (chunk - 1) * self.entries[0].samples_per_chunk as u64 + 1;
        }
        let mut sample_offset = 0u64;
        for i in 1..self.entries.len() {
            let e = &self.entries[i];
            let prev = &self.entries[i - 1];
            if e.first_chunk as u64 >= chunk {
                return sample_offset
                    + (chunk - prev.first_chunk as u64) * prev.samples_per_chunk as u64
                    + 1;
            }
            sample_offset +=
                (e.first_chunk - prev.first_chunk) as u64 * prev.samples_per_chunk as u64;
        }
        let last = &self.entries[self.entries.len() - 1];
        sample_offset + (chunk - last.first_chunk as u64) * last.samples_per_chunk as u64 + 1
    }

    /// Chunk number holding sample `sample`.
    pub fn sample_chunk(&self, sample: u64) -> u64 {
        if self.entries.len() == 1 {
            return 1 + (sample - 1) / self.entries[0].samples_per_chunk as u64;
        }
        let mut sample_offset = 0u64;
        for i in 1..self.entries.len() {
            let e = &self.entries[i];
            let prev = &self.entries[i - 1];
            let next_offset = sample_offset
                + (e.first_chunk - prev.first_chunk) as u64 * prev.samples_per_chunk as u64;
            if next_offset >= sample {
                return prev.first_chunk as u64
                    + (sample - sample_offset - 1) / prev.samples_per_chunk as u64;
            }
            sample_offset = next_offset;
        }
        let last = &self.entries[self.entries.len() - 1];
        last.first_chunk as u64 + (sample - sample_offset - 1) / last.samples_per_chunk as u64
    }
}
