use crate::atoms::{Atom, FourCC};
use crate::payloads::{
    ChunkOffset64Data, ChunkOffsetData, HandlerReferenceData, MediaHeaderData, SampleSizeData,
    SampleToChunkData,
};
use crate::source::ReadAt;
use std::collections::HashMap;

/// A decoded payload returned from the registry.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum PayloadData {
    MediaHeader(MediaHeaderData),
    HandlerReference(HandlerReferenceData),
    ChunkOffset(ChunkOffsetData),
    ChunkOffset64(ChunkOffset64Data),
    SampleSize(SampleSizeData),
    SampleToChunk(SampleToChunkData),
}

/// Decoder for the payload of one atom type.
///
/// Decoders take the fully drained payload buffer; length validation is the
/// decoder's job, I/O is the registry's.
pub trait AtomDecoder: Send + Sync {
    fn decode(&self, buf: &[u8]) -> anyhow::Result<PayloadData>;
}

/// Registry of payload decoders keyed by atom type tag.
///
/// Constructed explicitly by the application entry point and threaded to
/// wherever decoding happens; there is no global registration. Immutable once
/// built; use [`Registry::with_decoder`] to build it fluently.
pub struct Registry {
    map: HashMap<FourCC, DecoderEntry>,
}

struct DecoderEntry {
    inner: Box<dyn AtomDecoder>,
    _name: String,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Return a new registry with the given decoder added. Registering a tag
    /// twice replaces the earlier decoder: the last registration wins.
    ///
    /// `name` is human-readable and used only for debugging / logging.
    pub fn with_decoder(mut self, tag: FourCC, name: &str, dec: Box<dyn AtomDecoder>) -> Self {
        self.map.insert(
            tag,
            DecoderEntry {
                inner: dec,
                _name: name.to_string(),
            },
        );
        self
    }

    /// Decode the payload of `atom` using the decoder registered for its
    /// type.
    ///
    /// Returns `None` when no decoder exists for the tag: unknown atom types
    /// are expected and skipped by convention, not an error. Otherwise the
    /// payload view is drained into memory (bounded by its declared length)
    /// and handed to the decoder; decoder and I/O errors are propagated
    /// verbatim.
    pub fn decode<R: ReadAt + ?Sized>(
        &self,
        atom: &Atom<'_, R>,
    ) -> Option<anyhow::Result<PayloadData>> {
        let entry = self.map.get(&atom.typ)?;
        Some(
            atom.data
                .read_to_vec()
                .map_err(anyhow::Error::from)
                .and_then(|buf| entry.inner.decode(&buf)),
        )
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------- Decoders ----------

pub struct MdhdDecoder;

impl AtomDecoder for MdhdDecoder {
    fn decode(&self, buf: &[u8]) -> anyhow::Result<PayloadData> {
        Ok(PayloadData::MediaHeader(MediaHeaderData::decode(buf)?))
    }
}

pub struct HdlrDecoder;

impl AtomDecoder for HdlrDecoder {
    fn decode(&self, buf: &[u8]) -> anyhow::Result<PayloadData> {
        Ok(PayloadData::HandlerReference(HandlerReferenceData::decode(
            buf,
        )?))
    }
}

pub struct StcoDecoder;

impl AtomDecoder for StcoDecoder {
    fn decode(&self, buf: &[u8]) -> anyhow::Result<PayloadData> {
        Ok(PayloadData::ChunkOffset(ChunkOffsetData::decode(buf)?))
    }
}

pub struct Co64Decoder;

impl AtomDecoder for Co64Decoder {
    fn decode(&self, buf: &[u8]) -> anyhow::Result<PayloadData> {
        Ok(PayloadData::ChunkOffset64(ChunkOffset64Data::decode(buf)?))
    }
}

pub struct StszDecoder;

impl AtomDecoder for StszDecoder {
    fn decode(&self, buf: &[u8]) -> anyhow::Result<PayloadData> {
        Ok(PayloadData::SampleSize(SampleSizeData::decode(buf)?))
    }
}

pub struct StscDecoder;

impl AtomDecoder for StscDecoder {
    fn decode(&self, buf: &[u8]) -> anyhow::Result<PayloadData> {
        Ok(PayloadData::SampleToChunk(SampleToChunkData::decode(buf)?))
    }
}

/// Registry with the structural decoders this crate ships.
pub fn default_registry() -> Registry {
    Registry::new()
        .with_decoder(FourCC(*b"mdhd"), "mdhd", Box::new(MdhdDecoder))
        .with_decoder(FourCC(*b"hdlr"), "hdlr", Box::new(HdlrDecoder))
        .with_decoder(FourCC(*b"stco"), "stco", Box::new(StcoDecoder))
        .with_decoder(FourCC(*b"co64"), "co64", Box::new(Co64Decoder))
        .with_decoder(FourCC(*b"stsz"), "stsz", Box::new(StszDecoder))
        .with_decoder(FourCC(*b"stsc"), "stsc", Box::new(StscDecoder))
}
