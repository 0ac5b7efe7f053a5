pub mod atoms;
pub mod payloads;
pub mod reader;
pub mod registry;
pub mod source;

pub use atoms::{Atom, FourCC, MDAT, MOOV};
pub use reader::{AtomReader, ParseError};
pub use registry::{AtomDecoder, PayloadData, Registry, default_registry};
pub use source::{ReadAt, Section};
