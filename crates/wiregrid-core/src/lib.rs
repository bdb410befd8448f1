pub mod chunk;
pub mod codec;
pub mod error;
pub mod geom;
pub mod wire;

pub use chunk::{ChunkedGrid, DEFAULT_CHUNK_SIZE};
pub use error::CodecError;
pub use geom::{Direction, Pos, Rect, RectIter, Size};
pub use wire::{JunctionOrientation, WireMask, CHANNEL_COUNT};

/// Chunk edge length of the wire-mask layer.
pub const WIRE_CHUNK_SIZE: usize = 16;

/// Per-cell channel masks, stored as raw bits so the layer can be encoded.
pub type WireGrid = ChunkedGrid<u32, WIRE_CHUNK_SIZE>;
