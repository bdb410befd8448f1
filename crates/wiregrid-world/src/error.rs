use thiserror::Error;
use wiregrid_core::{CodecError, Pos};

use crate::tile::TileId;

/// Errors from world edits
#[derive(Error, Debug)]
pub enum WorldError {
    #[error("cell {pos} is outside the grid")]
    OutOfBounds { pos: Pos },

    #[error("cell {pos} is already occupied by tile {by}")]
    Occupied { pos: Pos, by: TileId },

    #[error("tile footprint is empty")]
    EmptyFootprint,

    #[error("unknown tile {0}")]
    UnknownTile(TileId),

    #[error("wire data error: {0}")]
    Codec(#[from] CodecError),
}
