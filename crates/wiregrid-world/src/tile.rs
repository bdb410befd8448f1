//! Tile capability interface.
//!
//! Anything occupying cells of the world implements [`Tile`]. The world owns
//! the tile, records where its footprint starts, and calls back into it when
//! a wire signal reaches one of its cells.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

use wiregrid_core::{JunctionOrientation, Pos, Rect, Size, WireMask};

/// Handle for a tile placed in a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u32);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A signal delivered to a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSignal {
    /// Channels arriving at the cell
    pub mask: WireMask,
    /// Seed cell the signal was started from
    pub origin: Pos,
    /// Cell the signal reached, relative to the tile's top-left cell
    pub relative: Pos,
}

/// Request to signal every cell of `rect` on `mask`, queued by a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRequest {
    pub source: Option<TileId>,
    pub rect: Rect,
    pub mask: WireMask,
}

/// What a tile may see and do while handling a callback.
///
/// Emitted signals are queued and run by the world after the callback
/// returns, never from inside it.
pub struct TileContext<'a> {
    id: TileId,
    footprint: Rect,
    requests: &'a mut VecDeque<SignalRequest>,
}

impl<'a> TileContext<'a> {
    pub(crate) fn new(id: TileId, footprint: Rect, requests: &'a mut VecDeque<SignalRequest>) -> Self {
        Self {
            id,
            footprint,
            requests,
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    /// Cells covered by the tile; the origin is its top-left cell
    pub fn footprint(&self) -> Rect {
        self.footprint
    }

    pub fn origin(&self) -> Pos {
        self.footprint.origin
    }

    /// Queue a signal on `mask` seeded from every cell of `rect`
    pub fn emit(&mut self, rect: Rect, mask: WireMask) {
        if mask.is_empty() || rect.is_empty() {
            return;
        }
        self.requests.push_back(SignalRequest {
            source: Some(self.id),
            rect,
            mask,
        });
    }

    /// Queue a signal on `mask` seeded from the tile's own cells
    pub fn emit_from_footprint(&mut self, mask: WireMask) {
        self.emit(self.footprint, mask);
    }
}

/// Capability interface for grid occupants.
///
/// A handler must not assume it is safe to signal the same channel again
/// without cycle protection of its own: stateful tiles ignore signals that
/// originate inside their own footprint.
pub trait Tile: Any + fmt::Debug + Send {
    /// Short type name for logs and reports
    fn kind(&self) -> &'static str;

    /// Footprint size; constant for the lifetime of the tile
    fn size(&self) -> Size {
        Size::ONE
    }

    /// Orientation if this tile redirects wires like a junction box
    fn junction(&self) -> Option<JunctionOrientation> {
        None
    }

    /// Called once the footprint has been claimed
    fn on_created(&mut self, _ctx: &mut TileContext<'_>) {}

    /// Called after the footprint has been released
    fn on_destroyed(&mut self) {}

    /// Called for every propagated signal reaching one of the tile's cells
    fn on_wire_signal(&mut self, ctx: &mut TileContext<'_>, signal: &TileSignal);

    /// Called when the tile is used directly (clicked, pressed)
    fn on_interact(&mut self, _ctx: &mut TileContext<'_>) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A placed tile and where its footprint starts
#[derive(Debug)]
pub(crate) struct TileSlot {
    pub origin: Pos,
    pub size: Size,
    pub tile: Box<dyn Tile>,
}

impl TileSlot {
    pub fn footprint(&self) -> Rect {
        Rect::new(self.origin, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_queues_requests() {
        let mut queue = VecDeque::new();
        let footprint = Rect::new(Pos::new(4, 4), Size::new(2, 1));
        let mut ctx = TileContext::new(TileId(7), footprint, &mut queue);

        ctx.emit_from_footprint(WireMask::channel(2));
        ctx.emit(Rect::cell(Pos::new(0, 0)), WireMask::NONE);
        assert_eq!(ctx.origin(), Pos::new(4, 4));

        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue[0],
            SignalRequest {
                source: Some(TileId(7)),
                rect: footprint,
                mask: WireMask::channel(2),
            }
        );
    }

    #[test]
    fn test_tile_id_display() {
        assert_eq!(TileId(12).to_string(), "#12");
    }
}
