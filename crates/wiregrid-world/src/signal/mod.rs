//! Wire signal propagation.
//!
//! [`SignalTracker`] flood-fills channel masks through the wire layer and
//! [`SignalDispatcher`] hands the resulting visits to the tiles they reach.

mod dispatch;
mod tracker;

pub use dispatch::SignalDispatcher;
pub use tracker::SignalTracker;

use wiregrid_core::{JunctionOrientation, Pos, WireMask};

/// One visit produced by a track pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireSignal {
    /// Seed cell this visit descends from
    pub origin: Pos,
    /// Cell reached
    pub pos: Pos,
    /// Channels newly reaching `pos` in this pass
    pub mask: WireMask,
}

impl WireSignal {
    /// True for the seed visit itself, as opposed to a propagated one
    pub fn is_origin(&self) -> bool {
        self.pos == self.origin
    }
}

/// Read access to the layers signal propagation needs
pub trait SignalField {
    fn wire_at(&self, pos: Pos) -> WireMask;

    fn junction_at(&self, pos: Pos) -> Option<JunctionOrientation>;
}
