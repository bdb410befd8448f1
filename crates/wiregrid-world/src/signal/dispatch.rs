use std::collections::{HashMap, VecDeque};

use tracing::trace;

use super::WireSignal;
use crate::tile::{SignalRequest, TileContext, TileId, TileSignal, TileSlot};
use crate::world::OccupancyGrid;

/// Delivers track results to the tiles sitting on the visited cells.
///
/// Seed visits are not delivered: a tile never hears the signal it was
/// seeded from. Anything a tile emits while handling a signal is appended to
/// the request queue for the world to run afterwards.
pub struct SignalDispatcher<'a> {
    occupancy: &'a OccupancyGrid,
    tiles: &'a mut HashMap<TileId, TileSlot>,
}

impl<'a> SignalDispatcher<'a> {
    pub(crate) fn new(occupancy: &'a OccupancyGrid, tiles: &'a mut HashMap<TileId, TileSlot>) -> Self {
        Self { occupancy, tiles }
    }

    /// Hand every non-seed visit to its occupant. Returns how many
    /// callbacks were made.
    pub fn dispatch(&mut self, visits: &[WireSignal], requests: &mut VecDeque<SignalRequest>) -> usize {
        let mut delivered = 0;
        for visit in visits.iter().filter(|v| !v.is_origin()) {
            let Some(id) = self.occupancy.get(visit.pos) else {
                continue;
            };
            let Some(slot) = self.tiles.get_mut(&id) else {
                continue;
            };

            let signal = TileSignal {
                mask: visit.mask,
                origin: visit.origin,
                relative: visit.pos - slot.origin,
            };
            trace!(tile = %id, kind = slot.tile.kind(), pos = %visit.pos, mask = %visit.mask, "deliver");

            let mut ctx = TileContext::new(id, slot.footprint(), requests);
            slot.tile.on_wire_signal(&mut ctx, &signal);
            delivered += 1;
        }
        delivered
    }
}
