use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tracing::{debug, trace, warn};
use wiregrid_core::{ChunkedGrid, Direction, JunctionOrientation, Pos, Rect, WireGrid, WireMask};
use wiregrid_path::GridPathfinder;

use crate::config::EngineConfig;
use crate::error::WorldError;
use crate::signal::{SignalDispatcher, SignalField, SignalTracker, WireSignal};
use crate::tile::{SignalRequest, Tile, TileContext, TileId, TileSlot};

/// Chunk edge length of the occupancy layer
pub const OCCUPANCY_CHUNK_SIZE: usize = 8;

/// Which tile, if any, covers each cell
pub(crate) type OccupancyGrid = ChunkedGrid<Option<TileId>, OCCUPANCY_CHUNK_SIZE>;

/// Totals for one top-level signal operation, cascades included
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalReport {
    /// Visits produced by every track pass
    pub visits: usize,
    /// Tile callbacks made
    pub dispatched: usize,
    /// Follow-up requests emitted by tiles and run
    pub cascades: usize,
    /// Follow-up requests dropped at the cascade limit
    pub dropped: usize,
}

/// Wires, tiles and the signal machinery tying them together.
///
/// A world is a plain value: pass it to whatever needs it. All operations
/// are synchronous and run to completion before returning.
#[derive(Debug, Default)]
pub struct World {
    config: EngineConfig,
    wires: WireGrid,
    occupancy: OccupancyGrid,
    tiles: HashMap<TileId, TileSlot>,
    next_id: u32,
    tracker: SignalTracker,
    pending: VecDeque<SignalRequest>,
}

/// Read-only view of the layers, borrowed apart from the tracker
struct WorldField<'a> {
    wires: &'a WireGrid,
    occupancy: &'a OccupancyGrid,
    tiles: &'a HashMap<TileId, TileSlot>,
}

impl<'a> WorldField<'a> {
    fn new(wires: &'a WireGrid, occupancy: &'a OccupancyGrid, tiles: &'a HashMap<TileId, TileSlot>) -> Self {
        Self {
            wires,
            occupancy,
            tiles,
        }
    }
}

impl SignalField for WorldField<'_> {
    fn wire_at(&self, pos: Pos) -> WireMask {
        WireMask(self.wires.get(pos))
    }

    fn junction_at(&self, pos: Pos) -> Option<JunctionOrientation> {
        let id = self.occupancy.get(pos)?;
        self.tiles.get(&id)?.tile.junction()
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// The raw wire layer
    pub fn wires(&self) -> &WireGrid {
        &self.wires
    }

    // === Signals ===

    /// Signal every cell of `rect` on `mask`, deliver the result to tiles and
    /// run whatever the tiles emit in response.
    pub fn signal(&mut self, rect: Rect, mask: WireMask) -> SignalReport {
        let mut report = SignalReport::default();
        self.run_pass(rect, mask, &mut report);
        self.drain(&mut report);
        report
    }

    /// Flood-fill from `cells` without notifying any tile
    pub fn track_only(&mut self, cells: impl IntoIterator<Item = Pos>, mask: WireMask) -> Vec<WireSignal> {
        let field = WorldField::new(&self.wires, &self.occupancy, &self.tiles);
        self.tracker.track(&field, cells, mask)
    }

    fn run_pass(&mut self, rect: Rect, mask: WireMask, report: &mut SignalReport) {
        let field = WorldField::new(&self.wires, &self.occupancy, &self.tiles);
        let visits = self.tracker.track(&field, rect, mask);

        let delivered = SignalDispatcher::new(&self.occupancy, &mut self.tiles).dispatch(&visits, &mut self.pending);
        report.visits += visits.len();
        report.dispatched += delivered;
    }

    /// Run queued tile requests in FIFO order until the queue is empty or the
    /// cascade limit is hit.
    fn drain(&mut self, report: &mut SignalReport) {
        while let Some(request) = self.pending.pop_front() {
            if report.cascades >= self.config.max_cascade {
                let dropped = self.pending.len() + 1;
                self.pending.clear();
                report.dropped += dropped;
                warn!(
                    limit = self.config.max_cascade,
                    dropped, "signal cascade limit reached, dropping remaining requests"
                );
                break;
            }
            report.cascades += 1;
            trace!(source = ?request.source, rect = %request.rect, mask = %request.mask, "cascade");
            self.run_pass(request.rect, request.mask, report);
        }
    }

    // === Routing ===

    /// Search a path from `start` to `goal` with a caller-supplied passability
    /// predicate. The search is confined to the box spanning both endpoints
    /// grown by `route_margin`. The path runs from `start` to `goal` and may
    /// pass a junction cell twice.
    pub fn find_path<F>(&self, start: Pos, goal: Pos, budget: Duration, is_passable: F) -> Option<Vec<Pos>>
    where
        F: FnMut(Option<Direction>, Pos, Direction) -> bool,
    {
        if !start.is_non_negative() || !goal.is_non_negative() {
            return None;
        }
        let bounds = Rect::from_corners(start, goal)
            .expand(self.config.route_margin)
            .clip_non_negative();

        let mut path = GridPathfinder::new()
            .with_bounds(bounds)
            .find(start, goal, budget, is_passable)?;
        path.reverse();
        Some(path)
    }

    /// Plan a wire route from `start` to `goal`.
    ///
    /// Empty cells are open. Junction boxes may only be crossed the way they
    /// redirect wires, and any other tile is a dead end: it can end a route
    /// or start one, never sit in the middle.
    pub fn route(&self, start: Pos, goal: Pos) -> Option<Vec<Pos>> {
        let path = self.find_path(start, goal, self.config.path_budget(), |enter, cell, exit| {
            self.can_route(enter, cell, exit)
        });
        if path.is_none() {
            warn!(%start, %goal, budget_ms = self.config.path_budget_ms, "no wire route found");
        }
        path
    }

    fn can_route(&self, enter: Option<Direction>, cell: Pos, exit: Direction) -> bool {
        let Some(id) = self.occupancy.get(cell) else {
            return true;
        };
        match self.tiles.get(&id).and_then(|slot| slot.tile.junction()) {
            Some(orientation) => enter.map_or(true, |side| orientation.passes(side, exit)),
            None => enter.is_none(),
        }
    }

    // === Wires ===

    pub fn wire_at(&self, pos: Pos) -> WireMask {
        WireMask(self.wires.get(pos))
    }

    /// Replace the channels at `pos`, returning the previous mask.
    /// Negative cells hold nothing and ignore writes.
    pub fn set_wire(&mut self, pos: Pos, mask: WireMask) -> WireMask {
        let previous = self.wire_at(pos);
        self.wires.set(pos, mask.bits());
        previous
    }

    /// Add channels at `pos`, returning the previous mask
    pub fn paint_wire(&mut self, pos: Pos, mask: WireMask) -> WireMask {
        let previous = self.wire_at(pos);
        self.wires.set(pos, (previous | mask).bits());
        previous
    }

    /// Remove channels at `pos`, returning the previous mask
    pub fn erase_wire(&mut self, pos: Pos, mask: WireMask) -> WireMask {
        let previous = self.wire_at(pos);
        if previous.intersects(mask) {
            self.wires.set(pos, previous.without(mask).bits());
        }
        previous
    }

    /// Cells inside `rect` carrying any wire
    pub fn wired_cells(&self, rect: Rect) -> Vec<(Pos, WireMask)> {
        self.wires
            .cells_in_rect(rect)
            .into_iter()
            .filter(|(_, bits)| **bits != 0)
            .map(|(pos, bits)| (pos, WireMask(*bits)))
            .collect()
    }

    // === Tiles ===

    /// Place `tile` with its top-left cell at `origin`.
    ///
    /// The whole footprint must be free and non-negative; nothing changes on
    /// error. Signals the tile emits from `on_created` run before returning.
    pub fn place_tile(&mut self, origin: Pos, mut tile: Box<dyn Tile>) -> Result<TileId, WorldError> {
        let size = tile.size();
        let footprint = Rect::new(origin, size);
        if footprint.is_empty() {
            return Err(WorldError::EmptyFootprint);
        }
        if !origin.is_non_negative() {
            return Err(WorldError::OutOfBounds { pos: origin });
        }
        for pos in footprint {
            if let Some(by) = self.occupancy.get(pos) {
                return Err(WorldError::Occupied { pos, by });
            }
        }

        self.next_id += 1;
        let id = TileId(self.next_id);
        for pos in footprint {
            self.occupancy.set(pos, Some(id));
        }

        let mut ctx = TileContext::new(id, footprint, &mut self.pending);
        tile.on_created(&mut ctx);
        debug!(tile = %id, kind = tile.kind(), %footprint, "placed tile");
        self.tiles.insert(id, TileSlot { origin, size, tile });

        let mut report = SignalReport::default();
        self.drain(&mut report);
        Ok(id)
    }

    /// Remove a tile and free its whole footprint
    pub fn remove_tile(&mut self, id: TileId) -> Result<Box<dyn Tile>, WorldError> {
        let slot = self.tiles.remove(&id).ok_or(WorldError::UnknownTile(id))?;
        for pos in slot.footprint() {
            if self.occupancy.get(pos) == Some(id) {
                self.occupancy.set(pos, None);
            }
        }

        let mut tile = slot.tile;
        tile.on_destroyed();
        debug!(tile = %id, kind = tile.kind(), "removed tile");
        Ok(tile)
    }

    pub fn tile_at(&self, pos: Pos) -> Option<TileId> {
        self.occupancy.get(pos)
    }

    pub fn tile(&self, id: TileId) -> Option<&dyn Tile> {
        self.tiles.get(&id).map(|slot| slot.tile.as_ref())
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut dyn Tile> {
        self.tiles.get_mut(&id).map(|slot| slot.tile.as_mut())
    }

    /// Borrow a tile as its concrete type
    pub fn tile_as<T: Tile>(&self, id: TileId) -> Option<&T> {
        self.tile(id)?.as_any().downcast_ref::<T>()
    }

    pub fn tile_origin(&self, id: TileId) -> Option<Pos> {
        self.tiles.get(&id).map(|slot| slot.origin)
    }

    pub fn footprint(&self, id: TileId) -> Option<Rect> {
        self.tiles.get(&id).map(TileSlot::footprint)
    }

    /// Ids of all placed tiles, oldest first
    pub fn tiles(&self) -> Vec<TileId> {
        let mut ids: Vec<TileId> = self.tiles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Use the tile covering `pos` and run the signals it emits.
    /// `None` if the cell is empty.
    pub fn interact(&mut self, pos: Pos) -> Option<SignalReport> {
        let id = self.occupancy.get(pos)?;
        let slot = self.tiles.get_mut(&id)?;

        let mut ctx = TileContext::new(id, slot.footprint(), &mut self.pending);
        slot.tile.on_interact(&mut ctx);
        debug!(tile = %id, kind = slot.tile.kind(), %pos, "interact");

        let mut report = SignalReport::default();
        self.drain(&mut report);
        Some(report)
    }

    // === Persistence ===

    /// Encode the wire layer
    pub fn save_wires(&self) -> Result<Vec<u8>, WorldError> {
        Ok(self.wires.encode()?)
    }

    /// Replace the wire layer with a decoded one. On error the current layer
    /// is kept.
    pub fn load_wires(&mut self, bytes: &[u8]) -> Result<(), WorldError> {
        self.wires = WireGrid::decode(bytes)?;
        Ok(())
    }

    /// Replace the wire layer wholesale
    pub fn replace_wires(&mut self, wires: WireGrid) -> WireGrid {
        std::mem::replace(&mut self.wires, wires)
    }
}

impl SignalField for World {
    fn wire_at(&self, pos: Pos) -> WireMask {
        World::wire_at(self, pos)
    }

    fn junction_at(&self, pos: Pos) -> Option<JunctionOrientation> {
        WorldField::new(&self.wires, &self.occupancy, &self.tiles).junction_at(pos)
    }
}
