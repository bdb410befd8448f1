use std::any::Any;

use wiregrid_core::{Pos, Rect, WireMask};
use wiregrid_world::{Tile, TileId, World, WorldError};

/// Type alias for boxed commands
pub type CommandBox = Box<dyn Command>;

/// Trait for undoable world edits
pub trait Command: std::fmt::Debug + Send {
    /// Apply the edit, returning affected cells
    fn execute(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError>;

    /// Revert the edit, returning affected cells
    fn undo(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError>;

    /// Get a description of this command (for UI display)
    fn description(&self) -> &str;

    /// Fold an already executed command into this one.
    /// Returns true if merge was successful
    fn merge(&mut self, _other: &dyn Command) -> bool {
        false
    }

    /// Check if this command can be merged with another
    fn can_merge(&self, _other: &dyn Command) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// Add channels along a set of cells, typically one drag stroke or a route
#[derive(Debug)]
pub struct PaintWireCommand {
    cells: Vec<Pos>,
    mask: WireMask,
    previous: Vec<(Pos, WireMask)>,
}

impl PaintWireCommand {
    pub fn new(cells: Vec<Pos>, mask: WireMask) -> Self {
        Self {
            cells,
            mask,
            previous: Vec::new(),
        }
    }

    /// Paint every cell of the rectangle spanned by two corners
    pub fn span(from: Pos, to: Pos, mask: WireMask) -> Self {
        Self::new(Rect::from_corners(from, to).iter().collect(), mask)
    }

    pub fn mask(&self) -> WireMask {
        self.mask
    }

    pub fn cells(&self) -> &[Pos] {
        &self.cells
    }
}

impl Command for PaintWireCommand {
    fn execute(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        self.previous.clear();
        for &pos in &self.cells {
            let old = world.paint_wire(pos, self.mask);
            self.previous.push((pos, old));
        }
        Ok(self.cells.clone())
    }

    fn undo(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        // Reverse order so a cell painted twice ends on its first value
        for &(pos, old) in self.previous.iter().rev() {
            world.set_wire(pos, old);
        }
        Ok(self.cells.clone())
    }

    fn description(&self) -> &str {
        "Paint wire"
    }

    fn can_merge(&self, other: &dyn Command) -> bool {
        other
            .as_any()
            .downcast_ref::<PaintWireCommand>()
            .is_some_and(|other| other.mask == self.mask)
    }

    fn merge(&mut self, other: &dyn Command) -> bool {
        let Some(other) = other.as_any().downcast_ref::<PaintWireCommand>() else {
            return false;
        };
        if other.mask != self.mask {
            return false;
        }
        self.cells.extend_from_slice(&other.cells);
        self.previous.extend_from_slice(&other.previous);
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Remove channels from every wired cell in a rectangle
#[derive(Debug)]
pub struct EraseWireCommand {
    rect: Rect,
    mask: WireMask,
    previous: Vec<(Pos, WireMask)>,
}

impl EraseWireCommand {
    pub fn new(rect: Rect, mask: WireMask) -> Self {
        Self {
            rect,
            mask,
            previous: Vec::new(),
        }
    }
}

impl Command for EraseWireCommand {
    fn execute(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        self.previous.clear();
        for (pos, wire) in world.wired_cells(self.rect) {
            if wire.intersects(self.mask) {
                world.erase_wire(pos, self.mask);
                self.previous.push((pos, wire));
            }
        }
        Ok(self.previous.iter().map(|(pos, _)| *pos).collect())
    }

    fn undo(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        let mut affected = Vec::new();
        for &(pos, wire) in &self.previous {
            world.set_wire(pos, wire);
            affected.push(pos);
        }
        Ok(affected)
    }

    fn description(&self) -> &str {
        "Erase wire"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Place a tile; undo takes it back off the grid, state included
#[derive(Debug)]
pub struct PlaceTileCommand {
    origin: Pos,
    tile: Option<Box<dyn Tile>>,
    placed: Option<TileId>,
}

impl PlaceTileCommand {
    pub fn new(origin: Pos, tile: Box<dyn Tile>) -> Self {
        Self {
            origin,
            tile: Some(tile),
            placed: None,
        }
    }

    /// Id the tile was given by the latest execute
    pub fn placed(&self) -> Option<TileId> {
        self.placed
    }
}

impl Command for PlaceTileCommand {
    fn execute(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        let Some(tile) = self.tile.take() else {
            return Ok(Vec::new());
        };
        let id = world.place_tile(self.origin, tile)?;
        self.placed = Some(id);
        Ok(footprint_cells(world, id))
    }

    fn undo(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        let Some(id) = self.placed.take() else {
            return Ok(Vec::new());
        };
        let affected = footprint_cells(world, id);
        self.tile = Some(world.remove_tile(id)?);
        Ok(affected)
    }

    fn description(&self) -> &str {
        "Place tile"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Remove a tile; undo puts the same tile back where it was
#[derive(Debug)]
pub struct RemoveTileCommand {
    id: TileId,
    removed: Option<(Pos, Box<dyn Tile>)>,
}

impl RemoveTileCommand {
    pub fn new(id: TileId) -> Self {
        Self { id, removed: None }
    }

    /// Id of the tile this command currently targets. Changes after an undo,
    /// since the restored tile is placed anew.
    pub fn target(&self) -> TileId {
        self.id
    }
}

impl Command for RemoveTileCommand {
    fn execute(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        let origin = world.tile_origin(self.id).ok_or(WorldError::UnknownTile(self.id))?;
        let affected = footprint_cells(world, self.id);
        let tile = world.remove_tile(self.id)?;
        self.removed = Some((origin, tile));
        Ok(affected)
    }

    fn undo(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        let Some((origin, tile)) = self.removed.take() else {
            return Ok(Vec::new());
        };
        self.id = world.place_tile(origin, tile)?;
        Ok(footprint_cells(world, self.id))
    }

    fn description(&self) -> &str {
        "Remove tile"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn footprint_cells(world: &World, id: TileId) -> Vec<Pos> {
    world.footprint(id).map(|rect| rect.iter().collect()).unwrap_or_default()
}

/// Composite command for batch operations.
///
/// If a step fails, the steps already applied are undone before the error
/// is returned.
#[derive(Debug)]
pub struct CompositeCommand {
    commands: Vec<CommandBox>,
    description: String,
}

impl CompositeCommand {
    pub fn new(commands: Vec<CommandBox>, description: impl Into<String>) -> Self {
        Self {
            commands,
            description: description.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for CompositeCommand {
    fn execute(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        let mut affected = Vec::new();
        for done in 0..self.commands.len() {
            match self.commands[done].execute(world) {
                Ok(cells) => affected.extend(cells),
                Err(err) => {
                    for cmd in self.commands[..done].iter_mut().rev() {
                        cmd.undo(world)?;
                    }
                    return Err(err);
                }
            }
        }
        Ok(affected)
    }

    fn undo(&mut self, world: &mut World) -> Result<Vec<Pos>, WorldError> {
        let mut affected = Vec::new();
        // Undo in reverse order
        for cmd in self.commands.iter_mut().rev() {
            affected.extend(cmd.undo(world)?);
        }
        Ok(affected)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
