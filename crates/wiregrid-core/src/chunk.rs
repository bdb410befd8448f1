//! Chunked sparse storage for grid layers.
//!
//! The grid is split into `N`x`N` chunks that are only allocated once a cell
//! inside them is written. Unallocated chunks, and every negative coordinate,
//! read as `T::default()`. Chunks are kept in a hash map keyed by chunk
//! coordinate, so growing toward far-away cells never copies existing chunks.
//!
//! Both the wire-mask layer (`ChunkedGrid<u32, 16>`) and the tile occupancy
//! layer of a world are built on this type.

use std::collections::HashMap;

use crate::geom::{Pos, Rect, Size};

/// Chunk edge length used when none is given.
pub const DEFAULT_CHUNK_SIZE: usize = 16;

/// Coordinate of a chunk in the grid (cell coordinate divided by chunk size).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ChunkCoord {
    pub y: u32,
    pub x: u32,
}

impl ChunkCoord {
    /// Chunk holding the cell at `pos`, or `None` for negative coordinates.
    fn from_pos(pos: Pos, size: usize) -> Option<Self> {
        if !pos.is_non_negative() {
            return None;
        }
        Some(Self {
            x: pos.x as u32 / size as u32,
            y: pos.y as u32 / size as u32,
        })
    }

    fn origin(&self, size: usize) -> Pos {
        Pos::new((self.x as usize * size) as i32, (self.y as usize * size) as i32)
    }
}

/// A single fully populated `N`x`N` block of cells, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Chunk<T, const N: usize> {
    cells: Box<[T]>,
}

impl<T: Clone + Default, const N: usize> Chunk<T, N> {
    /// Create a chunk pre-filled with `T::default()`.
    pub fn new() -> Self {
        Self {
            cells: vec![T::default(); N * N].into_boxed_slice(),
        }
    }

    /// Rebuild a chunk from exactly `N * N` row-major cells.
    pub fn from_cells(cells: Vec<T>) -> Option<Self> {
        if cells.len() != N * N {
            return None;
        }
        Some(Self {
            cells: cells.into_boxed_slice(),
        })
    }

    pub fn get(&self, local_x: usize, local_y: usize) -> &T {
        &self.cells[local_y * N + local_x]
    }

    pub fn get_mut(&mut self, local_x: usize, local_y: usize) -> &mut T {
        &mut self.cells[local_y * N + local_x]
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }
}

/// Sparse 2D container backed by lazily allocated chunks.
#[derive(Clone, Debug)]
pub struct ChunkedGrid<T, const N: usize = DEFAULT_CHUNK_SIZE> {
    chunks: HashMap<ChunkCoord, Chunk<T, N>>,
    /// Covered area in chunks; only grows until `clear`.
    extent: (u32, u32),
}

impl<T: Clone + Default, const N: usize> ChunkedGrid<T, N> {
    /// Create a new empty grid.
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
            extent: (0, 0),
        }
    }

    /// Edge length of one chunk, in cells.
    pub const fn chunk_size(&self) -> usize {
        N
    }

    /// Read the value at `pos`.
    ///
    /// Negative coordinates and cells in unallocated chunks read as the
    /// default value. Never allocates.
    pub fn get(&self, pos: Pos) -> T {
        let Some(coord) = ChunkCoord::from_pos(pos, N) else {
            return T::default();
        };
        let (local_x, local_y) = to_local_coords(pos, N);
        self.chunks
            .get(&coord)
            .map(|chunk| chunk.get(local_x, local_y).clone())
            .unwrap_or_default()
    }

    /// Write `value` at `pos`, allocating the covering chunk if needed.
    ///
    /// Writes at negative coordinates are ignored.
    pub fn set(&mut self, pos: Pos, value: T) {
        if let Some(cell) = self.cell_mut(pos) {
            *cell = value;
        }
    }

    /// Modify the value at `pos` in place, allocating the covering chunk if needed.
    ///
    /// Returns the updated value, or `None` for negative coordinates.
    pub fn update(&mut self, pos: Pos, f: impl FnOnce(&mut T)) -> Option<T> {
        let cell = self.cell_mut(pos)?;
        f(&mut *cell);
        Some(cell.clone())
    }

    fn cell_mut(&mut self, pos: Pos) -> Option<&mut T> {
        let coord = ChunkCoord::from_pos(pos, N)?;
        let (local_x, local_y) = to_local_coords(pos, N);
        self.extent.0 = self.extent.0.max(coord.x + 1);
        self.extent.1 = self.extent.1.max(coord.y + 1);
        let chunk = self.chunks.entry(coord).or_insert_with(Chunk::new);
        Some(chunk.get_mut(local_x, local_y))
    }

    /// Discard every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.extent = (0, 0);
    }

    /// Check if no chunk has been allocated.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of allocated chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Area from the origin to the far edge of the furthest allocated chunk.
    pub fn extent(&self) -> Size {
        Size::new(self.extent.0 * N as u32, self.extent.1 * N as u32)
    }

    /// Iterate over every cell of every allocated chunk.
    ///
    /// Cells holding the default value are included. Chunks are visited
    /// row-major by chunk coordinate; cells within a chunk row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &T)> + '_ {
        self.sorted_chunks().into_iter().flat_map(|(coord, chunk)| {
            let origin = coord.origin(N);
            chunk.cells().iter().enumerate().map(move |(i, value)| {
                let pos = Pos::new(origin.x + (i % N) as i32, origin.y + (i / N) as i32);
                (pos, value)
            })
        })
    }

    /// Get all allocated cells within `rect`.
    ///
    /// Only chunks overlapping the rectangle are visited.
    pub fn cells_in_rect(&self, rect: Rect) -> Vec<(Pos, &T)> {
        let rect = rect.clip_non_negative();
        if rect.is_empty() {
            return Vec::new();
        }
        let (Some(start), Some(end)) = (
            ChunkCoord::from_pos(rect.origin, N),
            ChunkCoord::from_pos(rect.max(), N),
        ) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        for y in start.y..=end.y {
            for x in start.x..=end.x {
                let coord = ChunkCoord { x, y };
                let Some(chunk) = self.chunks.get(&coord) else {
                    continue;
                };
                let origin = coord.origin(N);
                for (i, value) in chunk.cells().iter().enumerate() {
                    let pos = Pos::new(origin.x + (i % N) as i32, origin.y + (i / N) as i32);
                    if rect.contains(pos) {
                        result.push((pos, value));
                    }
                }
            }
        }

        result
    }

    pub(crate) fn sorted_chunks(&self) -> Vec<(ChunkCoord, &Chunk<T, N>)> {
        let mut chunks: Vec<_> = self.chunks.iter().map(|(coord, chunk)| (*coord, chunk)).collect();
        chunks.sort_by_key(|(coord, _)| *coord);
        chunks
    }

    pub(crate) fn insert_chunk(&mut self, coord: ChunkCoord, chunk: Chunk<T, N>) {
        self.extent.0 = self.extent.0.max(coord.x + 1);
        self.extent.1 = self.extent.1.max(coord.y + 1);
        self.chunks.insert(coord, chunk);
    }
}

impl<T: Clone + Default, const N: usize> Default for ChunkedGrid<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a non-negative global position to local coordinates within its chunk.
fn to_local_coords(pos: Pos, size: usize) -> (usize, usize) {
    (pos.x as usize % size, pos.y as usize % size)
}
