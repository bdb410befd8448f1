use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Grid cell position. `y` grows downward, so `Up` is `y - 1`.
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const ORIGIN: Pos = Pos::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    /// The neighboring cell one step toward `dir`.
    ///
    /// Panics on overflow in debug builds; use [`Pos::checked_step`] near the
    /// edges of the coordinate range.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Pos::new(self.x + dx, self.y + dy)
    }

    /// The neighboring cell toward `dir`, or `None` past the `i32` range
    pub fn checked_step(self, dir: Direction) -> Option<Self> {
        let (dx, dy) = dir.delta();
        Some(Pos::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// The axis-aligned neighbors that exist, tagged with the direction taken
    pub fn neighbors(self) -> impl Iterator<Item = (Direction, Pos)> {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| Some((dir, self.checked_step(dir)?)))
    }

    /// Check whether both coordinates are non-negative
    pub fn is_non_negative(&self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    pub fn euclidean_distance(&self, other: Pos) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn manhattan_distance(&self, other: Pos) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }
}

impl Add for Pos {
    type Output = Pos;

    fn add(self, rhs: Pos) -> Pos {
        Pos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Pos {
    type Output = Pos;

    fn sub(self, rhs: Pos) -> Pos {
        Pos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Pos {
    fn from((x, y): (i32, i32)) -> Self {
        Pos::new(x, y)
    }
}

/// One of the four axis-aligned directions (also used to name cell sides)
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Unit offset `(dx, dy)` for one step in this direction
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub const fn clockwise(self) -> Self {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    pub const fn counter_clockwise(self) -> Self {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
        }
    }

    /// Dense index (0..4), handy for per-direction tables
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        };
        f.write_str(name)
    }
}

/// Width and height of a tile footprint or rectangle, in cells
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ONE: Size = Size::new(1, 1);

    pub const fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Default for Size {
    fn default() -> Self {
        Size::ONE
    }
}

/// An axis-aligned block of cells anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Pos,
    pub size: Size,
}

impl Rect {
    pub const fn new(origin: Pos, size: Size) -> Self {
        Rect { origin, size }
    }

    /// A 1x1 rectangle covering `pos`
    pub const fn cell(pos: Pos) -> Self {
        Rect::new(pos, Size::ONE)
    }

    /// Build from two inclusive corners in any order.
    /// A span wider than `u32::MAX` cells is cut short by one.
    pub fn from_corners(a: Pos, b: Pos) -> Self {
        let origin = Pos::new(a.x.min(b.x), a.y.min(b.y));
        Rect {
            origin,
            size: Size::new(
                a.x.abs_diff(b.x).saturating_add(1),
                a.y.abs_diff(b.y).saturating_add(1),
            ),
        }
    }

    /// Inclusive bottom-right corner, clamped to the `i32` range
    pub fn max(&self) -> Pos {
        Pos::new(
            far_edge(self.origin.x, self.size.width),
            far_edge(self.origin.y, self.size.height),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.size.width == 0 || self.size.height == 0
    }

    pub fn contains(&self, pos: Pos) -> bool {
        !self.is_empty()
            && pos.x >= self.origin.x
            && pos.y >= self.origin.y
            && pos.x <= self.max().x
            && pos.y <= self.max().y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let (a, b) = (self.max(), other.max());
        !(a.x < other.origin.x || self.origin.x > b.x || a.y < other.origin.y || self.origin.y > b.y)
    }

    /// Grow by `margin` cells on every side
    pub fn expand(&self, margin: u32) -> Rect {
        let m = i32::try_from(margin).unwrap_or(i32::MAX);
        let grow = margin.saturating_mul(2);
        Rect::new(
            Pos::new(self.origin.x.saturating_sub(m), self.origin.y.saturating_sub(m)),
            Size::new(self.size.width.saturating_add(grow), self.size.height.saturating_add(grow)),
        )
    }

    /// Drop the part of the rectangle lying at negative coordinates
    pub fn clip_non_negative(&self) -> Rect {
        if self.is_empty() {
            return *self;
        }
        let max = self.max();
        if max.x < 0 || max.y < 0 {
            return Rect::new(Pos::ORIGIN, Size::new(0, 0));
        }
        Rect::from_corners(Pos::new(self.origin.x.max(0), self.origin.y.max(0)), max)
    }

    pub fn cell_count(&self) -> u64 {
        self.size.area()
    }

    /// Iterate over all cells in the rectangle (row by row)
    pub fn iter(&self) -> RectIter {
        RectIter {
            rect: *self,
            cursor: self.origin,
            remaining: self.cell_count(),
        }
    }
}

fn far_edge(start: i32, len: u32) -> i32 {
    let edge = i64::from(start) + i64::from(len) - 1;
    edge.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.origin, self.max())
    }
}

impl IntoIterator for Rect {
    type Item = Pos;
    type IntoIter = RectIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over positions in a rectangle
pub struct RectIter {
    rect: Rect,
    cursor: Pos,
    remaining: u64,
}

impl Iterator for RectIter {
    type Item = Pos;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let pos = self.cursor;
        if self.cursor.x >= self.rect.max().x {
            self.cursor.x = self.rect.origin.x;
            self.cursor.y = self.cursor.y.saturating_add(1);
        } else {
            self.cursor.x += 1;
        }

        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.remaining as usize;
        (count, Some(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_follows_screen_axes() {
        let p = Pos::new(3, 3);
        assert_eq!(p.step(Direction::Up), Pos::new(3, 2));
        assert_eq!(p.step(Direction::Right), Pos::new(4, 3));
        assert_eq!(p.step(Direction::Down), Pos::new(3, 4));
        assert_eq!(p.step(Direction::Left), Pos::new(2, 3));
    }

    #[test]
    fn test_checked_step_at_range_edges() {
        let corner = Pos::new(i32::MAX, i32::MIN);
        assert_eq!(corner.checked_step(Direction::Right), None);
        assert_eq!(corner.checked_step(Direction::Up), None);
        assert_eq!(corner.checked_step(Direction::Left), Some(Pos::new(i32::MAX - 1, i32::MIN)));

        let dirs: Vec<_> = corner.neighbors().map(|(dir, _)| dir).collect();
        assert_eq!(dirs, vec![Direction::Down, Direction::Left]);
        assert_eq!(Pos::new(3, 3).neighbors().count(), 4);
    }

    #[test]
    fn test_extreme_rects_do_not_overflow() {
        let edge = Pos::new(i32::MAX, 0);
        let rect = Rect::from_corners(Pos::new(i32::MAX - 2, 0), edge);
        assert_eq!(rect.max(), edge);
        assert_eq!(rect.iter().count(), 3);
        assert!(rect.contains(edge));

        let huge = Rect::from_corners(Pos::new(i32::MIN, 0), Pos::new(i32::MAX, 0));
        assert_eq!(huge.size.width, u32::MAX);
        assert_eq!(huge.max().x, i32::MAX - 1);

        let grown = Rect::cell(edge).expand(u32::MAX);
        assert_eq!(grown.origin.x, 0);
        assert_eq!(grown.max().x, i32::MAX);
        assert_eq!(grown.size.width, u32::MAX);

        assert_eq!(Pos::new(i32::MIN, 0).manhattan_distance(Pos::new(i32::MAX, i32::MAX)), u32::MAX);
    }

    #[test]
    fn test_direction_rotations() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.clockwise().counter_clockwise(), dir);
            assert_eq!(dir.clockwise().clockwise(), dir.opposite());
        }
    }

    #[test]
    fn test_rect_from_corners_normalizes() {
        let rect = Rect::from_corners(Pos::new(4, 1), Pos::new(1, 3));
        assert_eq!(rect.origin, Pos::new(1, 1));
        assert_eq!(rect.size, Size::new(4, 3));
        assert_eq!(rect.max(), Pos::new(4, 3));
        assert!(rect.contains(Pos::new(2, 2)));
        assert!(!rect.contains(Pos::new(5, 2)));
    }

    #[test]
    fn test_rect_iteration() {
        let rect = Rect::from_corners(Pos::new(0, 0), Pos::new(1, 1));
        let cells: Vec<_> = rect.iter().collect();

        assert_eq!(
            cells,
            vec![Pos::new(0, 0), Pos::new(1, 0), Pos::new(0, 1), Pos::new(1, 1)]
        );
        assert_eq!(Rect::new(Pos::ORIGIN, Size::new(0, 5)).iter().count(), 0);
    }

    #[test]
    fn test_clip_non_negative() {
        let rect = Rect::from_corners(Pos::new(-3, -1), Pos::new(2, 4));
        assert_eq!(rect.clip_non_negative(), Rect::from_corners(Pos::new(0, 0), Pos::new(2, 4)));

        let gone = Rect::from_corners(Pos::new(-3, -3), Pos::new(-1, 5));
        assert!(gone.clip_non_negative().is_empty());
    }

    #[test]
    fn test_distances() {
        let a = Pos::new(0, 0);
        let b = Pos::new(3, 4);
        assert_eq!(a.manhattan_distance(b), 7);
        assert!((a.euclidean_distance(b) - 5.0).abs() < f64::EPSILON);
    }
}
