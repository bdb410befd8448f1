use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not};

use crate::geom::Direction;

/// Number of independent channels a wire can carry.
pub const CHANNEL_COUNT: u32 = 32;

/// Set of wire channels present at a cell. Bit `i` is channel `i`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireMask(pub u32);

impl WireMask {
    pub const NONE: WireMask = WireMask(0);
    pub const ALL: WireMask = WireMask(u32::MAX);

    /// Mask holding the single channel `index`; out-of-range channels give an empty mask
    pub const fn channel(index: u32) -> Self {
        if index < CHANNEL_COUNT {
            WireMask(1 << index)
        } else {
            WireMask::NONE
        }
    }

    /// Build a mask from a list of channel indices
    pub fn from_channels(channels: impl IntoIterator<Item = u32>) -> Self {
        channels
            .into_iter()
            .fold(WireMask::NONE, |mask, index| mask | WireMask::channel(index))
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn has_channel(self, index: u32) -> bool {
        index < CHANNEL_COUNT && self.0 & (1 << index) != 0
    }

    /// True if every channel of `other` is also in `self`
    pub const fn contains(self, other: WireMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: WireMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Channels in `self` that are not in `other`
    pub const fn without(self, other: WireMask) -> Self {
        WireMask(self.0 & !other.0)
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Indices of the channels present, lowest first
    pub fn channels(self) -> impl Iterator<Item = u32> {
        (0..CHANNEL_COUNT).filter(move |&i| self.has_channel(i))
    }
}

impl From<u32> for WireMask {
    fn from(bits: u32) -> Self {
        WireMask(bits)
    }
}

impl From<WireMask> for u32 {
    fn from(mask: WireMask) -> Self {
        mask.0
    }
}

impl BitAnd for WireMask {
    type Output = WireMask;

    fn bitand(self, rhs: WireMask) -> WireMask {
        WireMask(self.0 & rhs.0)
    }
}

impl BitAndAssign for WireMask {
    fn bitand_assign(&mut self, rhs: WireMask) {
        self.0 &= rhs.0;
    }
}

impl BitOr for WireMask {
    type Output = WireMask;

    fn bitor(self, rhs: WireMask) -> WireMask {
        WireMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for WireMask {
    fn bitor_assign(&mut self, rhs: WireMask) {
        self.0 |= rhs.0;
    }
}

impl BitXor for WireMask {
    type Output = WireMask;

    fn bitxor(self, rhs: WireMask) -> WireMask {
        WireMask(self.0 ^ rhs.0)
    }
}

impl Not for WireMask {
    type Output = WireMask;

    fn not(self) -> WireMask {
        WireMask(!self.0)
    }
}

impl fmt::Debug for WireMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WireMask({:#034b})", self.0)
    }
}

impl fmt::Display for WireMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels: Vec<String> = self.channels().map(|i| i.to_string()).collect();
        write!(f, "[{}]", channels.join(","))
    }
}

/// Orientation of a junction box.
///
/// A junction does not carry channels of its own; it decides where a signal
/// entering from one side leaves the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionOrientation {
    /// Straight through in every direction
    Cross,
    /// "TL" box
    TopLeft,
    /// "TR" box
    TopRight,
}

impl JunctionOrientation {
    /// Side a signal leaves through after entering from `entry`.
    ///
    /// | orientation | up    | right | down  | left  |
    /// |-------------|-------|-------|-------|-------|
    /// | Cross       | down  | left  | up    | right |
    /// | TL          | left  | up    | right | down  |
    /// | TR          | right | down  | left  | up    |
    pub const fn exit_side(self, entry: Direction) -> Direction {
        match self {
            JunctionOrientation::Cross => entry.opposite(),
            JunctionOrientation::TopLeft => entry.counter_clockwise(),
            JunctionOrientation::TopRight => entry.clockwise(),
        }
    }

    /// Whether a signal entering from `entry` may leave through `exit`
    pub fn passes(self, entry: Direction, exit: Direction) -> bool {
        self.exit_side(entry) == exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Direction::*;

    #[test]
    fn test_channel_bits() {
        let mask = WireMask::from_channels([0, 3, 31]);
        assert_eq!(mask.bits(), 0b1001 | (1 << 31));
        assert!(mask.has_channel(3));
        assert!(!mask.has_channel(2));
        assert!(!mask.has_channel(40));
        assert_eq!(mask.count(), 3);
        assert_eq!(mask.channels().collect::<Vec<_>>(), vec![0, 3, 31]);
        assert_eq!(WireMask::channel(32), WireMask::NONE);
    }

    #[test]
    fn test_mask_set_operations() {
        let a = WireMask(0b0110);
        let b = WireMask(0b0011);
        assert_eq!(a & b, WireMask(0b0010));
        assert_eq!(a | b, WireMask(0b0111));
        assert_eq!(a.without(b), WireMask(0b0100));
        assert!(a.intersects(b));
        assert!((a | b).contains(a));
        assert!(!a.contains(b));
        assert!(WireMask::NONE.is_empty());
    }

    #[test]
    fn test_display_lists_channels() {
        assert_eq!(WireMask::from_channels([1, 4]).to_string(), "[1,4]");
        assert_eq!(WireMask::NONE.to_string(), "[]");
    }

    #[test]
    fn test_cross_redirects() {
        let cross = JunctionOrientation::Cross;
        assert_eq!(cross.exit_side(Up), Down);
        assert_eq!(cross.exit_side(Right), Left);
        assert_eq!(cross.exit_side(Down), Up);
        assert_eq!(cross.exit_side(Left), Right);
    }

    #[test]
    fn test_top_left_redirects() {
        let tl = JunctionOrientation::TopLeft;
        assert_eq!(tl.exit_side(Up), Left);
        assert_eq!(tl.exit_side(Right), Up);
        assert_eq!(tl.exit_side(Down), Right);
        assert_eq!(tl.exit_side(Left), Down);
    }

    #[test]
    fn test_top_right_redirects() {
        let tr = JunctionOrientation::TopRight;
        assert_eq!(tr.exit_side(Up), Right);
        assert_eq!(tr.exit_side(Right), Down);
        assert_eq!(tr.exit_side(Down), Left);
        assert_eq!(tr.exit_side(Left), Up);
    }

    #[test]
    fn test_cross_only_passes_straight() {
        let cross = JunctionOrientation::Cross;
        assert!(cross.passes(Up, Down));
        assert!(cross.passes(Left, Right));
        assert!(!cross.passes(Up, Left));
        assert!(!cross.passes(Up, Right));
        assert!(!cross.passes(Up, Up));
    }

    #[test]
    fn test_orientation_serde_names() {
        let json = serde_json::to_string(&JunctionOrientation::TopLeft).unwrap();
        assert_eq!(json, "\"top_left\"");
    }
}
