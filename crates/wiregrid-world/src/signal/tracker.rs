use std::collections::HashMap;

use tracing::debug;
use wiregrid_core::{Direction, Pos, WireMask};

use super::{SignalField, WireSignal};

/// Flood-fills channel masks through the wire layer.
///
/// Every pass keeps a map from cell to the channels already accepted there,
/// so a cell takes each channel at most once per pass. That bounds the work
/// by cells x channels and stops cycles. The map is cleared at the start of
/// the next pass, so later passes can revisit the same cells.
#[derive(Debug, Default)]
pub struct SignalTracker {
    visited: HashMap<Pos, WireMask>,
    passes: u64,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of passes run so far; the id of the latest pass
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Channels accepted at `pos` during the latest pass
    pub fn visited_at(&self, pos: Pos) -> WireMask {
        self.visited.get(&pos).copied().unwrap_or_default()
    }

    /// Find every (cell, channels) pair reachable from `seeds` on `mask`.
    ///
    /// Seeds whose wire shares no channel with `mask` are skipped. The result
    /// holds the seed visits too; [`WireSignal::is_origin`] tells them apart.
    /// Visit order is unspecified.
    pub fn track<F>(&mut self, field: &F, seeds: impl IntoIterator<Item = Pos>, mask: WireMask) -> Vec<WireSignal>
    where
        F: SignalField + ?Sized,
    {
        self.passes += 1;
        self.visited.clear();

        let mut stack: Vec<WireSignal> = seeds
            .into_iter()
            .filter_map(|pos| {
                let mask = field.wire_at(pos) & mask;
                (!mask.is_empty()).then_some(WireSignal {
                    origin: pos,
                    pos,
                    mask,
                })
            })
            .collect();
        let seed_count = stack.len();

        let mut visits = Vec::new();
        while let Some(mut signal) = stack.pop() {
            let seen = self.visited.entry(signal.pos).or_default();
            let fresh = signal.mask.without(*seen);
            if fresh.is_empty() {
                continue;
            }
            *seen |= fresh;
            signal.mask = fresh;
            visits.push(signal);

            for (dir, next) in signal.pos.neighbors() {
                if let Some((pos, mask)) = follow(field, next, dir.opposite(), signal.mask) {
                    stack.push(WireSignal {
                        origin: signal.origin,
                        pos,
                        mask,
                    });
                }
            }
        }

        debug!(
            pass = self.passes,
            seeds = seed_count,
            visits = visits.len(),
            "track pass finished"
        );
        visits
    }
}

/// Step into `pos` through side `entry` carrying `mask`.
///
/// Junction boxes are walked through without stopping, narrowing the mask by
/// the wire at every hop, until a plain cell is reached. Returns that cell
/// and the channels that made it, or `None` if nothing arrives. A walk that
/// comes back to the same box through the same side is a closed loop of
/// boxes and yields `None`, as does one leaving the coordinate range.
fn follow<F>(field: &F, mut pos: Pos, mut entry: Direction, mask: WireMask) -> Option<(Pos, WireMask)>
where
    F: SignalField + ?Sized,
{
    let mut mask = mask & field.wire_at(pos);
    let mut hops: Vec<(Pos, Direction)> = Vec::new();

    while !mask.is_empty() {
        let Some(orientation) = field.junction_at(pos) else {
            return Some((pos, mask));
        };
        if hops.contains(&(pos, entry)) {
            return None;
        }
        hops.push((pos, entry));

        let exit = orientation.exit_side(entry);
        pos = pos.checked_step(exit)?;
        entry = exit.opposite();
        mask &= field.wire_at(pos);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use wiregrid_core::{JunctionOrientation, Rect};

    #[derive(Default)]
    struct TestField {
        wires: HashMap<Pos, WireMask>,
        junctions: HashMap<Pos, JunctionOrientation>,
    }

    impl TestField {
        fn wire(&mut self, from: Pos, to: Pos, mask: WireMask) -> &mut Self {
            for pos in Rect::from_corners(from, to) {
                *self.wires.entry(pos).or_default() |= mask;
            }
            self
        }

        fn junction(&mut self, pos: Pos, orientation: JunctionOrientation) -> &mut Self {
            self.junctions.insert(pos, orientation);
            self
        }
    }

    impl SignalField for TestField {
        fn wire_at(&self, pos: Pos) -> WireMask {
            self.wires.get(&pos).copied().unwrap_or_default()
        }

        fn junction_at(&self, pos: Pos) -> Option<JunctionOrientation> {
            self.junctions.get(&pos).copied()
        }
    }

    fn ch(index: u32) -> WireMask {
        WireMask::channel(index)
    }

    fn p(x: i32, y: i32) -> Pos {
        Pos::new(x, y)
    }

    fn cells(visits: &[WireSignal]) -> HashSet<Pos> {
        visits.iter().map(|v| v.pos).collect()
    }

    #[test]
    fn test_empty_seed_or_mask() {
        let mut field = TestField::default();
        field.wire(p(0, 0), p(3, 0), ch(0));
        let mut tracker = SignalTracker::new();

        assert!(tracker.track(&field, [], ch(0)).is_empty());
        assert!(tracker.track(&field, [p(0, 0)], WireMask::NONE).is_empty());
        assert!(tracker.track(&field, [p(0, 0)], ch(5)).is_empty());
        // Seed without wire
        assert!(tracker.track(&field, [p(9, 9)], ch(0)).is_empty());
    }

    #[test]
    fn test_straight_wire() {
        let mut field = TestField::default();
        field.wire(p(0, 0), p(4, 0), ch(0));
        let mut tracker = SignalTracker::new();

        let visits = tracker.track(&field, [p(0, 0)], WireMask::ALL);
        assert_eq!(visits.len(), 5);
        assert!(visits.iter().all(|v| v.origin == p(0, 0) && v.mask == ch(0)));
        assert_eq!(visits.iter().filter(|v| v.is_origin()).count(), 1);
    }

    #[test]
    fn test_ring_visits_each_cell_once() {
        let mut field = TestField::default();
        field
            .wire(p(0, 0), p(4, 0), ch(0))
            .wire(p(4, 0), p(4, 4), ch(0))
            .wire(p(0, 4), p(4, 4), ch(0))
            .wire(p(0, 0), p(0, 4), ch(0));
        let mut tracker = SignalTracker::new();

        let visits = tracker.track(&field, [p(2, 0)], ch(0));
        assert_eq!(visits.len(), 16);
        assert_eq!(cells(&visits).len(), 16);
    }

    #[test]
    fn test_later_pass_revisits() {
        let mut field = TestField::default();
        field.wire(p(0, 0), p(2, 0), ch(0));
        let mut tracker = SignalTracker::new();

        assert_eq!(tracker.track(&field, [p(0, 0)], ch(0)).len(), 3);
        assert_eq!(tracker.track(&field, [p(2, 0)], ch(0)).len(), 3);
        assert_eq!(tracker.passes(), 2);
    }

    #[test]
    fn test_channels_do_not_cross() {
        let mut field = TestField::default();
        // Channel 0 along the row, channel 1 down column x = 3, sharing (3, 0)
        field.wire(p(0, 0), p(6, 0), ch(0)).wire(p(3, 0), p(3, 5), ch(1));
        let mut tracker = SignalTracker::new();

        let visits = tracker.track(&field, [p(0, 0)], ch(0) | ch(1));
        assert!(visits.iter().all(|v| v.mask == ch(0)));
        assert!(visits.iter().all(|v| v.pos.y == 0));
        assert_eq!(visits.len(), 7);

        let visits = tracker.track(&field, [p(3, 5)], ch(0) | ch(1));
        assert!(visits.iter().all(|v| v.mask == ch(1)));
        assert_eq!(visits.len(), 6);
    }

    #[test]
    fn test_multiple_channels_share_one_pass() {
        let mut field = TestField::default();
        field.wire(p(0, 0), p(3, 0), ch(0) | ch(1)).wire(p(3, 0), p(6, 0), ch(1));
        let mut tracker = SignalTracker::new();

        let visits = tracker.track(&field, [p(0, 0)], WireMask::ALL);
        assert_eq!(visits.len(), 7);
        for pos in [p(0, 0), p(1, 0), p(3, 0)] {
            assert_eq!(tracker.visited_at(pos), ch(0) | ch(1));
        }
        assert_eq!(tracker.visited_at(p(5, 0)), ch(1));
    }

    #[test]
    fn test_cross_keeps_wires_apart() {
        let mut field = TestField::default();
        field
            .wire(p(0, 2), p(4, 2), ch(0))
            .wire(p(2, 0), p(2, 4), ch(0))
            .junction(p(2, 2), JunctionOrientation::Cross);
        let mut tracker = SignalTracker::new();

        let visits = tracker.track(&field, [p(0, 2)], ch(0));
        assert_eq!(cells(&visits), HashSet::from([p(0, 2), p(1, 2), p(3, 2), p(4, 2)]));

        let visits = tracker.track(&field, [p(2, 0)], ch(0));
        assert_eq!(cells(&visits), HashSet::from([p(2, 0), p(2, 1), p(2, 3), p(2, 4)]));
    }

    #[test]
    fn test_top_left_box_turns_signal() {
        let mut field = TestField::default();
        field
            .wire(p(2, 0), p(2, 2), ch(0))
            .wire(p(0, 2), p(3, 2), ch(0))
            .junction(p(2, 2), JunctionOrientation::TopLeft);
        let mut tracker = SignalTracker::new();

        // Entering from above leaves to the left; (3, 2) stays dark
        let visits = tracker.track(&field, [p(2, 0)], ch(0));
        assert_eq!(cells(&visits), HashSet::from([p(2, 0), p(2, 1), p(1, 2), p(0, 2)]));
    }

    #[test]
    fn test_consecutive_boxes_walk_in_one_step() {
        let mut field = TestField::default();
        field
            .wire(p(0, 0), p(5, 0), ch(0))
            .junction(p(2, 0), JunctionOrientation::Cross)
            .junction(p(3, 0), JunctionOrientation::Cross);
        let mut tracker = SignalTracker::new();

        let visits = tracker.track(&field, [p(0, 0)], ch(0));
        assert_eq!(cells(&visits), HashSet::from([p(0, 0), p(1, 0), p(4, 0), p(5, 0)]));
    }

    #[test]
    fn test_box_narrows_to_its_own_wire() {
        let mut field = TestField::default();
        field
            .wire(p(0, 0), p(1, 0), ch(0) | ch(1))
            .wire(p(2, 0), p(2, 0), ch(0))
            .wire(p(3, 0), p(4, 0), ch(0) | ch(1))
            .junction(p(2, 0), JunctionOrientation::Cross);
        let mut tracker = SignalTracker::new();

        let visits = tracker.track(&field, [p(0, 0)], ch(0) | ch(1));
        let far: Vec<_> = visits.iter().filter(|v| v.pos.x >= 3).collect();
        assert_eq!(far.len(), 2);
        assert!(far.iter().all(|v| v.mask == ch(0)));
    }

    #[test]
    fn test_wire_at_coordinate_limit() {
        let edge = p(i32::MAX, 0);
        let mut field = TestField::default();
        field.wire(p(i32::MAX - 2, 0), edge, ch(0));
        let mut tracker = SignalTracker::new();

        let visits = tracker.track(&field, [edge], ch(0));
        assert_eq!(visits.len(), 3);

        // A box on the last column has nowhere to send the signal
        field.wire(p(i32::MAX - 3, 0), edge, ch(0)).junction(edge, JunctionOrientation::Cross);
        let visits = tracker.track(&field, [p(i32::MAX - 3, 0)], ch(0));
        assert_eq!(cells(&visits), HashSet::from([p(i32::MAX - 3, 0), p(i32::MAX - 2, 0), p(i32::MAX - 1, 0)]));
    }

    #[test]
    fn test_closed_box_loop_terminates() {
        let mut field = TestField::default();
        field.wire(p(1, 1), p(2, 2), ch(0));
        for pos in Rect::from_corners(p(1, 1), p(2, 2)) {
            field.junction(pos, JunctionOrientation::TopLeft);
        }
        let mut tracker = SignalTracker::new();

        let visits = tracker.track(&field, [p(1, 1)], ch(0));
        assert_eq!(visits.len(), 1);
        assert!(visits[0].is_origin());
    }
}
