//! A* search over the implicit 4-connected cell grid.
//!
//! Moves are uniform cost ([`STEP_COST`]) and the heuristic is the Euclidean
//! distance scaled by the same factor and rounded. Search states are a cell
//! together with the side it was entered from, since junction boxes let a
//! cell be left in different ways depending on how it was reached. Each
//! state remembers its predecessor's entry side, which is enough to walk the
//! path back without a separate parent map.

use std::cmp::{Ordering, Reverse};
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use tracing::debug;
use wiregrid_core::{Direction, Pos, Rect};

/// Cost of one orthogonal step.
pub const STEP_COST: u32 = 10;

/// Heuristic estimate from `cell` to `goal`: `round(euclidean * 10)`.
/// Saturates at `u32::MAX` for goals billions of steps away.
pub fn heuristic(cell: Pos, goal: Pos) -> u32 {
    (cell.euclidean_distance(goal) * f64::from(STEP_COST)).round() as u32
}

/// A cell and the side the search came in through (`None` for the start).
type State = (Pos, Option<Direction>);

#[derive(Debug, Clone, Copy)]
struct PathNode {
    g: u32,
    h: u32,
    closed: bool,
    /// Entry side of the predecessor state.
    parent_entry: Option<Direction>,
}

impl PathNode {
    fn f(&self) -> u64 {
        u64::from(self.g) + u64::from(self.h)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct OpenEntry {
    key: Reverse<(u64, u32, u64)>,
    g: u32,
    state: State,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Route planner for wires.
#[derive(Debug, Clone, Default)]
pub struct GridPathfinder {
    bounds: Option<Rect>,
}

impl GridPathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the search to cells inside `bounds`.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    fn in_bounds(&self, pos: Pos) -> bool {
        self.bounds.map_or(true, |b| b.contains(pos))
    }

    /// Find a path from `start` to `goal`.
    ///
    /// `is_passable(enter, cell, exit)` is asked before leaving `cell`
    /// through side `exit`, where `enter` is the side the search entered
    /// `cell` from (`None` for `start`). A cell that refuses every exit can
    /// still end a path, so a blocked goal is reachable while a blocked cell
    /// on the way is not. A cell reached from one side is searched again when
    /// reached from another, so the same cell may appear twice in a path that
    /// crosses itself at a junction.
    ///
    /// The returned cells run from `goal` back to `start`. `None` means the
    /// open set ran dry or `budget` was spent; callers cannot tell which.
    pub fn find<F>(&self, start: Pos, goal: Pos, budget: Duration, mut is_passable: F) -> Option<Vec<Pos>>
    where
        F: FnMut(Option<Direction>, Pos, Direction) -> bool,
    {
        if !self.in_bounds(start) || !self.in_bounds(goal) {
            return None;
        }

        let started = Instant::now();
        let mut nodes: HashMap<State, PathNode> = HashMap::new();
        let mut open = BinaryHeap::new();
        let mut seq: u64 = 0;

        let first = PathNode {
            g: 0,
            h: heuristic(start, goal),
            closed: false,
            parent_entry: None,
        };
        nodes.insert((start, None), first);
        open.push(OpenEntry {
            key: Reverse((first.f(), first.h, seq)),
            g: 0,
            state: (start, None),
        });

        while let Some(entry) = open.pop() {
            if started.elapsed() >= budget {
                debug!(%start, %goal, expanded = nodes.len(), "path search ran out of time");
                return None;
            }

            let Some(node) = nodes.get_mut(&entry.state) else {
                continue;
            };
            // Stale heap entry: the state was closed or improved since it was pushed
            if node.closed || node.g != entry.g {
                continue;
            }
            node.closed = true;

            let (pos, entered_from) = entry.state;
            if pos == goal {
                debug!(%start, %goal, cost = entry.g, expanded = nodes.len(), "path found");
                return Some(reconstruct(&nodes, entry.state));
            }

            let g = entry.g.saturating_add(STEP_COST);
            for dir in Direction::ALL {
                let Some(next) = pos.checked_step(dir) else {
                    continue;
                };
                if !self.in_bounds(next) || !is_passable(entered_from, pos, dir) {
                    continue;
                }

                let state = (next, Some(dir.opposite()));
                let node = match nodes.entry(state) {
                    Entry::Occupied(slot) => {
                        let node = slot.into_mut();
                        if node.closed || g >= node.g {
                            continue;
                        }
                        node.g = g;
                        node.parent_entry = entered_from;
                        *node
                    }
                    Entry::Vacant(slot) => *slot.insert(PathNode {
                        g,
                        h: heuristic(next, goal),
                        closed: false,
                        parent_entry: entered_from,
                    }),
                };

                seq += 1;
                open.push(OpenEntry {
                    key: Reverse((node.f(), node.h, seq)),
                    g,
                    state,
                });
            }
        }

        debug!(%start, %goal, expanded = nodes.len(), "no path");
        None
    }
}

/// Walk entry sides back from the goal state to the start state.
fn reconstruct(nodes: &HashMap<State, PathNode>, goal: State) -> Vec<Pos> {
    let (mut pos, mut entry) = goal;
    let mut path = vec![pos];
    while let Some(side) = entry {
        let Some(node) = nodes.get(&(pos, entry)) else {
            break;
        };
        pos = pos.step(side);
        entry = node.parent_entry;
        path.push(pos);
    }
    path
}
