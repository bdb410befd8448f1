//! JSON scenario documents.
//!
//! A scenario lays down wires and tiles, then runs a list of steps against
//! the world. Channel sets are written as lists of channel indices.

use serde::{Deserialize, Serialize};

use wiregrid_core::codec::wire_grid_serde;
use wiregrid_core::{JunctionOrientation, Pos, WireGrid, WireMask};
use wiregrid_world::{GateKind, JunctionBox, Lamp, LogicGate, SignalReport, Switch, Tile, TileId};

/// Channel indices as written in a scenario
pub type Channels = Vec<u32>;

pub fn mask(channels: &[u32]) -> WireMask {
    WireMask::from_channels(channels.iter().copied())
}

/// A whole scenario document
#[derive(Debug, Default, Deserialize)]
pub struct Scenario {
    /// Pre-encoded wire layer to start from
    #[serde(default, with = "wire_grid_serde")]
    pub wire_grid: WireGrid,
    #[serde(default)]
    pub wires: Vec<WireSpec>,
    #[serde(default)]
    pub tiles: Vec<TileEntry>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Wire painted over the rectangle spanned by two corners
#[derive(Debug, Clone, Deserialize)]
pub struct WireSpec {
    pub from: Pos,
    pub to: Pos,
    pub channels: Channels,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileEntry {
    pub at: Pos,
    pub tile: TileSpec,
}

/// Built-in tile description
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TileSpec {
    Lamp {
        channels: Channels,
    },
    Switch {
        channels: Channels,
    },
    Gate {
        kind: GateKind,
        a: Channels,
        #[serde(default)]
        b: Channels,
        output: Channels,
    },
    Junction {
        orientation: JunctionOrientation,
    },
}

impl TileSpec {
    pub fn build(&self) -> Box<dyn Tile> {
        match self {
            TileSpec::Lamp { channels } => Box::new(Lamp::new(mask(channels))),
            TileSpec::Switch { channels } => Box::new(Switch::new(mask(channels))),
            TileSpec::Gate { kind, a, b, output } => {
                Box::new(LogicGate::new(*kind, mask(a), mask(b), mask(output)))
            }
            TileSpec::Junction { orientation } => Box::new(JunctionBox::new(*orientation)),
        }
    }
}

/// One scenario step
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Signal the cells from `at` to `to` (or just `at`)
    Signal {
        at: Pos,
        #[serde(default)]
        to: Option<Pos>,
        channels: Channels,
    },
    Interact {
        at: Pos,
    },
    /// Plan a route and lay wire along it
    Route {
        from: Pos,
        to: Pos,
        channels: Channels,
    },
    Paint {
        from: Pos,
        to: Pos,
        channels: Channels,
    },
    Erase {
        from: Pos,
        to: Pos,
        channels: Channels,
    },
    Place {
        at: Pos,
        tile: TileSpec,
    },
    Remove {
        at: Pos,
    },
    Undo,
    Redo,
}

/// What a step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepOutcome {
    Signal { report: SignalReport },
    Interact { report: Option<SignalReport> },
    Route { path: Option<Vec<Pos>> },
    Paint { cells: usize },
    Erase { cells: usize },
    Place { id: TileId },
    Remove { id: TileId },
    Undo { applied: bool },
    Redo { applied: bool },
}

/// Final state of one tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileState {
    pub id: TileId,
    pub kind: &'static str,
    pub origin: Pos,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lit: Option<WireMask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<bool>,
}

/// Everything printed after a run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepOutcome>,
    pub tiles: Vec<TileState>,
    pub wired_cells: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let text = r#"{
            "wires": [{ "from": { "x": 0, "y": 0 }, "to": { "x": 4, "y": 0 }, "channels": [0, 2] }],
            "tiles": [
                { "at": { "x": 4, "y": 0 }, "tile": { "type": "lamp", "channels": [0] } },
                { "at": { "x": 2, "y": 2 }, "tile": { "type": "junction", "orientation": "top_left" } },
                { "at": { "x": 6, "y": 6 }, "tile": { "type": "gate", "kind": "nand", "a": [0], "output": [1] } }
            ],
            "steps": [
                { "op": "signal", "at": { "x": 0, "y": 0 }, "channels": [0] },
                { "op": "route", "from": { "x": 0, "y": 5 }, "to": { "x": 5, "y": 5 }, "channels": [3] },
                { "op": "undo" }
            ]
        }"#;

        let scenario = Scenario::from_json(text).unwrap();
        assert!(scenario.wire_grid.is_empty());
        assert_eq!(scenario.wires.len(), 1);
        assert_eq!(mask(&scenario.wires[0].channels), WireMask::from_channels([0, 2]));
        assert!(matches!(
            scenario.tiles[1].tile,
            TileSpec::Junction {
                orientation: JunctionOrientation::TopLeft
            }
        ));
        assert!(matches!(&scenario.tiles[2].tile, TileSpec::Gate { kind: GateKind::Nand, b, .. } if b.is_empty()));
        assert!(matches!(scenario.steps[0], Step::Signal { to: None, .. }));
        assert!(matches!(scenario.steps[2], Step::Undo));
    }

    #[test]
    fn test_embedded_wire_grid() {
        let mut grid = WireGrid::new();
        grid.set(Pos::new(3, 1), 0b11);
        let bytes = grid.encode().unwrap();
        let text = format!(r#"{{ "wire_grid": {} }}"#, serde_json::to_string(&bytes).unwrap());

        let scenario = Scenario::from_json(&text).unwrap();
        assert_eq!(scenario.wire_grid.get(Pos::new(3, 1)), 0b11);
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(Scenario::from_json(r#"{ "steps": [{ "op": "explode" }] }"#).is_err());
    }

    #[test]
    fn test_build_tiles() {
        let lamp = TileSpec::Lamp { channels: vec![1] }.build();
        assert_eq!(lamp.kind(), "lamp");

        let junction = TileSpec::Junction {
            orientation: JunctionOrientation::Cross,
        }
        .build();
        assert_eq!(junction.junction(), Some(JunctionOrientation::Cross));
    }
}
