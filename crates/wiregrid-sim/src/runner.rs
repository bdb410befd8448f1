use std::mem;

use tracing::{debug, info};
use wiregrid_core::{Rect, WireMask};
use wiregrid_history::{EraseWireCommand, HistoryManager, PaintWireCommand, PlaceTileCommand, RemoveTileCommand};
use wiregrid_world::{EngineConfig, Lamp, LogicGate, Switch, World};

use crate::error::SimError;
use crate::scenario::{mask, Scenario, ScenarioReport, Step, StepOutcome, TileState};

/// Maximum number of undo levels kept while running a scenario
pub const HISTORY_DEPTH: usize = 256;

/// Drives a world through scenario steps. Edits made by steps go through
/// the undo history; the initial layout does not.
#[derive(Debug)]
pub struct Runner {
    world: World,
    history: HistoryManager,
}

impl Runner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            world: World::with_config(config),
            history: HistoryManager::new(HISTORY_DEPTH),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Lay out the scenario, run its steps and report the final state
    pub fn run(&mut self, mut scenario: Scenario) -> Result<ScenarioReport, SimError> {
        let grid = mem::take(&mut scenario.wire_grid);
        if !grid.is_empty() {
            self.world.replace_wires(grid);
        }
        for wire in &scenario.wires {
            let mask = mask(&wire.channels);
            for pos in Rect::from_corners(wire.from, wire.to) {
                self.world.paint_wire(pos, mask);
            }
        }
        for entry in &scenario.tiles {
            self.world.place_tile(entry.at, entry.tile.build())?;
        }
        info!(
            tiles = self.world.tile_count(),
            steps = scenario.steps.len(),
            "scenario laid out"
        );

        let mut steps = Vec::with_capacity(scenario.steps.len());
        for step in &scenario.steps {
            steps.push(self.step(step)?);
        }

        Ok(ScenarioReport {
            steps,
            tiles: self.tile_states(),
            wired_cells: self.world.wires().iter().filter(|(_, bits)| **bits != 0).count(),
        })
    }

    /// Run one step
    pub fn step(&mut self, step: &Step) -> Result<StepOutcome, SimError> {
        debug!(?step, "step");
        let outcome = match step {
            Step::Signal { at, to, channels } => {
                let rect = Rect::from_corners(*at, to.unwrap_or(*at));
                StepOutcome::Signal {
                    report: self.world.signal(rect, mask(channels)),
                }
            }
            Step::Interact { at } => StepOutcome::Interact {
                report: self.world.interact(*at),
            },
            Step::Route { from, to, channels } => {
                let path = self.world.route(*from, *to);
                if let Some(cells) = &path {
                    let command = PaintWireCommand::new(cells.clone(), mask(channels));
                    self.history.execute(Box::new(command), &mut self.world)?;
                }
                StepOutcome::Route { path }
            }
            Step::Paint { from, to, channels } => {
                let command = PaintWireCommand::span(*from, *to, mask(channels));
                let cells = self.history.execute(Box::new(command), &mut self.world)?;
                StepOutcome::Paint { cells: cells.len() }
            }
            Step::Erase { from, to, channels } => {
                let command = EraseWireCommand::new(Rect::from_corners(*from, *to), mask(channels));
                let cells = self.history.execute(Box::new(command), &mut self.world)?;
                StepOutcome::Erase { cells: cells.len() }
            }
            Step::Place { at, tile } => {
                let command = PlaceTileCommand::new(*at, tile.build());
                self.history.execute(Box::new(command), &mut self.world)?;
                let id = self.world.tile_at(*at).ok_or(SimError::NoTile(*at))?;
                StepOutcome::Place { id }
            }
            Step::Remove { at } => {
                let id = self.world.tile_at(*at).ok_or(SimError::NoTile(*at))?;
                self.history.execute(Box::new(RemoveTileCommand::new(id)), &mut self.world)?;
                StepOutcome::Remove { id }
            }
            Step::Undo => StepOutcome::Undo {
                applied: self.history.undo(&mut self.world)?.is_some(),
            },
            Step::Redo => StepOutcome::Redo {
                applied: self.history.redo(&mut self.world)?.is_some(),
            },
        };
        Ok(outcome)
    }

    fn tile_states(&self) -> Vec<TileState> {
        self.world
            .tiles()
            .into_iter()
            .filter_map(|id| {
                let tile = self.world.tile(id)?;
                let any = tile.as_any();
                Some(TileState {
                    id,
                    kind: tile.kind(),
                    origin: self.world.tile_origin(id)?,
                    lit: any.downcast_ref::<Lamp>().map(Lamp::lit),
                    on: any.downcast_ref::<Switch>().map(Switch::is_on),
                    output: any.downcast_ref::<LogicGate>().map(LogicGate::output_level),
                })
            })
            .collect()
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Channels carried by a report's lamps, for quick checks
pub fn lit_channels(report: &ScenarioReport) -> WireMask {
    report
        .tiles
        .iter()
        .filter_map(|tile| tile.lit)
        .fold(WireMask::NONE, |acc, lit| acc | lit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiregrid_core::Pos;

    const SWITCH_TO_LAMP: &str = r#"{
        "wires": [{ "from": { "x": 0, "y": 0 }, "to": { "x": 5, "y": 0 }, "channels": [1] }],
        "tiles": [
            { "at": { "x": 0, "y": 0 }, "tile": { "type": "switch", "channels": [1] } },
            { "at": { "x": 5, "y": 0 }, "tile": { "type": "lamp", "channels": [1] } }
        ],
        "steps": [{ "op": "interact", "at": { "x": 0, "y": 0 } }]
    }"#;

    #[test]
    fn test_switch_lights_lamp() {
        let mut runner = Runner::default();
        let report = runner.run(Scenario::from_json(SWITCH_TO_LAMP).unwrap()).unwrap();

        assert_eq!(lit_channels(&report), WireMask::channel(1));
        assert_eq!(report.wired_cells, 6);
        let switch = report.tiles.iter().find(|t| t.kind == "switch").unwrap();
        assert_eq!(switch.on, Some(true));
        assert!(matches!(
            report.steps[0],
            StepOutcome::Interact { report: Some(r) } if r.dispatched == 1
        ));
    }

    #[test]
    fn test_route_then_undo() {
        let text = r#"{
            "tiles": [{ "at": { "x": 2, "y": 0 }, "tile": { "type": "lamp", "channels": [0] } }],
            "steps": [
                { "op": "route", "from": { "x": 0, "y": 0 }, "to": { "x": 4, "y": 0 }, "channels": [0] },
                { "op": "undo" },
                { "op": "undo" }
            ]
        }"#;
        let mut runner = Runner::default();
        let report = runner.run(Scenario::from_json(text).unwrap()).unwrap();

        let StepOutcome::Route { path: Some(path) } = &report.steps[0] else {
            panic!("expected a route");
        };
        assert!(!path.contains(&Pos::new(2, 0)));
        assert_eq!(report.steps[1], StepOutcome::Undo { applied: true });
        assert_eq!(report.steps[2], StepOutcome::Undo { applied: false });
        assert_eq!(report.wired_cells, 0);
    }

    #[test]
    fn test_place_remove_redo() {
        let text = r#"{
            "steps": [
                { "op": "place", "at": { "x": 1, "y": 1 }, "tile": { "type": "lamp", "channels": [0] } },
                { "op": "remove", "at": { "x": 1, "y": 1 } },
                { "op": "undo" }
            ]
        }"#;
        let mut runner = Runner::default();
        let report = runner.run(Scenario::from_json(text).unwrap()).unwrap();

        assert_eq!(report.tiles.len(), 1);
        assert_eq!(report.tiles[0].origin, Pos::new(1, 1));
        assert!(runner.history().can_redo());
    }

    #[test]
    fn test_remove_on_empty_cell_fails() {
        let text = r#"{ "steps": [{ "op": "remove", "at": { "x": 3, "y": 3 } }] }"#;
        let mut runner = Runner::default();
        let err = runner.run(Scenario::from_json(text).unwrap()).unwrap_err();
        assert!(matches!(err, SimError::NoTile(pos) if pos == Pos::new(3, 3)));
    }
}
