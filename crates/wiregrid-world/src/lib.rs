pub mod config;
pub mod error;
pub mod signal;
pub mod tile;
pub mod tiles;
pub mod world;

pub use config::EngineConfig;
pub use error::WorldError;
pub use signal::{SignalDispatcher, SignalField, SignalTracker, WireSignal};
pub use tile::{SignalRequest, Tile, TileContext, TileId, TileSignal};
pub use tiles::{GateKind, JunctionBox, Lamp, LogicGate, Switch};
pub use world::{SignalReport, World, OCCUPANCY_CHUNK_SIZE};
