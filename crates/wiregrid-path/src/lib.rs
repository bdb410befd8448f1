pub mod astar;

pub use astar::{heuristic, GridPathfinder, STEP_COST};
