use thiserror::Error;
use wiregrid_core::Pos;
use wiregrid_world::WorldError;

/// Scenario runner error type
#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scenario error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("World error: {0}")]
    World(#[from] WorldError),

    #[error("No tile at {0}")]
    NoTile(Pos),
}
