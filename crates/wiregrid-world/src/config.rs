use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for a [`World`](crate::World)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Follow-up signal requests (emitted by tiles) allowed per top-level operation
    pub max_cascade: usize,
    /// Wall-clock budget for [`World::route`](crate::World::route), in milliseconds
    pub path_budget_ms: u64,
    /// Cells searched around the start/goal box when routing
    pub route_margin: u32,
}

impl EngineConfig {
    pub fn path_budget(&self) -> Duration {
        Duration::from_millis(self.path_budget_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cascade: 1024,
            path_budget_ms: 50,
            route_margin: 32,
        }
    }
}
