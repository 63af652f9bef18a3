//! Kernel configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the command log and snapshot policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Take a full-state snapshot every N committed commands.
    pub snapshot_interval: u64,
    /// Hard cap on parent-chain length accepted during replay. A chain
    /// longer than this indicates a corrupted (cyclic) undo tree.
    pub max_replay_depth: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: 25,
            max_replay_depth: 100_000,
        }
    }
}

impl KernelConfig {
    /// Returns a config with the given snapshot interval (minimum 1).
    pub fn with_snapshot_interval(mut self, interval: u64) -> Self {
        self.snapshot_interval = interval.max(1);
        self
    }
}
