//! Engine timing and board configuration.

use serde::{Deserialize, Serialize};

use crate::motion::MotionProfile;
use crate::types::BoardDims;

pub const DEFAULT_COOLDOWN_MS: u64 = 2000;
pub const DEFAULT_LONG_REST_MS: u64 = 2000;
pub const DEFAULT_SHORT_REST_MS: u64 = 1000;
pub const DEFAULT_MS_PER_CELL: u64 = 1000;
pub const DEFAULT_JUMP_MS: u64 = 1000;
pub const DEFAULT_ATTACK_MS: u64 = 1000;

/// Timing knobs shared by every piece in a game. Missing fields fall back
/// to the defaults above when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Global per-piece cooldown between accepted commands.
    pub cooldown_ms: u64,
    pub long_rest_ms: u64,
    pub short_rest_ms: u64,
    pub ms_per_cell: u64,
    pub jump_ms: u64,
    pub attack_ms: u64,
    pub board: BoardDims,
}

impl EngineConfig {
    pub fn motion_profile(&self) -> MotionProfile {
        MotionProfile {
            ms_per_cell: self.ms_per_cell,
            jump_ms: self.jump_ms,
            attack_ms: self.attack_ms,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            long_rest_ms: DEFAULT_LONG_REST_MS,
            short_rest_ms: DEFAULT_SHORT_REST_MS,
            ms_per_cell: DEFAULT_MS_PER_CELL,
            jump_ms: DEFAULT_JUMP_MS,
            attack_ms: DEFAULT_ATTACK_MS,
            board: BoardDims::default(),
        }
    }
}
