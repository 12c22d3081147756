//! Movement and animation collaborators carried by live states.
//!
//! [`Motion`] is the single authority on whether a piece is settled or in
//! transit and which cell it currently occupies. [`Animation`] only tracks a
//! sprite frame index for the rendering layer.

use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandKind};
use crate::types::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionPhase {
    Settled,
    InTransit,
}

/// Speed settings of one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionProfile {
    /// Time to cover one cell (Chebyshev distance) while moving.
    pub ms_per_cell: u64,
    /// Time spent airborne during a jump.
    pub jump_ms: u64,
    /// Time an in-place attack keeps the piece busy.
    pub attack_ms: u64,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            ms_per_cell: 1000,
            jump_ms: 1000,
            attack_ms: 1000,
        }
    }
}

/// Position context of a piece. Copied from state to state on every
/// transition so a piece never loses track of where it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motion {
    origin: Cell,
    target: Cell,
    cell: Cell,
    started_at: u64,
    duration_ms: u64,
    phase: MotionPhase,
    profile: MotionProfile,
}

impl Motion {
    pub fn settled(at: Cell, profile: MotionProfile) -> Self {
        Self {
            origin: at,
            target: at,
            cell: at,
            started_at: 0,
            duration_ms: 0,
            phase: MotionPhase::Settled,
            profile,
        }
    }

    /// Adopt the speed settings of the state being entered.
    pub(crate) fn set_profile(&mut self, profile: MotionProfile) {
        self.profile = profile;
    }

    /// Restart from a command: a move starts a transit toward the command's
    /// destination, a jump or an attack keeps the piece busy in place, and
    /// anything else settles it where it is.
    pub fn restart(&mut self, cmd: &Command) {
        self.origin = self.cell;
        self.started_at = cmd.timestamp;
        match cmd.kind {
            CommandKind::Move => {
                self.target = cmd.destination.unwrap_or(self.cell);
                let steps = self.origin.delta_to(self.target).chebyshev() as u64;
                self.duration_ms = steps * self.profile.ms_per_cell;
                self.phase = MotionPhase::InTransit;
            }
            CommandKind::Jump | CommandKind::Attack => {
                self.target = self.cell;
                self.duration_ms = if cmd.kind == CommandKind::Jump {
                    self.profile.jump_ms
                } else {
                    self.profile.attack_ms
                };
                self.phase = MotionPhase::InTransit;
            }
            _ => {
                self.target = self.cell;
                self.duration_ms = 0;
                self.phase = MotionPhase::Settled;
            }
        }
    }

    /// Advance to `now`. Returns true exactly once, on the update that
    /// finishes a transit.
    pub fn update(&mut self, now: u64) -> bool {
        if self.phase == MotionPhase::Settled {
            return false;
        }
        let elapsed = now.saturating_sub(self.started_at);
        if elapsed >= self.duration_ms {
            self.cell = self.target;
            self.phase = MotionPhase::Settled;
            return true;
        }
        self.cell = self.position_at(elapsed);
        false
    }

    /// Abort the transit and put the piece back on its pre-move cell.
    pub fn cancel(&mut self) {
        self.target = self.origin;
        self.cell = self.origin;
        self.duration_ms = 0;
        self.phase = MotionPhase::Settled;
    }

    /// Cell occupied during a transit. Straight and diagonal moves advance
    /// one cell at a time along the line; other displacements (knight leaps)
    /// land on the target at the halfway point.
    fn position_at(&self, elapsed: u64) -> Cell {
        let delta = self.origin.delta_to(self.target);
        if delta.is_line() {
            let steps = delta.chebyshev() as u64;
            let travelled = (elapsed * steps * 2 + self.duration_ms) / (2 * self.duration_ms);
            let travelled = travelled.min(steps) as i32;
            self.origin.offset(delta.unit().scaled(travelled))
        } else if elapsed * 2 >= self.duration_ms {
            self.target
        } else {
            self.origin
        }
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    /// Cell the current transit started from.
    pub fn origin(&self) -> Cell {
        self.origin
    }

    pub fn target(&self) -> Cell {
        self.target
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        self.phase == MotionPhase::Settled
    }
}

/// Sprite sequence settings of one state. A spec with no frames is a valid
/// placeholder for missing assets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub frame_count: usize,
    pub fps: f64,
    pub looping: bool,
}

impl AnimationSpec {
    pub fn placeholder() -> Self {
        Self {
            frame_count: 0,
            ..Self::default()
        }
    }

    fn frame_duration_ms(&self) -> u64 {
        if self.fps > 0.0 {
            ((1000.0 / self.fps) as u64).max(1)
        } else {
            u64::MAX
        }
    }
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self {
            frame_count: 1,
            fps: 6.0,
            looping: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    spec: AnimationSpec,
    started_at: u64,
    frame: usize,
}

impl Animation {
    pub fn new(spec: AnimationSpec) -> Self {
        Self {
            spec,
            started_at: 0,
            frame: 0,
        }
    }

    pub fn restart(&mut self, at: u64) {
        self.started_at = at;
        self.frame = 0;
    }

    /// Frame index from game time, not wall time.
    pub fn update(&mut self, now: u64) {
        let count = self.spec.frame_count;
        if count == 0 {
            return;
        }
        let idx = (now.saturating_sub(self.started_at) / self.spec.frame_duration_ms()) as usize;
        self.frame = if self.spec.looping {
            idx % count
        } else {
            idx.min(count - 1)
        };
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn spec(&self) -> &AnimationSpec {
        &self.spec
    }
}
