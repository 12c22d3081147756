//! A live piece: one live state machine plus the global action cooldown.
//!
//! Two timers gate a piece independently. The per-state rest timer lives in
//! the current [`LiveState`]; the cooldown here is measured from the last
//! accepted command. A piece can be out of rest but still cooling down.
//! Since entering a rest state always follows an accepted command, a resting
//! piece is never off cooldown unless the rest outlasts it.

use std::sync::Arc;

use crate::command::{Command, CommandKind};
use crate::motion::MotionPhase;
use crate::moves::MoveTable;
use crate::state::{LiveGraph, LiveState, StateGraph, IDLE};
use crate::types::{Cell, PieceCode, PieceColor, PieceId, PieceKind};

#[derive(Debug, Clone)]
pub struct Piece {
    id: PieceId,
    code: PieceCode,
    template: Arc<StateGraph>,
    graph: LiveGraph,
    last_action_time_ms: u64,
    cooldown_ms: u64,
    has_moved: bool,
    move_count: u32,
}

impl Piece {
    pub fn new(id: PieceId, template: Arc<StateGraph>, at: Cell, cooldown_ms: u64) -> Self {
        let graph = template.instantiate(id, at);
        Self {
            id,
            code: template.code(),
            template,
            graph,
            last_action_time_ms: 0,
            cooldown_ms,
            has_moved: false,
            move_count: 0,
        }
    }

    /// Offer a command. Returns true if the piece changed state.
    ///
    /// Commands for another piece, commands arriving during the cooldown,
    /// repeated pawn double steps and commands the current state has no
    /// edge for are dropped silently.
    pub fn dispatch(&mut self, cmd: &Command, now: u64) -> bool {
        if cmd.piece_id != self.id {
            return false;
        }
        if !cmd.is_internal() && self.is_on_cooldown(now) {
            tracing::debug!(piece = %self.id, kind = cmd.kind.as_str(), "Dropped: cooldown");
            return false;
        }
        if self.is_repeat_double_step(cmd) {
            tracing::debug!(piece = %self.id, "Dropped: pawn double step after first move");
            return false;
        }
        if !self.graph.dispatch(cmd, now) {
            tracing::debug!(
                piece = %self.id,
                kind = cmd.kind.as_str(),
                state = self.state_name(),
                "Dropped: no transition"
            );
            return false;
        }

        self.last_action_time_ms = self.last_action_time_ms.max(now);
        self.move_count += 1;
        if cmd.kind.is_motion() {
            self.has_moved = true;
        }
        true
    }

    fn is_repeat_double_step(&self, cmd: &Command) -> bool {
        if self.code.kind != PieceKind::Pawn || cmd.kind != CommandKind::Move || !self.has_moved {
            return false;
        }
        let from = cmd.source.unwrap_or_else(|| self.cell());
        cmd.destination
            .map(|to| from.delta_to(to).d_row.abs() == 2)
            .unwrap_or(false)
    }

    /// Tick timers. Returns the synthetic command kind that moved the piece
    /// to a new state, if any.
    pub fn advance(&mut self, now: u64) -> Option<CommandKind> {
        self.graph.advance(now)
    }

    /// Back to a fresh piece in `idle`, with the cooldown measured from
    /// `start_time`.
    pub fn reset(&mut self, start_time: u64) {
        self.last_action_time_ms = start_time;
        self.has_moved = false;
        self.move_count = 0;
        let cmd = Command::internal(start_time, self.id, CommandKind::Idle);
        self.graph.force(IDLE, &cmd);
    }

    /// Undo a blocked move: return to the pre-move cell and drop to `idle`
    /// without touching the cooldown.
    pub(crate) fn force_idle(&mut self, now: u64) {
        self.graph.cancel_motion();
        let cmd = Command::internal(now, self.id, CommandKind::Idle);
        self.graph.force(IDLE, &cmd);
    }

    pub fn is_on_cooldown(&self, now: u64) -> bool {
        now.saturating_sub(self.last_action_time_ms) < self.cooldown_ms
    }

    /// Remaining cooldown in `[0, 1]`, 1 right after an accepted command.
    pub fn cooldown_fraction(&self, now: u64) -> f32 {
        if self.cooldown_ms == 0 {
            return 0.0;
        }
        let elapsed = now.saturating_sub(self.last_action_time_ms);
        let remaining = self.cooldown_ms.saturating_sub(elapsed);
        remaining as f32 / self.cooldown_ms as f32
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn code(&self) -> PieceCode {
        self.code
    }

    pub fn kind(&self) -> PieceKind {
        self.code.kind
    }

    pub fn color(&self) -> PieceColor {
        self.code.color
    }

    pub fn template(&self) -> &Arc<StateGraph> {
        &self.template
    }

    pub fn state(&self) -> &LiveState {
        self.graph.current()
    }

    pub fn state_name(&self) -> &str {
        self.graph.current().name()
    }

    pub fn moves(&self) -> &MoveTable {
        self.graph.current().moves()
    }

    pub fn cell(&self) -> Cell {
        self.graph.cell()
    }

    pub fn phase(&self) -> MotionPhase {
        self.graph.phase()
    }

    pub fn is_mover(&self) -> bool {
        self.phase() == MotionPhase::InTransit
    }

    pub fn animation_frame(&self) -> usize {
        self.graph.current().animation().frame()
    }

    pub fn last_action_time_ms(&self) -> u64 {
        self.last_action_time_ms
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    pub fn has_moved(&self) -> bool {
        self.has_moved
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }
}
