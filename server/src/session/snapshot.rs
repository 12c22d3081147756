use kfchess::{Cell, GameOutcome, GamePhase, PieceView};
use serde::Serialize;

/// Complete, immutable snapshot of session state.
/// Sent to subscribers on every state change and on subscribe.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    /// Game time in milliseconds since the session started.
    pub time_ms: u64,
    pub phase: GamePhase,
    pub pieces: Vec<PieceView>,
    /// Commands waiting for the next tick.
    pub pending: usize,
}

impl SessionSnapshot {
    /// The piece standing on `cell`, lowest id first if several are.
    pub fn piece_at(&self, cell: Cell) -> Option<&PieceView> {
        self.pieces
            .iter()
            .filter(|p| p.cell == cell)
            .min_by_key(|p| p.id)
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.phase {
            GamePhase::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }
}
