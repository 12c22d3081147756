use kfchess::{Cell, Command, IllegalMove, PieceId};
use tokio::sync::{broadcast, oneshot};

use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Commands sent to the session actor. Each embeds a oneshot for the reply.
pub enum SessionCommand {
    /// Queue a raw command, unvalidated. Replies with the game time it was
    /// stamped with.
    Submit {
        cmd: Command,
        reply: oneshot::Sender<u64>,
    },
    RequestMove {
        piece: PieceId,
        to: Cell,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    RequestJump {
        piece: PieceId,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    GetSnapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SessionEvent>)>,
    },
    Shutdown,
}
