use kfchess::{Cell, Command, Game, GameEvent, PieceId};
use tokio::sync::broadcast;
use tokio::time::Instant;

use super::commands::SessionError;
use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;

/// Internal mutable state, owned entirely by the session actor. No locks.
pub(crate) struct SessionState {
    pub session_id: String,
    pub game: Game,
    clock: Instant,
}

impl SessionState {
    pub fn new(session_id: String, game: Game) -> Self {
        Self {
            session_id,
            game,
            clock: Instant::now(),
        }
    }

    /// Game time: milliseconds since `start`.
    pub fn now_ms(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    /// Forward every game event to `event_tx` and begin play at time zero.
    pub fn start(&mut self, event_tx: &broadcast::Sender<SessionEvent>) {
        let tx = event_tx.clone();
        self.game.events_mut().subscribe_all(move |event: &GameEvent| {
            let _ = tx.send(SessionEvent::Game(event.clone()));
        });
        self.clock = Instant::now();
        self.game.start(0);
    }

    pub fn tick(&mut self) -> Vec<GameEvent> {
        let now = self.now_ms();
        self.game.tick(now)
    }

    pub fn submit(&mut self, mut cmd: Command) -> u64 {
        let now = self.now_ms();
        cmd.timestamp = now;
        self.game.submit(cmd);
        now
    }

    pub fn request_move(&mut self, piece: PieceId, to: Cell) -> Result<(), SessionError> {
        let now = self.now_ms();
        self.game.request_move(piece, to, now)?;
        Ok(())
    }

    pub fn request_jump(&mut self, piece: PieceId) -> Result<(), SessionError> {
        let now = self.now_ms();
        self.game.request_jump(piece, now)?;
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.now_ms();
        SessionSnapshot {
            session_id: self.session_id.clone(),
            time_ms: now,
            phase: self.game.phase(),
            pieces: self.game.views(now),
            pending: self.game.pending(),
        }
    }
}
