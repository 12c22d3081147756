pub mod actor;
pub mod commands;
pub mod events;
pub mod handle;
pub mod snapshot;
pub mod state;

use std::collections::HashMap;
use std::time::Duration;

use kfchess::Game;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use actor::run_session_actor;
pub use commands::SessionError;
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use snapshot::SessionSnapshot;
use state::SessionState;

/// Manages all running matches. Spawns an actor task per session.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    tick_period: Duration,
}

impl SessionManager {
    pub fn new(tick_period: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            tick_period,
        }
    }

    /// Spawn an actor that starts `game` and ticks it until shut down.
    pub async fn create_session(&self, game: Game) -> SessionHandle {
        let session_id = Uuid::new_v4().to_string();
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (event_tx, _) = broadcast::channel(100);

        let state = SessionState::new(session_id.clone(), game);
        tokio::spawn(run_session_actor(state, self.tick_period, cmd_rx, event_tx));

        let handle = SessionHandle::new(session_id.clone(), cmd_tx);
        self.sessions
            .write()
            .await
            .insert(session_id, handle.clone());
        handle
    }

    pub async fn get_handle(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    pub async fn session_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Stop a session's actor and forget it. Returns its final snapshot.
    pub async fn close_session(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        let snapshot = handle.get_snapshot().await;
        handle.shutdown().await;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfchess::EngineConfig;

    #[tokio::test(start_paused = true)]
    async fn test_session_lifecycle() {
        let manager = SessionManager::new(Duration::from_millis(33));
        let game = Game::standard(EngineConfig::default()).unwrap();
        let handle = manager.create_session(game).await;

        assert!(Uuid::parse_str(handle.id()).is_ok());
        assert_eq!(manager.session_ids().await, vec![handle.id().to_string()]);
        let found = manager.get_handle(handle.id()).await.unwrap();
        assert_eq!(found.get_snapshot().await.unwrap().pieces.len(), 32);

        let last = manager.close_session(handle.id()).await.unwrap();
        assert_eq!(last.session_id, handle.id());
        assert!(matches!(
            manager.get_handle(handle.id()).await,
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(
            manager.close_session(handle.id()).await,
            Err(SessionError::NotFound(_))
        ));
    }
}
