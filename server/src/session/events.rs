use kfchess::GameEvent;

use super::snapshot::SessionSnapshot;

/// Events broadcast from the session actor to all subscribers.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum SessionEvent {
    /// Forwarded from the game's event bus as it is published.
    Game(GameEvent),
    /// Full state snapshot after any tick that produced game events.
    StateChanged(SessionSnapshot),
}
