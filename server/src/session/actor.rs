use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::Instrument;

use super::commands::SessionCommand;
use super::events::SessionEvent;
use super::state::SessionState;

/// The main session actor loop.
/// Owns the game. Processes commands and ticks sequentially.
pub(crate) async fn run_session_actor(
    state: SessionState,
    tick_period: Duration,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    let session_id = state.session_id.clone();
    run_session_actor_inner(state, tick_period, cmd_rx, event_tx)
        .instrument(tracing::info_span!("session", id = %session_id))
        .await;
}

async fn run_session_actor_inner(
    mut state: SessionState,
    tick_period: Duration,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    tracing::info!(tick_ms = tick_period.as_millis() as u64, "Session actor started");

    let mut tick_interval = time::interval(tick_period);
    tick_interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    state.start(&event_tx);

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Shutdown) | None => {
                        tracing::info!("Session actor shutting down");
                        break;
                    }
                    Some(cmd) => handle_command(&mut state, cmd, &event_tx),
                }
            }

            _ = tick_interval.tick(), if !state.game.is_over() => {
                let events = state.tick();
                if !events.is_empty() {
                    let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
                }
            }
        }
    }

    tracing::info!("Session actor exited");
}

fn handle_command(
    state: &mut SessionState,
    cmd: SessionCommand,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    match cmd {
        SessionCommand::Submit { cmd, reply } => {
            let _ = reply.send(state.submit(cmd));
        }
        SessionCommand::RequestMove { piece, to, reply } => {
            let _ = reply.send(state.request_move(piece, to));
        }
        SessionCommand::RequestJump { piece, reply } => {
            let _ = reply.send(state.request_jump(piece));
        }
        SessionCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.snapshot());
        }
        SessionCommand::Subscribe { reply } => {
            let snapshot = state.snapshot();
            let rx = event_tx.subscribe();
            let _ = reply.send((snapshot, rx));
        }
        SessionCommand::Shutdown => unreachable!(),
    }
}
