use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use kfchess::{EngineConfig, Game, GameEvent};
use kfchess_server::assets::load_assets;
use kfchess_server::config;
use kfchess_server::input::Input;
use kfchess_server::session::{SessionEvent, SessionHandle, SessionManager};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Headless real-time chess match driven from stdin.
#[derive(Parser)]
#[command(name = "kfchess-server", about = "Real-time chess match host")]
struct Cli {
    /// Piece rule data and board layout [env: KFCHESS_PIECES_DIR]
    #[arg(long)]
    pieces_dir: Option<PathBuf>,

    /// Tick period in milliseconds [env: KFCHESS_TICK_MS]
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Write daily log files here instead of stderr [env: KFCHESS_LOG_DIR]
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// JSON file with engine timings (cooldown_ms, ms_per_cell, ...)
    #[arg(long)]
    engine_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit.
    let _guard = init_tracing(cli.log_dir.or_else(config::get_log_dir))?;

    let pieces_dir = cli.pieces_dir.unwrap_or_else(config::get_pieces_dir);
    let tick_period = cli
        .tick_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or_else(config::get_tick_period);
    let engine_config = match cli.engine_config {
        Some(path) => load_engine_config(&path)?,
        None => EngineConfig::default(),
    };

    tracing::info!("Using pieces directory: {}", pieces_dir.display());
    let assets = load_assets(&pieces_dir).context("Failed to load piece assets")?;
    let mut factory = assets.factory(engine_config);
    let game = Game::from_layout(&mut factory, &assets.layout)
        .context("Failed to place the initial board")?;

    let manager = SessionManager::new(tick_period);
    let handle = manager.create_session(game).await;
    tracing::info!(session = handle.id(), "Match started");

    let (snapshot, events) = handle.subscribe().await?;
    println!(
        "{} pieces on a {}x{} board. Commands: move r,c r,c | jump r,c | show | quit",
        snapshot.pieces.len(),
        assets.dims().rows,
        assets.dims().cols
    );
    let mut printer = tokio::spawn(print_events(events));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => {
                        if !run_input(&handle, &line).await? {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = &mut printer => break,
        }
    }

    let last = manager.close_session(handle.id()).await?;
    if let Some(outcome) = last.outcome() {
        tracing::info!(?outcome, "Match finished");
    }
    Ok(())
}

fn init_tracing(
    log_dir: Option<PathBuf>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_dir) = log_dir else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "kfchess-server");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
    Ok(Some(guard))
}

fn load_engine_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid engine config {}", path.display()))
}

/// Handle one input line. Returns false when the user asked to quit.
async fn run_input(handle: &SessionHandle, line: &str) -> anyhow::Result<bool> {
    let input = match Input::parse(line) {
        Ok(input) => input,
        Err(e) => {
            println!("{}", e);
            return Ok(true);
        }
    };
    let snapshot = handle.get_snapshot().await?;
    let piece = match input.resolve(&snapshot) {
        Ok(piece) => piece,
        Err(e) => {
            println!("{}", e);
            return Ok(true);
        }
    };

    let result = match (input, piece) {
        (Input::Quit, _) => return Ok(false),
        (Input::Show, _) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            return Ok(true);
        }
        (Input::Move { to, .. }, Some(piece)) => handle.request_move(piece, to).await,
        (Input::Jump { .. }, Some(piece)) => handle.request_jump(piece).await,
        (_, None) => return Ok(true),
    };
    if let Err(e) = result {
        println!("{}", e);
    }
    Ok(true)
}

/// Print game events until the match ends or the session closes.
async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::Game(event)) => {
                print_event(&event);
                if matches!(event, GameEvent::GameEnded { .. }) {
                    break;
                }
            }
            Ok(SessionEvent::StateChanged(_)) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Event printer lagged, skipped {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &GameEvent) {
    match event {
        GameEvent::GameStarted { pieces, .. } => println!("Game started with {} pieces", pieces),
        GameEvent::MoveAccepted {
            at,
            code,
            kind,
            from,
            to,
            ..
        } => println!("[{:>6}ms] {} {} {} -> {}", at, code, kind.as_str(), from, to),
        GameEvent::PieceCaptured { at, capture } => println!(
            "[{:>6}ms] {} captured {} at {}",
            at, capture.by_code, capture.captured_code, capture.cell
        ),
        GameEvent::GameEnded { at, outcome } => println!("[{:>6}ms] Game over: {:?}", at, outcome),
    }
}
