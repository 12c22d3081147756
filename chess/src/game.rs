//! The game loop: the live piece set, the FIFO command queue and the fixed
//! per-tick order advance → dispatch → arbitrate → win check.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::arbiter::resolve_collisions;
use crate::command::{Command, CommandKind};
use crate::config::EngineConfig;
use crate::error::LayoutError;
use crate::events::{EventBus, GameEvent};
use crate::factory::PieceFactory;
use crate::layout::BoardLayout;
use crate::legality::{check_move, legal_destinations, IllegalMove, Occupancy, Occupant};
use crate::motion::MotionPhase;
use crate::piece::Piece;
use crate::types::{BoardDims, Cell, PieceCode, PieceColor, PieceId, PieceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(PieceColor),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Setup,
    Playing,
    Ended(GameOutcome),
}

/// Occupancy of the board at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardSnapshot {
    dims: BoardDims,
    cells: BTreeMap<Cell, Occupant>,
}

impl BoardSnapshot {
    pub fn dims(&self) -> BoardDims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, Occupant)> + '_ {
        self.cells.iter().map(|(c, o)| (*c, *o))
    }
}

impl Occupancy for BoardSnapshot {
    fn occupant(&self, cell: Cell) -> Option<Occupant> {
        self.cells.get(&cell).copied()
    }
}

/// What the rendering layer needs to draw one piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceView {
    pub id: PieceId,
    pub code: PieceCode,
    pub cell: Cell,
    pub state: String,
    pub phase: MotionPhase,
    pub frame: usize,
    /// Remaining cooldown, 1.0 right after an accepted command.
    pub cooldown: f32,
}

#[derive(Debug)]
pub struct Game {
    config: EngineConfig,
    pieces: Vec<Piece>,
    queue: VecDeque<Command>,
    bus: EventBus,
    phase: GamePhase,
    kings_at_start: usize,
}

impl Game {
    pub fn new(config: EngineConfig, pieces: Vec<Piece>) -> Self {
        Self {
            config,
            pieces,
            queue: VecDeque::new(),
            bus: EventBus::new(),
            phase: GamePhase::Setup,
            kings_at_start: 0,
        }
    }

    /// Standard rules on the standard starting position.
    pub fn standard(config: EngineConfig) -> Result<Self, LayoutError> {
        let mut factory = PieceFactory::standard(config);
        Self::from_layout(&mut factory, &BoardLayout::standard())
    }

    pub fn from_layout(factory: &mut PieceFactory, layout: &BoardLayout) -> Result<Self, LayoutError> {
        let pieces = factory.create_layout(layout)?;
        Ok(Self::new(*factory.config(), pieces))
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Reset every piece to `now` and begin play.
    pub fn start(&mut self, now: u64) {
        for piece in &mut self.pieces {
            piece.reset(now);
        }
        self.queue.clear();
        self.kings_at_start = self.king_count();
        self.phase = GamePhase::Playing;
        tracing::info!(pieces = self.pieces.len(), "Game started");
        self.bus.publish(&GameEvent::GameStarted {
            at: now,
            pieces: self.pieces.len(),
        });
    }

    /// Queue a command for the next tick, in submission order.
    pub fn submit(&mut self, cmd: Command) {
        self.queue.push_back(cmd);
    }

    /// Validate a move against the current board and queue it.
    pub fn request_move(&mut self, id: PieceId, to: Cell, now: u64) -> Result<(), IllegalMove> {
        if self.is_over() {
            return Err(IllegalMove::GameOver);
        }
        let piece = self.piece(id).ok_or(IllegalMove::UnknownPiece(id))?;
        let from = piece.cell();
        if let Err(e) = check_move(piece, from, to, &self.snapshot()) {
            tracing::debug!(piece = %id, %from, %to, "Rejected move: {}", e);
            return Err(e);
        }
        self.submit(Command::move_to(now, id, from, to));
        Ok(())
    }

    pub fn request_jump(&mut self, id: PieceId, now: u64) -> Result<(), IllegalMove> {
        if self.is_over() {
            return Err(IllegalMove::GameOver);
        }
        let at = self.piece(id).ok_or(IllegalMove::UnknownPiece(id))?.cell();
        self.submit(Command::jump(now, id, at));
        Ok(())
    }

    /// Run one simulation step at game time `now`. Returns the events
    /// published during the step.
    pub fn tick(&mut self, now: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.phase != GamePhase::Playing {
            return events;
        }

        for piece in &mut self.pieces {
            piece.advance(now);
        }

        while let Some(cmd) = self.queue.pop_front() {
            self.dispatch(&cmd, now, &mut events);
        }

        let arbitration = resolve_collisions(&mut self.pieces, now);
        for capture in arbitration.captures {
            self.emit(GameEvent::PieceCaptured { at: now, capture }, &mut events);
        }

        if let Some(outcome) = self.check_winner() {
            self.phase = GamePhase::Ended(outcome);
            tracing::info!(?outcome, "Game ended");
            self.emit(GameEvent::GameEnded { at: now, outcome }, &mut events);
        }
        events
    }

    fn dispatch(&mut self, cmd: &Command, now: u64, events: &mut Vec<GameEvent>) {
        let Some(piece) = self.pieces.iter_mut().find(|p| p.id() == cmd.piece_id) else {
            tracing::debug!(piece = %cmd.piece_id, "Dropped: piece not on board");
            return;
        };
        let from = piece.cell();
        if !piece.dispatch(cmd, now) {
            return;
        }
        if matches!(
            cmd.kind,
            CommandKind::Move | CommandKind::Jump | CommandKind::Attack
        ) {
            let event = GameEvent::MoveAccepted {
                at: now,
                piece: piece.id(),
                code: piece.code(),
                kind: cmd.kind,
                from,
                to: cmd.destination.unwrap_or(from),
            };
            self.emit(event, events);
        }
    }

    fn emit(&mut self, event: GameEvent, events: &mut Vec<GameEvent>) {
        self.bus.publish(&event);
        events.push(event);
    }

    /// The game ends once fewer than two kings remain, if it began with two.
    fn check_winner(&self) -> Option<GameOutcome> {
        if self.kings_at_start < 2 || self.king_count() >= 2 {
            return None;
        }
        let survivor = self
            .pieces
            .iter()
            .find(|p| p.kind() == PieceKind::King)
            .map(|p| p.color());
        Some(match survivor {
            Some(color) => GameOutcome::Winner(color),
            None => GameOutcome::Draw,
        })
    }

    fn king_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.kind() == PieceKind::King)
            .count()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut cells = BTreeMap::new();
        for piece in &self.pieces {
            cells.entry(piece.cell()).or_insert(Occupant {
                id: piece.id(),
                color: piece.color(),
            });
        }
        BoardSnapshot {
            dims: self.config.board,
            cells,
        }
    }

    pub fn views(&self, now: u64) -> Vec<PieceView> {
        self.pieces
            .iter()
            .map(|p| PieceView {
                id: p.id(),
                code: p.code(),
                cell: p.cell(),
                state: p.state_name().to_string(),
                phase: p.phase(),
                frame: p.animation_frame(),
                cooldown: p.cooldown_fraction(now),
            })
            .collect()
    }

    /// Legal destinations of a piece on the current board.
    pub fn legal_moves(&self, id: PieceId) -> Vec<Cell> {
        match self.piece(id) {
            Some(piece) => legal_destinations(piece, &self.snapshot()),
            None => Vec::new(),
        }
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id() == id)
    }

    pub fn piece_at(&self, cell: Cell) -> Option<&Piece> {
        self.pieces
            .iter()
            .filter(|p| p.cell() == cell)
            .min_by_key(|p| p.id())
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.phase {
            GamePhase::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::Ended(_))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::sync::{Arc, Mutex};

    fn quick() -> EngineConfig {
        EngineConfig {
            cooldown_ms: 500,
            ms_per_cell: 100,
            jump_ms: 100,
            long_rest_ms: 300,
            short_rest_ms: 200,
            ..EngineConfig::default()
        }
    }

    fn game_from(csv: &str) -> Game {
        let mut factory = PieceFactory::standard(quick());
        let layout = BoardLayout::parse(csv).unwrap();
        Game::from_layout(&mut factory, &layout).unwrap()
    }

    #[test]
    fn test_standard_game_setup() {
        let mut game = Game::standard(EngineConfig::default()).unwrap();
        assert_eq!(game.phase(), GamePhase::Setup);
        assert!(game.tick(100).is_empty());
        game.start(0);
        assert_eq!(game.pieces().len(), 32);
        assert_eq!(game.snapshot().len(), 32);
        let knight = game.piece_at(Cell::new(7, 1)).unwrap().id();
        assert_eq!(game.legal_moves(knight).len(), 2);
    }

    #[test]
    fn test_request_move_validates() {
        let mut game = Game::standard(EngineConfig::default()).unwrap();
        game.start(0);
        let rook = game.piece_at(Cell::new(7, 0)).unwrap().id();
        assert!(matches!(
            game.request_move(rook, Cell::new(4, 0), 0),
            Err(IllegalMove::PathBlocked { .. })
        ));
        assert_eq!(
            game.request_move(PieceId(999), Cell::new(4, 0), 0),
            Err(IllegalMove::UnknownPiece(PieceId(999)))
        );
        let pawn = game.piece_at(Cell::new(6, 0)).unwrap().id();
        assert_eq!(game.request_move(pawn, Cell::new(4, 0), 0), Ok(()));
        assert_eq!(game.pending(), 1);
    }

    #[test]
    fn test_tick_publishes_accepted_moves() {
        let mut game = game_from(",,,\n,,,\n,,,\nKW,,,KB\n");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        game.events_mut().subscribe_all(move |e: &GameEvent| {
            log.lock().unwrap().push(e.kind());
        });
        game.start(0);
        let king = game.piece_at(Cell::new(3, 0)).unwrap().id();
        game.request_move(king, Cell::new(2, 0), 600).unwrap();
        let events = game.tick(600);
        assert_eq!(events.len(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![EventKind::GameStarted, EventKind::MoveAccepted]
        );
        assert_eq!(game.piece(king).unwrap().state_name(), "move");
    }

    #[test]
    fn test_capturing_king_ends_game_once() {
        let mut game = game_from("KW,KB,,\nRW,,,\n");
        game.start(0);
        let rook = game.piece_at(Cell::new(1, 0)).unwrap().id();
        let king = game.piece_at(Cell::new(0, 0)).unwrap().id();
        // Row 0 is blocked by the white king; go round.
        game.request_move(rook, Cell::new(1, 1), 600).unwrap();
        game.tick(600);
        game.tick(700);
        game.tick(1000);
        game.tick(1200);
        game.request_move(rook, Cell::new(0, 1), 1200).unwrap();
        let events = game.tick(1200);
        assert!(events.is_empty() || events.iter().all(|e| e.kind() == EventKind::MoveAccepted));

        let events = game.tick(1300);
        let kinds: Vec<EventKind> = events.iter().map(GameEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::PieceCaptured, EventKind::GameEnded]);
        assert_eq!(game.outcome(), Some(GameOutcome::Winner(PieceColor::White)));
        assert!(game.piece(king).is_some());

        assert!(game.tick(5000).is_empty());
        assert_eq!(
            game.request_move(rook, Cell::new(1, 1), 5000),
            Err(IllegalMove::GameOver)
        );
    }
}
