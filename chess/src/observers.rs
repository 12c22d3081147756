//! Stock event subscribers: a material scoreboard and a log of accepted moves.

use serde::{Deserialize, Serialize};

use crate::command::CommandKind;
use crate::events::{GameEvent, Subscriber};
use crate::types::{Cell, PieceCode, PieceColor, PieceId};

/// Material captured by each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    white: u32,
    black: u32,
    captured: Vec<PieceCode>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self, color: PieceColor) -> u32 {
        match color {
            PieceColor::White => self.white,
            PieceColor::Black => self.black,
        }
    }

    /// Pieces taken so far, in capture order.
    pub fn captured(&self) -> &[PieceCode] {
        &self.captured
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Subscriber for ScoreBoard {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::GameStarted { .. } => self.reset(),
            GameEvent::PieceCaptured { capture, .. } => {
                let value = capture.captured_code.kind.value();
                match capture.by_code.color {
                    PieceColor::White => self.white += value,
                    PieceColor::Black => self.black += value,
                }
                self.captured.push(capture.captured_code);
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub at: u64,
    pub piece: PieceId,
    pub code: PieceCode,
    pub kind: CommandKind,
    pub from: Cell,
    pub to: Cell,
}

impl std::fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.at / 1000;
        write!(
            f,
            "{:02}:{:02}.{:03} {} {}",
            secs / 60,
            secs % 60,
            self.at % 1000,
            self.code,
            self.kind.as_str()
        )?;
        if self.from == self.to {
            write!(f, " {}", self.from)
        } else {
            write!(f, " {} -> {}", self.from, self.to)
        }
    }
}

/// Accepted moves per side, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLog {
    records: Vec<MoveRecord>,
}

impl MoveLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn for_side(&self, color: PieceColor) -> impl Iterator<Item = &MoveRecord> {
        self.records.iter().filter(move |r| r.code.color == color)
    }

    /// The most recent `n` moves of one side, oldest first.
    pub fn recent(&self, color: PieceColor, n: usize) -> Vec<&MoveRecord> {
        let mut recent: Vec<&MoveRecord> = self.for_side(color).collect();
        let skip = recent.len().saturating_sub(n);
        recent.drain(..skip);
        recent
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Subscriber for MoveLog {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::GameStarted { .. } => self.records.clear(),
            GameEvent::MoveAccepted {
                at,
                piece,
                code,
                kind,
                from,
                to,
            } => self.records.push(MoveRecord {
                at: *at,
                piece: *piece,
                code: *code,
                kind: *kind,
                from: *from,
                to: *to,
            }),
            _ => {}
        }
    }
}
