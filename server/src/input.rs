//! Text commands for the headless driver.
//!
//! ```text
//! move 6,4 4,4
//! jump 7,1
//! show
//! quit
//! ```
//!
//! Cells are `row,col`. Pieces are named by the cell they stand on.

use kfchess::{Cell, PieceId};

use crate::session::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Move { from: Cell, to: Cell },
    Jump { at: Cell },
    Show,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Empty input")]
    Empty,
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("`{command}` takes {expected} argument(s)")]
    WrongArity {
        command: &'static str,
        expected: usize,
    },
    #[error("Invalid cell {0:?}, expected `row,col`")]
    BadCell(String),
    #[error("No piece at {0}")]
    NoPieceAt(Cell),
}

impl Input {
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(InputError::Empty)?;
        let args: Vec<&str> = words.collect();
        match command.to_ascii_lowercase().as_str() {
            "move" | "m" => match args.as_slice() {
                [from, to] => Ok(Self::Move {
                    from: parse_cell(from)?,
                    to: parse_cell(to)?,
                }),
                _ => Err(InputError::WrongArity {
                    command: "move",
                    expected: 2,
                }),
            },
            "jump" | "j" => match args.as_slice() {
                [at] => Ok(Self::Jump { at: parse_cell(at)? }),
                _ => Err(InputError::WrongArity {
                    command: "jump",
                    expected: 1,
                }),
            },
            "show" => Ok(Self::Show),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(InputError::UnknownCommand(other.to_string())),
        }
    }

    /// The piece this input acts on, looked up on the current board.
    pub fn resolve(&self, snapshot: &SessionSnapshot) -> Result<Option<PieceId>, InputError> {
        let cell = match *self {
            Self::Move { from, .. } => from,
            Self::Jump { at } => at,
            Self::Show | Self::Quit => return Ok(None),
        };
        snapshot
            .piece_at(cell)
            .map(|view| Some(view.id))
            .ok_or(InputError::NoPieceAt(cell))
    }
}

fn parse_cell(text: &str) -> Result<Cell, InputError> {
    let bad = || InputError::BadCell(text.to_string());
    let (row, col) = text.split_once(',').ok_or_else(bad)?;
    let row = row.trim().parse().map_err(|_| bad())?;
    let col = col.trim().parse().map_err(|_| bad())?;
    Ok(Cell::new(row, col))
}
