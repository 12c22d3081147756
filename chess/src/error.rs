//! Error types for rule loading and piece construction.
//!
//! Nothing here is produced during a tick: dropped commands and rejected
//! moves are ordinary flow control, not errors.

use crate::types::{Cell, PieceCode};

/// A single rule-data line that could not be used. Reported as a warning;
/// loading continues with the remaining lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("line {line}: expected `dx,dy[:qualifier]`, got {text:?}")]
    MalformedLine { line: usize, text: String },
    #[error("line {line}: unknown qualifier {qualifier:?}")]
    UnknownQualifier { line: usize, qualifier: String },
    #[error("line {line}: offset {text:?} does not fit on the board")]
    OutOfReach { line: usize, text: String },
}

/// A piece type whose state-machine template cannot be built. Fatal for that
/// type only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("{code}: no usable move data")]
    NoMoveData { code: PieceCode },
    #[error("{code}: state `{state}` is missing and no fallback visuals exist")]
    NoFallbackVisuals { code: PieceCode, state: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    #[error("Unknown piece type: {0}")]
    UnknownPieceType(PieceCode),
    #[error("Cell {0} is outside the board")]
    OutOfBounds(Cell),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Board layout is empty")]
    Empty,
    #[error("Row {row}, column {col}: invalid piece code {text:?}")]
    InvalidCode { row: usize, col: usize, text: String },
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error(transparent)]
    Factory(#[from] FactoryError),
}
