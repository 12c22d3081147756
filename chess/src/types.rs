//! Canonical piece, color and board-coordinate types for the project.

use serde::{Deserialize, Serialize};

/// Piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// Side a piece plays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceColor {
    White,
    Black,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        Self::Pawn,
        Self::Knight,
        Self::Bishop,
        Self::Rook,
        Self::Queen,
        Self::King,
    ];

    pub fn to_char_upper(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }

    /// Knights leap; nothing between origin and destination matters.
    pub fn leaps(self) -> bool {
        matches!(self, Self::Knight)
    }

    /// Conventional material value, used for scoring captures.
    pub fn value(self) -> u32 {
        match self {
            Self::Pawn => 1,
            Self::Knight | Self::Bishop => 3,
            Self::Rook => 5,
            Self::Queen => 9,
            Self::King => 0,
        }
    }
}

impl PieceColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::White => 'W',
            Self::Black => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'W' => Some(Self::White),
            'B' => Some(Self::Black),
            _ => None,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

/// A piece type as it appears in rule data: kind plus side, written as a
/// two-letter code such as `PW` (white pawn) or `KB` (black king).
///
/// Move tables are per code rather than per kind because pawns advance in
/// opposite directions for the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceCode {
    pub kind: PieceKind,
    pub color: PieceColor,
}

impl PieceCode {
    pub fn new(kind: PieceKind, color: PieceColor) -> Self {
        Self { kind, color }
    }

    /// Parse a two-letter code, kind first (`"QW"`).
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.trim().chars();
        let kind = PieceKind::from_char(chars.next()?)?;
        let color = PieceColor::from_char(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self { kind, color })
    }

    /// Every code of a standard set, white first.
    pub fn all() -> impl Iterator<Item = PieceCode> {
        [PieceColor::White, PieceColor::Black]
            .into_iter()
            .flat_map(|color| PieceKind::ALL.into_iter().map(move |kind| Self { kind, color }))
    }
}

/// A board cell, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, by: Offset) -> Cell {
        Cell::new(self.row.saturating_add(by.d_row), self.col.saturating_add(by.d_col))
    }

    /// Offset that takes `self` to `to`.
    pub fn delta_to(self, to: Cell) -> Offset {
        Offset::new(to.row - self.row, to.col - self.col)
    }
}

/// Relative displacement between two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Offset {
    pub d_row: i32,
    pub d_col: i32,
}

impl Offset {
    pub const fn new(d_row: i32, d_col: i32) -> Self {
        Self { d_row, d_col }
    }

    /// Number of king steps needed to cover the offset.
    pub fn chebyshev(self) -> i32 {
        self.d_row.saturating_abs().max(self.d_col.saturating_abs())
    }

    /// True for non-zero straight or diagonal displacements.
    pub fn is_line(self) -> bool {
        let (r, c) = (self.d_row.saturating_abs(), self.d_col.saturating_abs());
        (r, c) != (0, 0) && (r == 0 || c == 0 || r == c)
    }

    /// One step in the direction of a line offset.
    pub fn unit(self) -> Offset {
        Offset::new(self.d_row.signum(), self.d_col.signum())
    }

    pub fn scaled(self, n: i32) -> Offset {
        Offset::new(self.d_row.saturating_mul(n), self.d_col.saturating_mul(n))
    }
}

/// Board size in cells (H×W).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardDims {
    pub rows: i32,
    pub cols: i32,
}

impl BoardDims {
    pub const fn new(rows: i32, cols: i32) -> Self {
        Self { rows, cols }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.rows).contains(&cell.row) && (0..self.cols).contains(&cell.col)
    }
}

impl Default for BoardDims {
    fn default() -> Self {
        Self::new(8, 8)
    }
}

/// Identifier of a live piece. Ids are handed out in creation order, which
/// also makes them the deterministic tiebreak wherever ordering matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u32);

impl std::fmt::Display for PieceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char_upper())
    }
}

impl std::fmt::Display for PieceColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for PieceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind.to_char_upper(), self.color.to_char())
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
