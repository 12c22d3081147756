//! Initial piece placement.

use crate::error::LayoutError;
use crate::types::{BoardDims, Cell, PieceCode, PieceColor, PieceKind};

/// Where every piece starts, plus the board size the placement implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLayout {
    dims: BoardDims,
    placements: Vec<(Cell, PieceCode)>,
}

impl BoardLayout {
    /// Parse comma-separated rows of piece codes. An empty field is an empty
    /// cell. Codes may be written kind first (`KW`) or color first (`WK`).
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        let first = rows.first().ok_or(LayoutError::Empty)?;
        let expected = first.split(',').count();

        let mut placements = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != expected {
                return Err(LayoutError::RaggedRow {
                    row,
                    found: fields.len(),
                    expected,
                });
            }
            for (col, field) in fields.iter().enumerate() {
                let text = field.trim();
                if text.is_empty() {
                    continue;
                }
                let code = parse_code(text).ok_or_else(|| LayoutError::InvalidCode {
                    row,
                    col,
                    text: text.to_string(),
                })?;
                placements.push((Cell::new(row as i32, col as i32), code));
            }
        }

        Ok(Self {
            dims: BoardDims::new(rows.len() as i32, expected as i32),
            placements,
        })
    }

    /// The ordinary chess starting position: black on rows 0-1, white on
    /// rows 6-7.
    pub fn standard() -> Self {
        const BACK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut placements = Vec::with_capacity(32);
        for (color, back, pawns) in [(PieceColor::Black, 0, 1), (PieceColor::White, 7, 6)] {
            for (col, kind) in BACK.iter().enumerate() {
                let col = col as i32;
                placements.push((Cell::new(back, col), PieceCode::new(*kind, color)));
                placements.push((Cell::new(pawns, col), PieceCode::new(PieceKind::Pawn, color)));
            }
        }
        placements.sort_by_key(|(cell, _)| *cell);
        Self {
            dims: BoardDims::default(),
            placements,
        }
    }

    pub fn dims(&self) -> BoardDims {
        self.dims
    }

    /// Placements in row-major order.
    pub fn placements(&self) -> &[(Cell, PieceCode)] {
        &self.placements
    }

    pub fn code_at(&self, cell: Cell) -> Option<PieceCode> {
        self.placements
            .iter()
            .find(|(c, _)| *c == cell)
            .map(|(_, code)| *code)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Render back to the CSV form `parse` accepts, kind-first codes.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in 0..self.dims.rows {
            let fields: Vec<String> = (0..self.dims.cols)
                .map(|col| {
                    self.code_at(Cell::new(row, col))
                        .map(|c| c.to_string())
                        .unwrap_or_default()
                })
                .collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Kind-first and color-first spellings never collide: the only letter
/// valid in both positions is `B`, and `BB` means black bishop either way.
fn parse_code(text: &str) -> Option<PieceCode> {
    PieceCode::parse(text).or_else(|| {
        let mut chars = text.chars();
        let color = PieceColor::from_char(chars.next()?)?;
        let kind = PieceKind::from_char(chars.next()?)?;
        chars.next().is_none().then(|| PieceCode::new(kind, color))
    })
}
