//! Per-piece-type movement tables.
//!
//! A [`MoveTable`] is a pure function of a cell: it lists the in-bounds cells
//! reachable by the table's relative offsets and knows nothing about
//! occupancy. Tables are loaded once per piece type and shared by reference
//! between every state and every instance of that type.

use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::types::{BoardDims, Cell, Offset, PieceCode, PieceColor, PieceKind};

/// Restriction attached to a single offset in rule data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveQualifier {
    #[default]
    Any,
    /// Only onto a cell held by the opponent.
    CaptureOnly,
    /// Only onto an empty cell.
    NonCaptureOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRule {
    pub offset: Offset,
    pub qualifier: MoveQualifier,
}

impl MoveRule {
    pub fn new(d_row: i32, d_col: i32) -> Self {
        Self {
            offset: Offset::new(d_row, d_col),
            qualifier: MoveQualifier::Any,
        }
    }

    pub fn with_qualifier(mut self, qualifier: MoveQualifier) -> Self {
        self.qualifier = qualifier;
        self
    }
}

/// Ordered relative offsets plus the board bounds they are clipped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTable {
    rules: Vec<MoveRule>,
    dims: BoardDims,
}

impl MoveTable {
    pub fn new(rules: Vec<MoveRule>, dims: BoardDims) -> Self {
        Self { rules, dims }
    }

    /// Parse rule text, one `dx,dy[:qualifier]` per line. The first number
    /// is the column delta, the second the row delta. Malformed lines and
    /// offsets that cannot fit on the board are skipped with a warning.
    pub fn parse(text: &str, dims: BoardDims) -> Self {
        let mut rules = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let parsed = parse_rule_line(idx + 1, line)
                .and_then(|rule| check_reach(idx + 1, line, rule, dims));
            match parsed {
                Ok(Some(rule)) => rules.push(rule),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping move rule: {}", e),
            }
        }
        Self { rules, dims }
    }

    /// Ordinary chess movement for a piece code. Pawns advance toward the
    /// opponent: white toward row 0, black toward the last row.
    pub fn standard(code: PieceCode, dims: BoardDims) -> Self {
        let reach = dims.rows.max(dims.cols) - 1;
        let rules = match code.kind {
            PieceKind::Pawn => {
                let fwd = match code.color {
                    PieceColor::White => -1,
                    PieceColor::Black => 1,
                };
                vec![
                    MoveRule::new(fwd, 0).with_qualifier(MoveQualifier::NonCaptureOnly),
                    MoveRule::new(2 * fwd, 0).with_qualifier(MoveQualifier::NonCaptureOnly),
                    MoveRule::new(fwd, -1).with_qualifier(MoveQualifier::CaptureOnly),
                    MoveRule::new(fwd, 1).with_qualifier(MoveQualifier::CaptureOnly),
                ]
            }
            PieceKind::Knight => KNIGHT_STEPS
                .iter()
                .map(|&(r, c)| MoveRule::new(r, c))
                .collect(),
            PieceKind::Bishop => rays(&DIAGONALS, reach),
            PieceKind::Rook => rays(&ORTHOGONALS, reach),
            PieceKind::Queen => {
                let mut rules = rays(&ORTHOGONALS, reach);
                rules.extend(rays(&DIAGONALS, reach));
                rules
            }
            PieceKind::King => ORTHOGONALS
                .iter()
                .chain(DIAGONALS.iter())
                .map(|&(r, c)| MoveRule::new(r, c))
                .collect(),
        };
        Self { rules, dims }
    }

    /// In-bounds destinations from `from`, in table order, without duplicates.
    pub fn candidates(&self, from: Cell) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let to = from.offset(rule.offset);
            if self.dims.contains(to) && !cells.contains(&to) {
                cells.push(to);
            }
        }
        cells
    }

    /// The first rule that takes `from` to `to`, if the destination is in bounds.
    pub fn rule_for(&self, from: Cell, to: Cell) -> Option<&MoveRule> {
        if !self.dims.contains(to) {
            return None;
        }
        let delta = from.delta_to(to);
        self.rules.iter().find(|rule| rule.offset == delta)
    }

    pub fn rules(&self) -> &[MoveRule] {
        &self.rules
    }

    pub fn dims(&self) -> BoardDims {
        self.dims
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

const ORTHOGONALS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONALS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT_STEPS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

fn rays(directions: &[(i32, i32)], reach: i32) -> Vec<MoveRule> {
    directions
        .iter()
        .flat_map(|&(r, c)| (1..=reach).map(move |n| MoveRule::new(r * n, c * n)))
        .collect()
}

/// Reject an offset at least as long as the board in either direction.
fn check_reach(
    line_no: usize,
    line: &str,
    rule: Option<MoveRule>,
    dims: BoardDims,
) -> Result<Option<MoveRule>, RuleError> {
    match rule {
        Some(r)
            if r.offset.d_row.unsigned_abs() >= dims.rows.unsigned_abs()
                || r.offset.d_col.unsigned_abs() >= dims.cols.unsigned_abs() =>
        {
            Err(RuleError::OutOfReach {
                line: line_no,
                text: line.trim().to_string(),
            })
        }
        other => Ok(other),
    }
}

/// Parse one line of rule text. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_rule_line(line_no: usize, line: &str) -> Result<Option<MoveRule>, RuleError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (coords, qualifier) = match line.split_once(':') {
        Some((coords, q)) => (coords.trim(), Some(q.trim())),
        None => (line, None),
    };

    let malformed = || RuleError::MalformedLine {
        line: line_no,
        text: line.to_string(),
    };
    let (dx, dy) = coords.split_once(',').ok_or_else(malformed)?;
    let d_col: i32 = dx.trim().parse().map_err(|_| malformed())?;
    let d_row: i32 = dy.trim().parse().map_err(|_| malformed())?;

    let qualifier = match qualifier {
        None | Some("") => MoveQualifier::Any,
        Some("capture") => MoveQualifier::CaptureOnly,
        Some("non_capture") | Some("non-capture") => MoveQualifier::NonCaptureOnly,
        Some(other) => {
            return Err(RuleError::UnknownQualifier {
                line: line_no,
                qualifier: other.to_string(),
            })
        }
    };

    Ok(Some(MoveRule::new(d_row, d_col).with_qualifier(qualifier)))
}
