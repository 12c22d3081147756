//! Move legality against an occupancy snapshot taken when the command is
//! issued. Conflicts that emerge later are the arbiter's business.

use std::collections::BTreeMap;

use crate::moves::MoveQualifier;
use crate::piece::Piece;
use crate::types::{Cell, PieceColor, PieceId, PieceKind};

/// Who holds a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub id: PieceId,
    pub color: PieceColor,
}

/// Read-only "what piece, if any, occupies this cell" query.
pub trait Occupancy {
    fn occupant(&self, cell: Cell) -> Option<Occupant>;

    fn is_occupied(&self, cell: Cell) -> bool {
        self.occupant(cell).is_some()
    }
}

impl Occupancy for BTreeMap<Cell, Occupant> {
    fn occupant(&self, cell: Cell) -> Option<Occupant> {
        self.get(&cell).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    #[error("Piece {0} is not on the board")]
    UnknownPiece(PieceId),
    #[error("The game is over")]
    GameOver,
    #[error("{to} is not reachable from {from}")]
    OutOfRange { from: Cell, to: Cell },
    #[error("{to} is held by a friendly piece")]
    FriendlyOccupied { to: Cell },
    #[error("Path to {to} is blocked at {at}")]
    PathBlocked { to: Cell, at: Cell },
    #[error("Pawn has already moved and cannot advance two cells")]
    DoubleStepUsed,
    #[error("Pawns capture diagonally only")]
    PawnBlocked { to: Cell },
    #[error("Pawns move diagonally only to capture")]
    PawnNeedsCapture { to: Cell },
    #[error("Move to {to} must capture")]
    CaptureRequired { to: Cell },
    #[error("Move to {to} cannot capture")]
    CaptureForbidden { to: Cell },
}

/// Decide whether `piece` may move from `from` to `to`, naming the first
/// rule the move breaks.
pub fn check_move(
    piece: &Piece,
    from: Cell,
    to: Cell,
    occupancy: &impl Occupancy,
) -> Result<(), IllegalMove> {
    let rule = piece
        .moves()
        .rule_for(from, to)
        .ok_or(IllegalMove::OutOfRange { from, to })?;

    let target = occupancy.occupant(to);
    if matches!(target, Some(occ) if occ.color == piece.color()) {
        return Err(IllegalMove::FriendlyOccupied { to });
    }
    let captures = target.is_some();

    let delta = from.delta_to(to);
    if !piece.kind().leaps() && delta.is_line() {
        let step = delta.unit();
        let mut at = from.offset(step);
        while at != to {
            if occupancy.is_occupied(at) {
                return Err(IllegalMove::PathBlocked { to, at });
            }
            at = at.offset(step);
        }
    }

    if piece.kind() == PieceKind::Pawn {
        let (row_diff, col_diff) = (delta.d_row.abs(), delta.d_col.abs());
        if row_diff == 2 && piece.has_moved() {
            return Err(IllegalMove::DoubleStepUsed);
        }
        if captures && !(row_diff == 1 && col_diff == 1) {
            return Err(IllegalMove::PawnBlocked { to });
        }
        if !captures && col_diff != 0 {
            return Err(IllegalMove::PawnNeedsCapture { to });
        }
    }

    match rule.qualifier {
        MoveQualifier::CaptureOnly if !captures => Err(IllegalMove::CaptureRequired { to }),
        MoveQualifier::NonCaptureOnly if captures => Err(IllegalMove::CaptureForbidden { to }),
        _ => Ok(()),
    }
}

pub fn is_legal(piece: &Piece, from: Cell, to: Cell, occupancy: &impl Occupancy) -> bool {
    check_move(piece, from, to, occupancy).is_ok()
}

/// Every destination `piece` may legally move to from where it stands.
pub fn legal_destinations(piece: &Piece, occupancy: &impl Occupancy) -> Vec<Cell> {
    let from = piece.cell();
    piece
        .moves()
        .candidates(from)
        .into_iter()
        .filter(|&to| is_legal(piece, from, to, occupancy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::config::EngineConfig;
    use crate::graph::{PieceRules, StateGraphBuilder};
    use crate::moves::{MoveRule, MoveTable};
    use crate::types::{BoardDims, PieceCode};

    fn piece(id: u32, kind: PieceKind, color: PieceColor, at: Cell) -> Piece {
        let code = PieceCode::new(kind, color);
        let template = StateGraphBuilder::new(EngineConfig::default())
            .build(&PieceRules::standard(code, BoardDims::default()))
            .unwrap();
        Piece::new(PieceId(id), template, at, 0)
    }

    fn occ(cells: &[(Cell, u32, PieceColor)]) -> BTreeMap<Cell, Occupant> {
        cells
            .iter()
            .map(|&(cell, id, color)| (cell, Occupant { id: PieceId(id), color }))
            .collect()
    }

    #[test]
    fn test_slider_path_blocking() {
        let rook = piece(1, PieceKind::Rook, PieceColor::White, Cell::new(0, 0));
        let empty = occ(&[]);
        assert!(is_legal(&rook, Cell::new(0, 0), Cell::new(0, 5), &empty));

        let blocked = occ(&[(Cell::new(0, 3), 2, PieceColor::Black)]);
        assert_eq!(
            check_move(&rook, Cell::new(0, 0), Cell::new(0, 5), &blocked),
            Err(IllegalMove::PathBlocked {
                to: Cell::new(0, 5),
                at: Cell::new(0, 3)
            })
        );
        // Capturing the blocker itself is fine.
        assert!(is_legal(&rook, Cell::new(0, 0), Cell::new(0, 3), &blocked));
    }

    #[test]
    fn test_knight_leaps_over_pieces() {
        let knight = piece(1, PieceKind::Knight, PieceColor::White, Cell::new(7, 1));
        let crowded = occ(&[
            (Cell::new(6, 1), 2, PieceColor::White),
            (Cell::new(6, 2), 3, PieceColor::White),
            (Cell::new(7, 2), 4, PieceColor::White),
        ]);
        assert!(is_legal(&knight, Cell::new(7, 1), Cell::new(5, 2), &crowded));
    }

    #[test]
    fn test_friendly_target_rejected() {
        let queen = piece(1, PieceKind::Queen, PieceColor::Black, Cell::new(0, 3));
        let board = occ(&[(Cell::new(1, 4), 2, PieceColor::Black)]);
        assert_eq!(
            check_move(&queen, Cell::new(0, 3), Cell::new(1, 4), &board),
            Err(IllegalMove::FriendlyOccupied { to: Cell::new(1, 4) })
        );
    }

    #[test]
    fn test_pawn_rules() {
        let mut pawn = piece(1, PieceKind::Pawn, PieceColor::White, Cell::new(6, 4));
        let empty = occ(&[]);
        let from = Cell::new(6, 4);
        assert!(is_legal(&pawn, from, Cell::new(4, 4), &empty));
        assert!(is_legal(&pawn, from, Cell::new(5, 4), &empty));
        assert_eq!(
            check_move(&pawn, from, Cell::new(5, 5), &empty),
            Err(IllegalMove::PawnNeedsCapture { to: Cell::new(5, 5) })
        );

        let ahead = occ(&[(Cell::new(5, 4), 2, PieceColor::Black)]);
        assert!(!is_legal(&pawn, from, Cell::new(5, 4), &ahead));
        assert!(!is_legal(&pawn, from, Cell::new(4, 4), &ahead));

        let diag = occ(&[(Cell::new(5, 3), 2, PieceColor::Black)]);
        assert!(is_legal(&pawn, from, Cell::new(5, 3), &diag));

        pawn.dispatch(&Command::move_to(0, PieceId(1), from, Cell::new(5, 4)), 0);
        assert!(pawn.has_moved());
        assert_eq!(
            check_move(&pawn, from, Cell::new(4, 4), &empty),
            Err(IllegalMove::DoubleStepUsed)
        );
    }

    #[test]
    fn test_qualifiers_on_non_pawn_tables() {
        let code = PieceCode::new(PieceKind::King, PieceColor::White);
        let table = MoveTable::new(
            vec![
                MoveRule::new(0, 1).with_qualifier(MoveQualifier::CaptureOnly),
                MoveRule::new(1, 0).with_qualifier(MoveQualifier::NonCaptureOnly),
            ],
            BoardDims::default(),
        );
        let template = StateGraphBuilder::default()
            .build(&PieceRules {
                moves: table,
                ..PieceRules::standard(code, BoardDims::default())
            })
            .unwrap();
        let king = Piece::new(PieceId(1), template, Cell::new(3, 3), 0);
        let empty = occ(&[]);
        assert_eq!(
            check_move(&king, Cell::new(3, 3), Cell::new(3, 4), &empty),
            Err(IllegalMove::CaptureRequired { to: Cell::new(3, 4) })
        );
        let below = occ(&[(Cell::new(4, 3), 2, PieceColor::Black)]);
        assert_eq!(
            check_move(&king, Cell::new(3, 3), Cell::new(4, 3), &below),
            Err(IllegalMove::CaptureForbidden { to: Cell::new(4, 3) })
        );
    }

    #[test]
    fn test_pawn_shape_rules_without_qualifiers() {
        let code = PieceCode::new(PieceKind::Pawn, PieceColor::Black);
        let rules = PieceRules::standard(code, BoardDims::default());
        let table = MoveTable::new(
            vec![MoveRule::new(1, 0), MoveRule::new(1, 1), MoveRule::new(1, -1)],
            BoardDims::default(),
        );
        let template = StateGraphBuilder::default()
            .build(&PieceRules { moves: table, ..rules })
            .unwrap();
        let pawn = Piece::new(PieceId(1), template, Cell::new(1, 1), 0);

        let empty = occ(&[]);
        assert_eq!(
            check_move(&pawn, Cell::new(1, 1), Cell::new(2, 2), &empty),
            Err(IllegalMove::PawnNeedsCapture { to: Cell::new(2, 2) })
        );
        let ahead = occ(&[(Cell::new(2, 1), 2, PieceColor::White)]);
        assert_eq!(
            check_move(&pawn, Cell::new(1, 1), Cell::new(2, 1), &ahead),
            Err(IllegalMove::PawnBlocked { to: Cell::new(2, 1) })
        );
    }

    #[test]
    fn test_legal_destinations_from_start() {
        let knight = piece(1, PieceKind::Knight, PieceColor::White, Cell::new(7, 1));
        let board = occ(&[(Cell::new(5, 0), 2, PieceColor::White)]);
        let cells = legal_destinations(&knight, &board);
        assert_eq!(cells.len(), 2);
        assert!(cells.contains(&Cell::new(5, 2)));
        assert!(cells.contains(&Cell::new(6, 3)));
    }
}
