//! Post-tick resolution of pieces sharing a cell.
//!
//! Runs once per tick after every piece has advanced and every queued
//! command has been dispatched. Movers are told apart from stationary
//! pieces by [`MotionPhase`](crate::motion::MotionPhase) alone.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::piece::Piece;
use crate::types::{Cell, PieceCode, PieceColor, PieceId};

type Occupants = SmallVec<[usize; 2]>;

/// One piece taken off the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub cell: Cell,
    pub captured: PieceId,
    pub captured_code: PieceCode,
    pub by: PieceId,
    pub by_code: PieceCode,
}

/// What one arbitration pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arbitration {
    pub captures: Vec<Capture>,
    /// Same-side movers sent back to the cell they started from.
    pub reverted: Vec<PieceId>,
}

impl Arbitration {
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty() && self.reverted.is_empty()
    }
}

/// Resolve every shared cell. Captured pieces are removed from `pieces`.
///
/// Reverting a mover can land it on another shared cell, so grouping is
/// repeated until nothing changes. A cell yields at most one capture per
/// call.
pub fn resolve_collisions(pieces: &mut Vec<Piece>, now: u64) -> Arbitration {
    let mut outcome = Arbitration::default();
    let mut contested: BTreeSet<Cell> = BTreeSet::new();

    for _ in 0..=pieces.len() {
        let mut changed = false;
        let mut removed: Vec<usize> = Vec::new();

        for (cell, occupants) in group_by_cell(pieces) {
            if occupants.len() < 2 {
                continue;
            }
            let white = settle_side(pieces, &occupants, PieceColor::White, now, &mut outcome);
            let black = settle_side(pieces, &occupants, PieceColor::Black, now, &mut outcome);
            changed |= white.moved || black.moved;

            let (Some(w), Some(b)) = (white.holder, black.holder) else {
                continue;
            };
            if !contested.insert(cell) {
                continue;
            }
            let (attacker, defender) = attacker_defender(pieces, w, b);
            let (a, d) = (&pieces[attacker], &pieces[defender]);
            tracing::info!(
                cell = %cell,
                attacker = %a.id(),
                defender = %d.id(),
                "{} captures {}",
                a.code(),
                d.code()
            );
            outcome.captures.push(Capture {
                cell,
                captured: d.id(),
                captured_code: d.code(),
                by: a.id(),
                by_code: a.code(),
            });
            removed.push(defender);
            changed = true;
        }

        if !removed.is_empty() {
            let gone: BTreeSet<PieceId> = removed.iter().map(|&i| pieces[i].id()).collect();
            pieces.retain(|p| !gone.contains(&p.id()));
        }
        if !changed {
            break;
        }
    }
    outcome
}

/// Reduce one side's occupants of a cell to a single holder. Movers give
/// way to stationary pieces; otherwise the lowest id keeps the cell.
fn settle_side(
    pieces: &mut [Piece],
    occupants: &Occupants,
    color: PieceColor,
    now: u64,
    outcome: &mut Arbitration,
) -> SideResult {
    let side: Occupants = occupants
        .iter()
        .copied()
        .filter(|&i| pieces[i].color() == color)
        .collect();
    let Some(&first) = side.first() else {
        return SideResult::default();
    };
    if side.len() == 1 {
        return SideResult {
            holder: Some(first),
            moved: false,
        };
    }

    let (movers, stationary): (Occupants, Occupants) =
        side.iter().copied().partition(|&i| pieces[i].is_mover());
    let (keep, revert) = if !movers.is_empty() && !stationary.is_empty() {
        (stationary[0], movers)
    } else {
        (first, side.iter().copied().skip(1).collect())
    };

    let mut moved = false;
    for &i in &revert {
        let piece = &mut pieces[i];
        let before = piece.cell();
        tracing::debug!(piece = %piece.id(), cell = %before, "Blocked by friendly piece, reverting");
        piece.force_idle(now);
        moved |= piece.cell() != before;
        if !outcome.reverted.contains(&piece.id()) {
            outcome.reverted.push(piece.id());
        }
    }
    SideResult {
        holder: Some(keep),
        moved,
    }
}

/// The piece in transit attacks. With both or neither in transit, the
/// most recent action wins, then the lower id.
fn attacker_defender(pieces: &[Piece], a: usize, b: usize) -> (usize, usize) {
    let (pa, pb) = (&pieces[a], &pieces[b]);
    match (pa.is_mover(), pb.is_mover()) {
        (true, false) => (a, b),
        (false, true) => (b, a),
        _ => {
            let a_first = (pa.last_action_time_ms(), std::cmp::Reverse(pa.id()))
                >= (pb.last_action_time_ms(), std::cmp::Reverse(pb.id()));
            if a_first {
                (a, b)
            } else {
                (b, a)
            }
        }
    }
}

#[derive(Debug, Default)]
struct SideResult {
    holder: Option<usize>,
    moved: bool,
}

/// Indices of `pieces` per occupied cell, each list in ascending id order.
fn group_by_cell(pieces: &[Piece]) -> BTreeMap<Cell, Occupants> {
    let mut cells: BTreeMap<Cell, Occupants> = BTreeMap::new();
    for (idx, piece) in pieces.iter().enumerate() {
        cells.entry(piece.cell()).or_default().push(idx);
    }
    for occupants in cells.values_mut() {
        occupants.sort_by_key(|&i| pieces[i].id());
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::config::EngineConfig;
    use crate::graph::{PieceRules, StateGraphBuilder};
    use crate::state::IDLE;
    use crate::types::{BoardDims, PieceKind};

    fn piece(id: u32, kind: PieceKind, color: PieceColor, at: Cell) -> Piece {
        let code = PieceCode::new(kind, color);
        let template = StateGraphBuilder::new(EngineConfig::default())
            .build(&PieceRules::standard(code, BoardDims::default()))
            .unwrap();
        Piece::new(PieceId(id), template, at, 0)
    }

    fn start_move(p: &mut Piece, to: Cell, now: u64) {
        let cmd = Command::move_to(now, p.id(), p.cell(), to);
        assert!(p.dispatch(&cmd, now));
    }

    #[test]
    fn test_no_overlap_no_change() {
        let mut pieces = vec![
            piece(1, PieceKind::Rook, PieceColor::White, Cell::new(0, 0)),
            piece(2, PieceKind::Rook, PieceColor::Black, Cell::new(0, 1)),
        ];
        let out = resolve_collisions(&mut pieces, 0);
        assert!(out.is_empty());
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn test_mover_captures_stationary() {
        let mut pieces = vec![
            piece(1, PieceKind::Rook, PieceColor::White, Cell::new(3, 0)),
            piece(2, PieceKind::Knight, PieceColor::Black, Cell::new(3, 3)),
        ];
        start_move(&mut pieces[0], Cell::new(3, 3), 100);
        pieces[0].advance(100 + 2600);
        assert_eq!(pieces[0].cell(), Cell::new(3, 3));

        let out = resolve_collisions(&mut pieces, 2700);
        assert_eq!(out.captures.len(), 1);
        assert_eq!(out.captures[0].captured, PieceId(2));
        assert_eq!(out.captures[0].by, PieceId(1));
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].id(), PieceId(1));
    }

    #[test]
    fn test_settled_tiebreak_prefers_recent_action() {
        let mut pieces = vec![
            piece(1, PieceKind::Bishop, PieceColor::White, Cell::new(2, 2)),
            piece(2, PieceKind::Bishop, PieceColor::Black, Cell::new(2, 2)),
        ];
        pieces[1].reset(500);
        let out = resolve_collisions(&mut pieces, 600);
        assert_eq!(out.captures[0].by, PieceId(2));
        assert_eq!(pieces[0].id(), PieceId(2));

        let mut tied = vec![
            piece(4, PieceKind::Bishop, PieceColor::White, Cell::new(2, 2)),
            piece(3, PieceKind::Bishop, PieceColor::Black, Cell::new(2, 2)),
        ];
        let out = resolve_collisions(&mut tied, 0);
        assert_eq!(out.captures[0].by, PieceId(3));
    }

    #[test]
    fn test_same_side_mover_reverted() {
        let mut pieces = vec![
            piece(1, PieceKind::Queen, PieceColor::White, Cell::new(2, 2)),
            piece(2, PieceKind::Rook, PieceColor::White, Cell::new(2, 5)),
        ];
        start_move(&mut pieces[1], Cell::new(2, 0), 0);
        pieces[1].advance(3000);
        assert_eq!(pieces[1].cell(), Cell::new(2, 2));

        let out = resolve_collisions(&mut pieces, 3000);
        assert!(out.captures.is_empty());
        assert_eq!(out.reverted, vec![PieceId(2)]);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[1].cell(), Cell::new(2, 5));
        assert_eq!(pieces[1].state_name(), IDLE);
        assert_eq!(pieces[0].cell(), Cell::new(2, 2));
    }

    #[test]
    fn test_same_side_unclassifiable_keeps_lowest_id() {
        let mut pieces = vec![
            piece(5, PieceKind::Knight, PieceColor::Black, Cell::new(4, 4)),
            piece(3, PieceKind::Knight, PieceColor::Black, Cell::new(4, 4)),
        ];
        let out = resolve_collisions(&mut pieces, 0);
        assert_eq!(out.reverted, vec![PieceId(5)]);
        assert!(out.captures.is_empty());
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn test_mixed_crowd_removes_one() {
        let mut pieces = vec![
            piece(1, PieceKind::Rook, PieceColor::White, Cell::new(1, 1)),
            piece(2, PieceKind::Rook, PieceColor::White, Cell::new(1, 1)),
            piece(3, PieceKind::Rook, PieceColor::Black, Cell::new(1, 1)),
        ];
        let out = resolve_collisions(&mut pieces, 0);
        assert_eq!(out.captures.len(), 1);
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn test_resolved_board_is_stable() {
        let mut pieces = vec![
            piece(1, PieceKind::Rook, PieceColor::White, Cell::new(1, 1)),
            piece(2, PieceKind::Rook, PieceColor::Black, Cell::new(1, 1)),
            piece(3, PieceKind::Knight, PieceColor::White, Cell::new(5, 5)),
            piece(4, PieceKind::Knight, PieceColor::White, Cell::new(5, 5)),
        ];
        let first = resolve_collisions(&mut pieces, 0);
        assert_eq!(first.captures.len(), 1);
        assert_eq!(first.reverted, vec![PieceId(4)]);

        let again = resolve_collisions(&mut pieces, 0);
        assert!(again.captures.is_empty());
        assert_eq!(pieces.len(), 3);
    }
}
