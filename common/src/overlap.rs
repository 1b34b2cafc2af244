//! Two-constraint subtraction for the "one mine in a pair" shape.
//!
//! When a constraint `A` has exactly one mine left between two unknown cells
//! and a neighbouring constraint `B` covers that same pair plus more, the
//! pair accounts for exactly one of `B`'s remaining mines. What is left of
//! `B` outside the pair can then be settled:
//!
//! * `B` needs one mine: the rest is safe.
//! * `B` needs `k > 1` mines and has exactly `k - 1` cells outside the pair:
//!   the rest are mines.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::action::ActionRecord;
use crate::board::{CellState, Knowledge, Point};
use crate::constraint::{Tally, tally};

/// Priority given to overlap deductions.
pub const OVERLAP_PRIORITY: u8 = 1;

/// Remembers which `(A, pair)` combinations already produced actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OverlapMemo {
    fired: BTreeSet<(Point, Point, Point)>,
}

impl OverlapMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans the grid row by row for the first pair constraint that settles
    /// something and returns its actions. Empty when nothing applies.
    pub fn deduce(&mut self, board: &Knowledge) -> Vec<ActionRecord> {
        for a in board.points() {
            let Some((u1, u2)) = single_mine_pair(board, a) else {
                continue;
            };
            let key = (a, u1, u2);
            if self.fired.contains(&key) {
                continue;
            }
            let actions = subtract_pair(board, a, [u1, u2]);
            if !actions.is_empty() {
                tracing::debug!(%a, %u1, %u2, count = actions.len(), "overlap deduction");
                self.fired.insert(key);
                return actions;
            }
        }
        Vec::new()
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

/// Mines still unaccounted for around a revealed cell.
fn remaining(board: &Knowledge, at: Point, tally: &Tally) -> Option<i32> {
    match board.get(at) {
        CellState::Revealed(hint) => Some(i32::from(hint) - tally.mines as i32),
        _ => None,
    }
}

fn single_mine_pair(board: &Knowledge, at: Point) -> Option<(Point, Point)> {
    let counted = tally(board, at);
    if remaining(board, at, &counted)? != 1 {
        return None;
    }
    match counted.unknown.as_slice() {
        &[u1, u2] => Some((u1, u2)),
        _ => None,
    }
}

fn subtract_pair(board: &Knowledge, a: Point, pair: [Point; 2]) -> Vec<ActionRecord> {
    let mut actions = Vec::new();

    let others = pair
        .iter()
        .flat_map(|&u| board.neighbors(u))
        .filter(|&b| b != a)
        .unique();

    for b in others {
        let counted = tally(board, b);
        let Some(needed) = remaining(board, b, &counted) else {
            continue;
        };
        if counted.unknown.len() < 3 || !pair.iter().all(|u| counted.unknown.contains(u)) {
            continue;
        }
        let rest: Vec<Point> = counted
            .unknown
            .into_iter()
            .filter(|p| !pair.contains(p))
            .collect();

        if needed == 1 {
            actions.extend(
                rest.into_iter()
                    .map(|p| ActionRecord::reveal(p, OVERLAP_PRIORITY)),
            );
        } else if needed > 1 && rest.len() as i32 == needed - 1 {
            actions.extend(rest.into_iter().map(|p| ActionRecord::flag(p, OVERLAP_PRIORITY)));
        }
    }

    actions
}
