//! Single-constraint deduction.
//!
//! A revealed `n` says exactly `n` of its neighbours are mines. Constraints
//! are never stored; they are re-read from the [`Knowledge`] every time they
//! are evaluated, so an evaluation always sees the current grid.

use crate::action::ActionRecord;
use crate::board::{CellState, Knowledge, Point};

/// A revealed cell's neighbourhood split into what is known and what is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Flagged, queued-for-flag or detonated neighbours.
    pub mines: usize,
    /// Neighbours nobody has scheduled yet.
    pub unknown: Vec<Point>,
}

pub fn tally(board: &Knowledge, at: Point) -> Tally {
    let mut mines = 0;
    let mut unknown = Vec::new();
    for neighbor in board.neighbors(at) {
        match board.get(neighbor) {
            CellState::Unknown => unknown.push(neighbor),
            state if state.is_known_mine() => mines += 1,
            _ => {}
        }
    }
    Tally { mines, unknown }
}

/// Outcome of evaluating one constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Deduction {
    /// Nothing left to decide around this cell (or it is not a number).
    Settled,
    /// Every listed action is certain.
    Certain(Vec<ActionRecord>),
    /// Mines remain among the unknown neighbours but none is pinned down.
    Unresolved { remaining: i32, unknown: Vec<Point> },
}

/// Evaluates the constraint of the revealed cell at `at`.
pub fn deduce(board: &Knowledge, at: Point) -> Deduction {
    let CellState::Revealed(hint) = board.get(at) else {
        return Deduction::Settled;
    };
    let Tally { mines, unknown } = tally(board, at);
    if unknown.is_empty() {
        return Deduction::Settled;
    }

    let hint = usize::from(hint);
    if hint == 0 {
        let reveals = unknown.into_iter().map(|p| ActionRecord::reveal(p, 0));
        return Deduction::Certain(reveals.collect());
    }

    let priority = u8::try_from(hint).unwrap_or(u8::MAX);
    if unknown.len() + mines == hint {
        let flags = unknown.into_iter().map(|p| ActionRecord::flag(p, priority));
        Deduction::Certain(flags.collect())
    } else if mines == hint {
        let reveals = unknown
            .into_iter()
            .map(|p| ActionRecord::reveal(p, priority));
        Deduction::Certain(reveals.collect())
    } else {
        Deduction::Unresolved {
            remaining: hint as i32 - mines as i32,
            unknown,
        }
    }
}

/// Revealed neighbours of a detonated cell. Their constraints now see one
/// more known mine and are worth another look.
pub fn detonation_dependents(board: &Knowledge, at: Point) -> Vec<(u8, Point)> {
    board
        .neighbors(at)
        .filter_map(|p| match board.get(p) {
            CellState::Revealed(n) => Some((n, p)),
            _ => None,
        })
        .collect()
}
