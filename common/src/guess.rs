//! Fallback when no constraint yields a certain move.
//!
//! Every inconclusive constraint drops a local sample `(n - m) / c` on each
//! of its unknown cells. A cell keeps the running mean of all samples it has
//! received. This ignores how overlapping constraints interact, so it is a
//! heuristic ranking rather than a true mine probability.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::action::ActionRecord;
use crate::board::{CellState, Knowledge, Point};

/// Samples are stored in units of 1/840. Every denominator a sample can have
/// (1 to 8 unknown neighbours) divides 840, so samples stay exact integers.
const SAMPLE_SCALE: u32 = 840;

/// Priority of guessed reveals.
pub const GUESS_PRIORITY: u8 = 0;

/// Running mean of the samples seen for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Likelihood {
    total: u32,
    samples: u32,
}

impl Likelihood {
    fn add(&mut self, remaining: i32, unknown: usize) {
        let unknown = unknown.clamp(1, 8) as u32;
        let mines = remaining.clamp(0, unknown as i32) as u32;
        self.total += mines * (SAMPLE_SCALE / unknown);
        self.samples += 1;
    }

    pub fn mean(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        f64::from(self.total) / f64::from(SAMPLE_SCALE * self.samples)
    }

    /// Compares means without going through floating point.
    fn cmp_mean(&self, other: &Likelihood) -> Ordering {
        let lhs = u64::from(self.total) * u64::from(other.samples);
        let rhs = u64::from(other.total) * u64::from(self.samples);
        lhs.cmp(&rhs)
    }
}

/// Mine-likelihood estimates for covered cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Likelihoods {
    cells: BTreeMap<Point, Likelihood>,
}

impl Likelihoods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the sample `remaining / unknown.len()` to every cell in `unknown`.
    pub fn record(&mut self, remaining: i32, unknown: &[Point]) {
        for &p in unknown {
            self.cells.entry(p).or_default().add(remaining, unknown.len());
        }
    }

    /// Drops every cell that is no longer `Unknown`.
    pub fn purge(&mut self, board: &Knowledge) {
        self.cells.retain(|&p, _| board.get(p) == CellState::Unknown);
    }

    pub fn get(&self, at: Point) -> Option<f64> {
        self.cells.get(&at).map(Likelihood::mean)
    }

    /// The cell with the lowest mean; ties go to the smallest coordinate.
    pub fn least_likely(&self) -> Option<(Point, f64)> {
        self.cells
            .iter()
            .min_by(|a, b| a.1.cmp_mean(b.1))
            .map(|(&p, l)| (p, l.mean()))
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.cells.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Picks reveals when nothing certain is left.
///
/// 1. All mines accounted for: every unknown cell is safe.
/// 2. Otherwise the least likely mine among sampled cells.
/// 3. Otherwise the first unknown cell in row-major order. This scan is
///    O(W*H).
pub fn choose(
    board: &Knowledge,
    likelihoods: &mut Likelihoods,
    total_mines: usize,
) -> Vec<ActionRecord> {
    if board.known_mines() >= total_mines {
        tracing::debug!(mines = total_mines, "mine budget exhausted, clearing the rest");
        return board
            .unknown_points()
            .map(|p| ActionRecord::reveal(p, GUESS_PRIORITY))
            .collect();
    }

    likelihoods.purge(board);
    if let Some((at, odds)) = likelihoods.least_likely() {
        tracing::debug!(%at, odds, candidates = likelihoods.len(), "guessing least likely mine");
        return vec![ActionRecord::reveal(at, GUESS_PRIORITY)];
    }

    match board.unknown_points().next() {
        Some(at) => {
            tracing::debug!(%at, "exploring blind");
            vec![ActionRecord::reveal(at, GUESS_PRIORITY)]
        }
        None => Vec::new(),
    }
}
