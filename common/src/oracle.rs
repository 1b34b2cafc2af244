//! Exact classification of covered cells with a SAT solver.
//!
//! The agent's own reasoning is deliberately local. The oracle answers the
//! question it cannot: given every revealed number and the total mine count,
//! is this cell a mine in *every*, *no*, or only *some* consistent layout?
//! The bot uses it to audit flags and the tests use it as ground truth.
//!
//! Flags are not trusted here. Only revealed numbers, detonations and the
//! global mine count constrain the layout.

use std::collections::BTreeMap;

use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::board::{CellState, Knowledge, Point};

/// Constraints over at most this many cells are encoded clause by clause;
/// larger ones use a sequential counter. Covers every neighbourhood.
const NAIVE_LIMIT: usize = 8;

/// The possible outcomes of the oracle's analysis for a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    ForcedMine,   // All valid solutions require this cell to be a mine.
    ForcedSafe,   // All valid solutions require this cell to be safe.
    Undetermined, // Valid solutions exist for this cell being either a mine or safe.
}

pub struct Oracle {
    solver: Solver<'static>,
    vars: BTreeMap<Point, Var>,
}

impl Oracle {
    /// Encodes `board` as CNF. Fails if no layout with `total_mines` mines
    /// agrees with what has been revealed.
    pub fn new(board: &Knowledge, total_mines: usize) -> anyhow::Result<Self> {
        let mut formula = CnfFormula::new();
        let mut vars = BTreeMap::new();

        // 1. One variable per cell that is not known to be safe.
        for at in board.points() {
            if !matches!(board.get(at), CellState::Revealed(_)) {
                vars.insert(at, formula.new_var());
            }
        }

        // 2. Each number pins the mines among its covered neighbours.
        for at in board.points() {
            match board.get(at) {
                CellState::Revealed(hint) => {
                    let lits: Vec<Lit> = board
                        .neighbors(at)
                        .filter_map(|p| vars.get(&p).map(|&v| Lit::from_var(v, true)))
                        .collect();
                    exactly(&mut formula, &lits, usize::from(hint));
                }
                CellState::Hit => {
                    formula.add_clause(&[Lit::from_var(vars[&at], true)]);
                }
                _ => {}
            }
        }

        // 3. The global mine count.
        let all: Vec<Lit> = vars.values().map(|&v| Lit::from_var(v, true)).collect();
        exactly(&mut formula, &all, total_mines);

        let mut solver = Solver::new();
        solver.add_formula(&formula);
        if !solver.solve()? {
            anyhow::bail!("solve_fail: no mine layout matches the revealed numbers");
        }

        Ok(Oracle { solver, vars })
    }

    /// Whether `at` is a mine in every, no, or some consistent layout.
    pub fn classify(&mut self, at: Point) -> anyhow::Result<DeducedState> {
        let Some(&var) = self.vars.get(&at) else {
            return Ok(DeducedState::ForcedSafe);
        };
        let mine = Lit::from_var(var, true);

        let mine_possible = self.satisfiable_with(mine)?;
        let safe_possible = self.satisfiable_with(!mine)?;

        Ok(match (mine_possible, safe_possible) {
            (true, true) => DeducedState::Undetermined,
            (true, false) => DeducedState::ForcedMine,
            (false, true) => DeducedState::ForcedSafe,
            (false, false) => anyhow::bail!("state_collision at {}", at),
        })
    }

    /// One concrete layout consistent with everything known, as the set of
    /// mine positions.
    pub fn sample_layout(&mut self) -> anyhow::Result<Vec<Point>> {
        self.solver.assume(&[]);
        if !self.solver.solve()? {
            anyhow::bail!("solve_fail");
        }
        let model = self
            .solver
            .model()
            .ok_or(anyhow::anyhow!("solver_model_fail"))?;

        Ok(self
            .vars
            .iter()
            .filter(|&(_, &var)| model.contains(&Lit::from_var(var, true)))
            .map(|(&at, _)| at)
            .collect())
    }

    fn satisfiable_with(&mut self, lit: Lit) -> anyhow::Result<bool> {
        self.solver.assume(&[lit]);
        let result = self.solver.solve();
        self.solver.assume(&[]);
        Ok(result?)
    }
}

/// Exactly `k` of `lits` are true.
fn exactly(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    if k > lits.len() {
        formula.add_clause(&[]);
        return;
    }
    at_most(formula, lits, k);
    // At least k true is at most n - k false.
    let negated: Vec<Lit> = lits.iter().map(|&lit| !lit).collect();
    at_most(formula, &negated, lits.len() - k);
}

/// At most `k` of `lits` are true.
fn at_most(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    if k >= lits.len() {
        return;
    }
    if k == 0 {
        for &lit in lits {
            formula.add_clause(&[!lit]);
        }
        return;
    }
    if lits.len() <= NAIVE_LIMIT {
        // Every (k + 1)-subset has a false member.
        for subset in lits.iter().combinations(k + 1) {
            let clause: Vec<Lit> = subset.into_iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
        return;
    }
    sequential_counter(formula, lits, k);
}

/// Sinz's sequential counter. `counts[i][j]` holds when at least `j + 1` of
/// `lits[..=i]` are true; overflowing `k` is forbidden. Requires
/// `1 <= k < lits.len()`.
fn sequential_counter(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    let n = lits.len();
    let mut counts: Vec<Vec<Lit>> = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let mut row = Vec::with_capacity(k);
        for _ in 0..k {
            row.push(Lit::from_var(formula.new_var(), true));
        }
        counts.push(row);
    }

    formula.add_clause(&[!lits[0], counts[0][0]]);
    for j in 1..k {
        formula.add_clause(&[!counts[0][j]]);
    }

    for i in 1..n - 1 {
        let (prev, cur) = (&counts[i - 1], &counts[i]);
        formula.add_clause(&[!lits[i], cur[0]]);
        formula.add_clause(&[!prev[0], cur[0]]);
        for j in 1..k {
            formula.add_clause(&[!lits[i], !prev[j - 1], cur[j]]);
            formula.add_clause(&[!prev[j], cur[j]]);
        }
        formula.add_clause(&[!lits[i], !prev[k - 1]]);
    }

    formula.add_clause(&[!lits[n - 1], !counts[n - 2][k - 1]]);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts models of `exactly(k)` over `n` fresh variables by blocking
    /// each model found.
    fn count_models(n: usize, k: usize) -> usize {
        let mut formula = CnfFormula::new();
        let lits: Vec<Lit> = (0..n)
            .map(|_| Lit::from_var(formula.new_var(), true))
            .collect();
        exactly(&mut formula, &lits, k);

        let mut solver = Solver::new();
        solver.add_formula(&formula);
        let mut models = 0;
        while solver.solve().unwrap() {
            let model = solver.model().unwrap();
            let blocking: Vec<Lit> = lits
                .iter()
                .map(|&lit| if model.contains(&lit) { !lit } else { lit })
                .collect();
            solver.add_clause(&blocking);
            models += 1;
        }
        models
    }

    #[test]
    fn test_cardinality_encodings_count_subsets() {
        // Naive encoding.
        assert_eq!(count_models(5, 2), 10);
        assert_eq!(count_models(4, 0), 1);
        assert_eq!(count_models(3, 3), 1);
        // Sequential counter.
        assert_eq!(count_models(10, 2), 45);
        assert_eq!(count_models(9, 8), 9);
        assert_eq!(count_models(2, 3), 0);
    }

    #[test]
    fn test_single_covered_neighbor_is_forced() {
        // 3x3, mine at (2,2), everything but the corner revealed.
        let mut board = Knowledge::new(3, 3);
        for at in board.points() {
            if at == Point::new(2, 2) {
                continue;
            }
            let hint = u8::from(at.col >= 1 && at.row >= 1);
            board.set_revealed(at, hint);
        }

        let mut oracle = Oracle::new(&board, 1).unwrap();
        assert_eq!(oracle.classify(Point::new(2, 2)).unwrap(), DeducedState::ForcedMine);
        assert_eq!(oracle.classify(Point::new(0, 0)).unwrap(), DeducedState::ForcedSafe);
        assert_eq!(oracle.sample_layout().unwrap(), vec![Point::new(2, 2)]);
    }

    #[test]
    fn test_symmetric_pair_is_undetermined() {
        let mut board = Knowledge::new(2, 2);
        board.set_revealed(Point::new(0, 1), 1);
        board.set_revealed(Point::new(1, 1), 1);

        let mut oracle = Oracle::new(&board, 1).unwrap();
        assert_eq!(oracle.classify(Point::new(0, 0)).unwrap(), DeducedState::Undetermined);
        assert_eq!(oracle.classify(Point::new(1, 0)).unwrap(), DeducedState::Undetermined);
        assert_eq!(oracle.sample_layout().unwrap().len(), 1);
    }

    #[test]
    fn test_global_count_settles_far_cells() {
        // One mine, already pinned next to the 1: the far column is safe.
        let mut board = Knowledge::new(3, 1);
        board.set_revealed(Point::new(0, 0), 1);

        let mut oracle = Oracle::new(&board, 1).unwrap();
        assert_eq!(oracle.classify(Point::new(1, 0)).unwrap(), DeducedState::ForcedMine);
        assert_eq!(oracle.classify(Point::new(2, 0)).unwrap(), DeducedState::ForcedSafe);
    }

    #[test]
    fn test_flags_are_not_trusted_but_hits_are() {
        let mut board = Knowledge::new(3, 1);
        board.set_revealed(Point::new(1, 0), 1);
        board.set_flagged(Point::new(0, 0));

        let mut oracle = Oracle::new(&board, 1).unwrap();
        assert_eq!(oracle.classify(Point::new(0, 0)).unwrap(), DeducedState::Undetermined);

        board.set_hit(Point::new(2, 0));
        let mut oracle = Oracle::new(&board, 1).unwrap();
        assert_eq!(oracle.classify(Point::new(0, 0)).unwrap(), DeducedState::ForcedSafe);
    }

    #[test]
    fn test_inconsistent_knowledge_is_an_error() {
        let mut board = Knowledge::new(2, 1);
        board.set_revealed(Point::new(0, 0), 1);
        board.set_revealed(Point::new(1, 0), 0);

        assert!(Oracle::new(&board, 1).is_err());
    }
}
