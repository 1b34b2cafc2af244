//! The agent's knowledge of the grid.
//!
//! Every coordinate in the crate is a [`Point`] in `(col, row)` order and all
//! storage goes through one private index accessor, so there is exactly one
//! place where the grid layout is decided.

use std::fmt;

use crate::action::Verb;

/// A cell position on the grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Point {
    pub col: usize,
    pub row: usize,
}

impl Point {
    pub const fn new(col: usize, row: usize) -> Self {
        Point { col, row }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// The up-to-8 neighbours of `at` inside a `width` x `height` grid, row by
/// row. There is no wraparound.
pub fn neighbors(width: usize, height: usize, at: Point) -> impl Iterator<Item = Point> {
    let (width, height) = (width as isize, height as isize);
    (-1isize..=1).flat_map(move |dr| {
        (-1isize..=1).filter_map(move |dc| {
            if dc == 0 && dr == 0 {
                return None;
            }
            let col = at.col as isize + dc;
            let row = at.row as isize + dr;
            (col >= 0 && col < width && row >= 0 && row < height)
                .then(|| Point::new(col as usize, row as usize))
        })
    })
}

/// What the agent believes about one cell.
///
/// Cells only move forward: `Unknown -> Pending -> {Flagged, Revealed, Hit}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CellState {
    Unknown,
    /// Scheduled for the given verb, outcome not observed yet.
    Pending(Verb),
    Flagged,
    Revealed(u8),
    /// Revealed, and it was a mine.
    Hit,
}

impl CellState {
    /// Flagged, revealed or detonated.
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            CellState::Flagged | CellState::Revealed(_) | CellState::Hit
        )
    }

    /// Cells a constraint may count as mines: flags (placed or queued) and
    /// detonations.
    pub fn is_known_mine(self) -> bool {
        matches!(
            self,
            CellState::Flagged | CellState::Hit | CellState::Pending(Verb::Flag)
        )
    }
}

/// Grid Knowledge Store: the single source of truth for the agent's view.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Knowledge {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
    revealed: usize,
    mines: usize,
}

impl Knowledge {
    pub fn new(width: usize, height: usize) -> Self {
        Knowledge {
            width,
            height,
            cells: vec![CellState::Unknown; width * height],
            revealed: 0,
            mines: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    fn index(&self, at: Point) -> usize {
        at.row * self.width + at.col
    }

    pub fn is_in_bounds(&self, col: isize, row: isize) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.width && (row as usize) < self.height
    }

    pub fn get(&self, at: Point) -> CellState {
        self.cells[self.index(at)]
    }

    /// Number of cells revealed without detonating.
    pub fn revealed_safe(&self) -> usize {
        self.revealed
    }

    /// Number of resolved mines (flags placed plus detonations).
    pub fn known_mines(&self) -> usize {
        self.mines
    }

    /// Schedules `at` for `verb`. Only `Unknown` cells can be scheduled; for
    /// anything else this is a no-op and returns `false`.
    pub fn mark_pending(&mut self, at: Point, verb: Verb) -> bool {
        let idx = self.index(at);
        if self.cells[idx] != CellState::Unknown {
            return false;
        }
        self.cells[idx] = CellState::Pending(verb);
        true
    }

    /// Records an observed adjacency count.
    pub fn set_revealed(&mut self, at: Point, count: u8) -> bool {
        self.resolve(at, CellState::Revealed(count))
    }

    pub fn set_hit(&mut self, at: Point) -> bool {
        self.resolve(at, CellState::Hit)
    }

    pub fn set_flagged(&mut self, at: Point) -> bool {
        self.resolve(at, CellState::Flagged)
    }

    fn resolve(&mut self, at: Point, state: CellState) -> bool {
        let idx = self.index(at);
        if self.cells[idx].is_resolved() {
            return false;
        }
        self.cells[idx] = state;
        match state {
            CellState::Revealed(_) => self.revealed += 1,
            CellState::Flagged | CellState::Hit => self.mines += 1,
            CellState::Unknown | CellState::Pending(_) => {}
        }
        true
    }

    /// The up-to-8 in-bounds neighbours of `at`, row by row.
    pub fn neighbors(&self, at: Point) -> impl Iterator<Item = Point> + use<> {
        neighbors(self.width, self.height, at)
    }

    /// Every cell in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let width = self.width;
        (0..self.area()).map(move |i| Point::new(i % width, i / width))
    }

    /// Every cell still `Unknown`, in row-major order. O(W*H).
    pub fn unknown_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points().filter(move |&p| self.get(p) == CellState::Unknown)
    }
}

impl fmt::Display for Knowledge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..self.width {
            write!(f, "{:^3}", col)?;
        }
        writeln!(f)?;
        writeln!(f, "  +{}", "---".repeat(self.width))?;

        for row in 0..self.height {
            write!(f, "{:^2}|", row)?;
            for col in 0..self.width {
                let glyph = match self.get(Point::new(col, row)) {
                    CellState::Unknown => " ■ ".to_string(),
                    CellState::Pending(_) => " ? ".to_string(),
                    CellState::Flagged => " F ".to_string(),
                    CellState::Hit => " * ".to_string(),
                    CellState::Revealed(0) => " . ".to_string(),
                    CellState::Revealed(n) => format!(" {} ", n),
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_are_clipped_to_the_grid() {
        let board = Knowledge::new(3, 3);

        assert_eq!(board.neighbors(Point::new(0, 0)).count(), 3);
        assert_eq!(board.neighbors(Point::new(1, 0)).count(), 5);
        assert_eq!(board.neighbors(Point::new(1, 1)).count(), 8);

        let wide = Knowledge::new(5, 1);
        let around: Vec<Point> = wide.neighbors(Point::new(2, 0)).collect();
        assert_eq!(around, vec![Point::new(1, 0), Point::new(3, 0)]);
    }

    #[test]
    fn test_columns_and_rows_are_not_transposed() {
        let mut board = Knowledge::new(4, 2);
        board.set_revealed(Point::new(3, 1), 2);

        assert_eq!(board.get(Point::new(3, 1)), CellState::Revealed(2));
        assert!(board.is_in_bounds(3, 1));
        assert!(!board.is_in_bounds(1, 3));
        assert!(!board.is_in_bounds(-1, 0));
        assert_eq!(board.points().last(), Some(Point::new(3, 1)));
    }

    #[test]
    fn test_states_never_regress() {
        let mut board = Knowledge::new(2, 2);
        let p = Point::new(1, 0);

        assert!(board.mark_pending(p, Verb::Reveal));
        assert!(!board.mark_pending(p, Verb::Flag));
        assert!(board.set_revealed(p, 1));
        assert!(!board.set_flagged(p));
        assert!(!board.set_hit(p));
        assert!(!board.mark_pending(p, Verb::Reveal));
        assert_eq!(board.get(p), CellState::Revealed(1));
        assert_eq!(board.revealed_safe(), 1);
        assert_eq!(board.known_mines(), 0);
    }

    #[test]
    fn test_counters_track_resolutions() {
        let mut board = Knowledge::new(3, 1);
        board.set_flagged(Point::new(0, 0));
        board.set_hit(Point::new(1, 0));
        board.set_revealed(Point::new(2, 0), 2);

        assert_eq!(board.known_mines(), 2);
        assert_eq!(board.revealed_safe(), 1);
        assert_eq!(board.unknown_points().count(), 0);
    }

    #[test]
    fn test_display_marks_each_state() {
        let mut board = Knowledge::new(3, 1);
        board.set_revealed(Point::new(0, 0), 0);
        board.set_flagged(Point::new(1, 0));
        let text = board.to_string();
        assert!(text.contains(" .  F  ■ "));
    }
}
