//! The two queues that sequence the agent's work.
//!
//! [`ActionQueue`] holds certain actions waiting to be emitted, most urgent
//! first. [`DeferredSet`] holds constraints that were inconclusive when last
//! evaluated and are worth another look once the grid has changed.

use std::collections::BTreeSet;

use crate::action::ActionRecord;
use crate::board::{Knowledge, Point};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActionQueue {
    records: BTreeSet<ActionRecord>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `record` and marks its target pending. Targets that are already
    /// scheduled or resolved are skipped, so a cell is queued at most once per
    /// game. Returns whether the record was queued.
    pub fn push(&mut self, board: &mut Knowledge, record: ActionRecord) -> bool {
        if !board.mark_pending(record.at, record.verb) {
            return false;
        }
        self.records.insert(record)
    }

    /// Queues every record, returning how many were accepted.
    pub fn extend(
        &mut self,
        board: &mut Knowledge,
        records: impl IntoIterator<Item = ActionRecord>,
    ) -> usize {
        records
            .into_iter()
            .filter(|&record| self.push(board, record))
            .count()
    }

    /// Takes the lowest-priority-value record.
    pub fn pop(&mut self) -> Option<ActionRecord> {
        self.records.pop_first()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter()
    }
}

/// Inconclusive constraints keyed by `(hint, cell)`, smallest hint first.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeferredSet {
    entries: BTreeSet<(u8, Point)>,
}

impl DeferredSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, hint: u8, at: Point) {
        self.entries.insert((hint, at));
    }

    /// Empties the set and returns its entries in order. A re-evaluation pass
    /// works on this snapshot and hands back whatever is still open through
    /// [`DeferredSet::restore`], so the set is never mutated mid-iteration.
    pub fn snapshot(&mut self) -> Vec<(u8, Point)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }

    pub fn restore(&mut self, entries: impl IntoIterator<Item = (u8, Point)>) {
        self.entries.extend(entries);
    }

    pub fn contains(&self, at: Point) -> bool {
        self.entries.iter().any(|&(_, p)| p == at)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Verb;
    use crate::board::CellState;

    #[test]
    fn test_push_marks_pending_and_rejects_duplicates() {
        let mut board = Knowledge::new(3, 3);
        let mut queue = ActionQueue::new();
        let p = Point::new(2, 1);

        assert!(queue.push(&mut board, ActionRecord::reveal(p, 3)));
        assert_eq!(board.get(p), CellState::Pending(Verb::Reveal));
        assert!(!queue.push(&mut board, ActionRecord::reveal(p, 0)));
        assert!(!queue.push(&mut board, ActionRecord::flag(p, 1)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_resolved_cells_are_never_queued() {
        let mut board = Knowledge::new(2, 1);
        board.set_flagged(Point::new(0, 0));
        board.set_revealed(Point::new(1, 0), 1);
        let mut queue = ActionQueue::new();

        let accepted = queue.extend(
            &mut board,
            [
                ActionRecord::reveal(Point::new(0, 0), 0),
                ActionRecord::flag(Point::new(1, 0), 0),
            ],
        );
        assert_eq!(accepted, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_order_is_priority_then_coordinate() {
        let mut board = Knowledge::new(3, 3);
        let mut queue = ActionQueue::new();
        queue.extend(
            &mut board,
            [
                ActionRecord::flag(Point::new(0, 0), 2),
                ActionRecord::reveal(Point::new(2, 2), 0),
                ActionRecord::reveal(Point::new(1, 2), 0),
            ],
        );

        let popped: Vec<Point> = std::iter::from_fn(|| queue.pop()).map(|r| r.at).collect();
        assert_eq!(
            popped,
            vec![Point::new(1, 2), Point::new(2, 2), Point::new(0, 0)]
        );
    }

    #[test]
    fn test_snapshot_drains_and_restore_merges() {
        let mut deferred = DeferredSet::new();
        deferred.defer(2, Point::new(0, 0));
        deferred.defer(1, Point::new(4, 4));
        deferred.defer(1, Point::new(4, 4));

        let snapshot = deferred.snapshot();
        assert_eq!(snapshot, vec![(1, Point::new(4, 4)), (2, Point::new(0, 0))]);
        assert!(deferred.is_empty());

        deferred.defer(3, Point::new(1, 1));
        deferred.restore(snapshot.into_iter().skip(1));
        assert_eq!(deferred.len(), 2);
        assert!(deferred.contains(Point::new(0, 0)));
        assert!(!deferred.contains(Point::new(4, 4)));
    }
}
