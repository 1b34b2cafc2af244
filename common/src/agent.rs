//! The turn controller.
//!
//! An [`Agent`] is one game session. It is built from the construction
//! parameters and then driven one percept at a time through
//! [`Agent::next_action`], which always answers with exactly one [`Action`].

use anyhow::Context;
use tracing::{debug, info, trace, warn};

use crate::action::{Action, ActionRecord, Verb};
use crate::board::{Knowledge, Point};
use crate::constraint::{self, Deduction};
use crate::error::{SetupError, check_setup};
use crate::guess::{self, Likelihoods};
use crate::overlap::OverlapMemo;
use crate::scheduler::{ActionQueue, DeferredSet};

/// Where the session is in its life cycle.
///
/// Updating, scheduling and acting all happen inside one call to
/// [`Agent::next_action`], so only the states visible between turns exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    /// Waiting for the percept of the last emitted action.
    AwaitObservation,
    /// Nothing more to do; every further turn ends immediately.
    Done,
}

/// Which part of the pipeline produced an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Queue,
    Deferred,
    Overlap,
    Guess,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Agent {
    board: Knowledge,
    total_mines: usize,
    /// The cell whose outcome the next percept describes.
    target: Option<(Point, Verb)>,
    queue: ActionQueue,
    deferred: DeferredSet,
    likelihoods: Likelihoods,
    overlap: OverlapMemo,
    phase: Phase,
    last_action: Option<Action>,
    turns: usize,
}

impl Agent {
    /// Starts a session. `start` is the cell the game has already revealed;
    /// its count arrives with the first call to [`Agent::next_action`].
    pub fn new(
        width: usize,
        height: usize,
        total_mines: usize,
        start: Point,
    ) -> Result<Self, SetupError> {
        check_setup(width, height, total_mines, start)?;

        let mut board = Knowledge::new(width, height);
        board.mark_pending(start, Verb::Reveal);

        Ok(Agent {
            board,
            total_mines,
            target: Some((start, Verb::Reveal)),
            queue: ActionQueue::new(),
            deferred: DeferredSet::new(),
            likelihoods: Likelihoods::new(),
            overlap: OverlapMemo::new(),
            phase: Phase::AwaitObservation,
            last_action: None,
            turns: 0,
        })
    }

    pub fn board(&self) -> &Knowledge {
        &self.board
    }

    pub fn total_mines(&self) -> usize {
        self.total_mines
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_action(&self) -> Option<Action> {
        self.last_action
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Certain actions waiting to be emitted, most urgent first.
    pub fn queued(&self) -> impl Iterator<Item = &ActionRecord> {
        self.queue.iter()
    }

    pub fn deferred(&self) -> &DeferredSet {
        &self.deferred
    }

    pub fn likelihoods(&self) -> &Likelihoods {
        &self.likelihoods
    }

    /// Every safe cell has been revealed.
    pub fn is_complete(&self) -> bool {
        self.board.revealed_safe() == self.board.area() - self.total_mines
    }

    /// Consumes the percept for the last action and returns the next one.
    ///
    /// `hint` is the mine count around the cell last revealed, or negative if
    /// that cell was a mine. After a flag the percept is ignored.
    pub fn next_action(&mut self, hint: i32) -> Action {
        self.turns += 1;
        let action = self.turn(hint);
        self.last_action = Some(action);
        action
    }

    fn turn(&mut self, hint: i32) -> Action {
        if self.phase == Phase::Done {
            return Action::EndTurn;
        }
        if self.is_complete() {
            return self.finish("every safe cell revealed");
        }

        self.observe(hint);
        trace!(turn = self.turns, "knowledge\n{}", self.board);
        if self.is_complete() {
            return self.finish("every safe cell revealed");
        }

        match self.decide() {
            Some((source, record)) => {
                debug!(
                    turn = self.turns,
                    ?source,
                    priority = record.priority,
                    queued = self.queue.len(),
                    deferred = self.deferred.len(),
                    action = %Action::from(record),
                    "act"
                );
                self.target = Some((record.at, record.verb));
                Action::from(record)
            }
            None => self.finish("no action left"),
        }
    }

    fn finish(&mut self, reason: &str) -> Action {
        info!(
            turns = self.turns,
            revealed = self.board.revealed_safe(),
            mines = self.board.known_mines(),
            reason,
            "done"
        );
        self.phase = Phase::Done;
        self.target = None;
        Action::EndTurn
    }

    /// Records the percept against the current target and evaluates it.
    fn observe(&mut self, hint: i32) {
        let Some((at, verb)) = self.target.take() else {
            return;
        };
        debug!(turn = self.turns, %at, ?verb, hint, "observe");

        match verb {
            Verb::Flag => {
                self.board.set_flagged(at);
            }
            Verb::Reveal if hint < 0 => {
                warn!(%at, "detonated a mine");
                self.board.set_hit(at);
                for (n, neighbor) in constraint::detonation_dependents(&self.board, at) {
                    self.deferred.defer(n, neighbor);
                }
            }
            Verb::Reveal => {
                let count = u8::try_from(hint).unwrap_or(u8::MAX);
                self.board.set_revealed(at, count);
                match constraint::deduce(&self.board, at) {
                    Deduction::Certain(records) => {
                        self.queue.extend(&mut self.board, records);
                    }
                    Deduction::Unresolved { remaining, unknown } => {
                        self.likelihoods.record(remaining, &unknown);
                        self.deferred.defer(count, at);
                    }
                    Deduction::Settled => {}
                }
            }
        }
    }

    /// Runs the pipeline until some stage queues an action, then pops it.
    fn decide(&mut self) -> Option<(Source, ActionRecord)> {
        if let Some(record) = self.queue.pop() {
            return Some((Source::Queue, record));
        }

        if self.revisit_deferred() {
            return self.queue.pop().map(|r| (Source::Deferred, r));
        }

        let overlaps = self.overlap.deduce(&self.board);
        if self.queue.extend(&mut self.board, overlaps) > 0 {
            return self.queue.pop().map(|r| (Source::Overlap, r));
        }

        let guesses = guess::choose(&self.board, &mut self.likelihoods, self.total_mines);
        if self.queue.extend(&mut self.board, guesses) > 0 {
            return self.queue.pop().map(|r| (Source::Guess, r));
        }

        None
    }

    /// Re-evaluates deferred constraints in `(hint, cell)` order until one
    /// queues something. Entries that are still inconclusive, and any not
    /// reached, go back into the set; settled ones are dropped.
    fn revisit_deferred(&mut self) -> bool {
        let mut entries = self.deferred.snapshot().into_iter();
        let mut still_open = Vec::new();
        let mut progressed = false;

        for (hint, at) in entries.by_ref() {
            match constraint::deduce(&self.board, at) {
                Deduction::Certain(records) => {
                    if self.queue.extend(&mut self.board, records) > 0 {
                        progressed = true;
                        break;
                    }
                }
                Deduction::Unresolved { remaining, unknown } => {
                    self.likelihoods.record(remaining, &unknown);
                    still_open.push((hint, at));
                }
                Deduction::Settled => {}
            }
        }

        self.deferred.restore(still_open.into_iter().chain(entries));
        progressed
    }

    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        bcs::to_bytes(self).context("serialize agent")
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        bcs::from_bytes(bytes).context("deserialize agent")
    }
}
