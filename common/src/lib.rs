//! A turn-based deduction agent for minesweeper.
//!
//! The agent only ever sees one integer per turn: the number of mines around
//! the cell it last revealed (or [`HIT`] if that cell was a mine). From that
//! stream it builds its own picture of the board and answers with exactly one
//! [`Action`] per turn.
//!
//! Each turn runs the same pipeline:
//! 1. Record the observation in the [`Knowledge`] grid.
//! 2. Derive certain reveals/flags from the new hint ([`constraint`]).
//! 3. Drain the action queue, then re-examine deferred constraints.
//! 4. Try the two-constraint [`overlap`] rule.
//! 5. Fall back to the least likely mine ([`guess`]).
//!
//! A simulated [`World`] and an exact SAT [`Oracle`] are included for driving
//! and auditing games.

pub mod action;
pub mod agent;
pub mod board;
pub mod constraint;
pub mod error;
pub mod guess;
pub mod oracle;
pub mod overlap;
pub mod scheduler;
pub mod world;

pub use action::{Action, ActionRecord, Verb};
pub use agent::{Agent, Phase};
pub use board::{CellState, Knowledge, Point};
pub use error::SetupError;
pub use oracle::{DeducedState, Oracle};
pub use world::{GameState, World};

/// The percept reported when the targeted cell turned out to be a mine.
pub const HIT: i32 = -1;
