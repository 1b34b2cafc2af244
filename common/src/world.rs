//! A simulated minesweeper environment.
//!
//! The world owns the real mine layout and answers the agent's actions with
//! the same single-integer percepts a real game would. It is used by the bot
//! binary, the wasm bindings and the tests.

use anyhow::{Context, bail};
use rand::Rng;
use rand::prelude::IndexedRandom;

use crate::HIT;
use crate::action::Action;
use crate::agent::Agent;
use crate::board::{Point, neighbors};
use crate::error::{SetupError, check_setup};

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
    /// The player ended the game with safe cells still covered.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct World {
    width: usize,
    height: usize,
    start: Point,
    total_mines: usize,
    mines: Vec<bool>,
    revealed: Vec<bool>,
    flagged: Vec<bool>,
    revealed_count: usize,
    game_state: GameState,
}

impl World {
    /// Places `mines` uniformly at random. The first cell is always safe, and
    /// so are its neighbours whenever the rest of the grid has room for all
    /// the mines.
    pub fn new<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        mines: usize,
        start: Point,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        check_setup(width, height, mines, start)?;

        let opening: Vec<Point> = std::iter::once(start)
            .chain(neighbors(width, height, start))
            .collect();
        let keep_clear = if width * height - opening.len() >= mines {
            &opening[..]
        } else {
            &opening[..1]
        };

        let candidates: Vec<Point> = (0..width * height)
            .map(|i| Point::new(i % width, i / width))
            .filter(|p| !keep_clear.contains(p))
            .collect();
        let layout: Vec<Point> = candidates.choose_multiple(rng, mines).copied().collect();

        Self::from_layout(width, height, &layout, start)
    }

    /// Builds a world with a fixed layout. The first cell starts revealed.
    pub fn from_layout(
        width: usize,
        height: usize,
        mines: &[Point],
        start: Point,
    ) -> Result<Self, SetupError> {
        check_setup(width, height, mines.len(), start)?;

        let mut cells = vec![false; width * height];
        for &at in mines {
            if at.col >= width || at.row >= height {
                return Err(SetupError::MineOutOfBounds { at });
            }
            if at == start {
                return Err(SetupError::MineOnStart { at });
            }
            let cell = &mut cells[at.row * width + at.col];
            if *cell {
                return Err(SetupError::DuplicateMine { at });
            }
            *cell = true;
        }

        let mut world = World {
            width,
            height,
            start,
            total_mines: cells.iter().filter(|&&mine| mine).count(),
            mines: cells,
            revealed: vec![false; width * height],
            flagged: vec![false; width * height],
            revealed_count: 0,
            game_state: GameState::Playing,
        };
        world.uncover(start);
        Ok(world)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn total_mines(&self) -> usize {
        self.total_mines
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    pub fn is_over(&self) -> bool {
        self.game_state != GameState::Playing
    }

    pub fn is_mine(&self, at: Point) -> bool {
        self.mines[self.index(at)]
    }

    pub fn is_flagged(&self, at: Point) -> bool {
        self.flagged[self.index(at)]
    }

    /// The percept for the first cell, handed to the agent on its first turn.
    pub fn start_hint(&self) -> i32 {
        self.hint_at(self.start)
    }

    /// Number of mines around `at`.
    pub fn hint_at(&self, at: Point) -> i32 {
        neighbors(self.width, self.height, at)
            .filter(|&p| self.is_mine(p))
            .count() as i32
    }

    /// All mine positions, row by row.
    pub fn mines(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.width * self.height)
            .filter(move |&i| self.mines[i])
            .map(move |i| Point::new(i % self.width, i / self.width))
    }

    fn index(&self, at: Point) -> usize {
        at.row * self.width + at.col
    }

    fn checked_index(&self, at: Point) -> anyhow::Result<usize> {
        if at.col >= self.width || at.row >= self.height {
            bail!("{} is outside the {}x{} grid", at, self.width, self.height);
        }
        Ok(self.index(at))
    }

    fn uncover(&mut self, at: Point) {
        let idx = self.index(at);
        if !self.revealed[idx] {
            self.revealed[idx] = true;
            self.revealed_count += 1;
        }
        if self.all_safe_revealed() {
            self.game_state = GameState::Won;
        }
    }

    fn all_safe_revealed(&self) -> bool {
        self.revealed_count == self.width * self.height - self.total_mines
    }

    /// Applies one action and returns the percept for it.
    ///
    /// * Reveal of a mine: [`HIT`], and the game is lost.
    /// * Reveal of a safe cell: its mine count.
    /// * Flag: 0. A flag teaches the player nothing.
    /// * End turn: 0, and the game ends.
    pub fn respond(&mut self, action: Action) -> anyhow::Result<i32> {
        if self.is_over() {
            bail!("game_ended: {:?}", self.game_state);
        }

        match action {
            Action::Reveal(at) => {
                let idx = self.checked_index(at)?;
                if self.mines[idx] {
                    self.game_state = GameState::Lost;
                    return Ok(HIT);
                }
                self.uncover(at);
                Ok(self.hint_at(at))
            }
            Action::Flag(at) => {
                let idx = self.checked_index(at)?;
                self.flagged[idx] = true;
                Ok(0)
            }
            Action::EndTurn => {
                self.game_state = if self.all_safe_revealed() {
                    GameState::Won
                } else {
                    GameState::Abandoned
                };
                Ok(0)
            }
        }
    }

    /// Plays `agent` against this world until the game ends.
    ///
    /// `inspect` sees every action before it is applied, together with the
    /// agent's knowledge at the moment it chose it.
    ///
    /// After a win the agent still sees the last percept and ends its turn.
    /// After a loss it is not consulted again, so the detonating reveal is
    /// its last action.
    pub fn play<F>(&mut self, agent: &mut Agent, mut inspect: F) -> anyhow::Result<GameState>
    where
        F: FnMut(&Agent, Action) -> anyhow::Result<()>,
    {
        // Each cell is targeted at most once, plus the final end turn.
        let limit = self.width * self.height + 2;
        let mut percept = self.start_hint();

        for _ in 0..limit {
            if self.game_state == GameState::Lost {
                return Ok(self.game_state);
            }
            let action = agent.next_action(percept);
            if self.is_over() {
                return Ok(self.game_state);
            }
            if action == Action::EndTurn {
                self.respond(action)?;
                return Ok(self.game_state);
            }
            inspect(agent, action)?;
            percept = self.respond(action)?;
        }

        bail!("agent still acting after {} turns", limit)
    }

    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        bcs::to_bytes(self).context("serialize world")
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        bcs::from_bytes(bytes).context("deserialize world")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_first_cell_starts_revealed() {
        let world = World::from_layout(3, 3, &[Point::new(2, 2)], Point::new(0, 0)).unwrap();

        assert_eq!(world.game_state(), GameState::Playing);
        assert_eq!(world.start_hint(), 0);
        assert_eq!(world.hint_at(Point::new(1, 1)), 1);
        assert_eq!(world.total_mines(), 1);
    }

    #[test]
    fn test_layout_validation() {
        assert_eq!(
            World::from_layout(3, 3, &[Point::new(0, 0)], Point::new(0, 0)),
            Err(SetupError::MineOnStart {
                at: Point::new(0, 0)
            })
        );
        assert_eq!(
            World::from_layout(3, 3, &[Point::new(3, 0)], Point::new(0, 0)),
            Err(SetupError::MineOutOfBounds {
                at: Point::new(3, 0)
            })
        );
        assert_eq!(
            World::from_layout(3, 3, &[Point::new(2, 2), Point::new(2, 2)], Point::new(0, 0)),
            Err(SetupError::DuplicateMine {
                at: Point::new(2, 2)
            })
        );
    }

    #[test]
    fn test_play_stops_consulting_the_agent_after_a_loss() {
        // The opening 1 is ambiguous and the agent's first guess is the mine.
        let mut world =
            World::from_layout(3, 2, &[Point::new(0, 1)], Point::new(0, 0)).unwrap();
        let mut agent = Agent::new(3, 2, 1, world.start()).unwrap();

        let state = world.play(&mut agent, |_, _| Ok(())).unwrap();

        assert_eq!(state, GameState::Lost);
        assert_eq!(agent.turns(), 1);
        assert_eq!(agent.last_action(), Some(Action::Reveal(Point::new(0, 1))));
    }

    #[test]
    fn test_reveals_flags_and_detonations() {
        let mut world =
            World::from_layout(3, 1, &[Point::new(2, 0)], Point::new(0, 0)).unwrap();

        assert_eq!(world.respond(Action::Flag(Point::new(2, 0))).unwrap(), 0);
        assert!(world.is_flagged(Point::new(2, 0)));
        assert_eq!(world.respond(Action::Reveal(Point::new(1, 0))).unwrap(), 1);
        assert_eq!(world.game_state(), GameState::Won);
        assert!(world.respond(Action::EndTurn).is_err());

        let mut world =
            World::from_layout(3, 1, &[Point::new(2, 0)], Point::new(0, 0)).unwrap();
        assert_eq!(world.respond(Action::Reveal(Point::new(2, 0))).unwrap(), HIT);
        assert_eq!(world.game_state(), GameState::Lost);
    }

    #[test]
    fn test_ending_early_abandons_the_game() {
        let mut world =
            World::from_layout(3, 1, &[Point::new(2, 0)], Point::new(0, 0)).unwrap();
        assert!(world.respond(Action::Reveal(Point::new(7, 0))).is_err());
        world.respond(Action::EndTurn).unwrap();
        assert_eq!(world.game_state(), GameState::Abandoned);
    }

    #[test]
    fn test_random_layout_keeps_the_opening_clear() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let start = Point::new(4, 4);
            let world = World::new(9, 9, 10, start, &mut rng).unwrap();

            assert_eq!(world.mines().count(), 10);
            assert_eq!(world.start_hint(), 0);
            assert!(!world.is_mine(start));
        }

        // Too crowded for a clear opening: only the first cell is guaranteed.
        let world = World::new(3, 3, 7, Point::new(1, 1), &mut rng).unwrap();
        assert_eq!(world.mines().count(), 7);
        assert!(!world.is_mine(Point::new(1, 1)));
    }

    #[test]
    fn test_bytes_restore_the_same_world() {
        let mut rng = StdRng::seed_from_u64(11);
        let world = World::new(5, 4, 3, Point::new(0, 0), &mut rng).unwrap();

        let restored = World::from_bytes(&world.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, world);
    }
}
