//! Configuration for the bot.
//!
//! Every flag can also be set through an `MSBOT_*` environment variable.
//! Command-line arguments take priority.

use anyhow::{Result, anyhow};
use clap::Parser;
use minesweeper_agent::Point;

#[derive(Parser, Debug, Clone)]
#[command(name = "minesweeper-bot")]
#[command(about = "Plays seeded minesweeper games with the deduction agent")]
pub struct Config {
    /// Grid width in cells
    #[arg(long, env = "MSBOT_WIDTH", default_value_t = 16)]
    pub width: usize,

    /// Grid height in cells
    #[arg(long, env = "MSBOT_HEIGHT", default_value_t = 16)]
    pub height: usize,

    /// Number of mines per game
    #[arg(long, env = "MSBOT_MINES", default_value_t = 40)]
    pub mines: usize,

    /// Number of games to play
    #[arg(long, env = "MSBOT_GAMES", default_value_t = 10)]
    pub games: u64,

    /// Seed of the first game; game `i` uses `seed + i`
    #[arg(long, env = "MSBOT_SEED", default_value_t = 0)]
    pub seed: u64,

    /// Column of the first cell (defaults to the middle)
    #[arg(long, env = "MSBOT_START_COL")]
    pub start_col: Option<usize>,

    /// Row of the first cell (defaults to the middle)
    #[arg(long, env = "MSBOT_START_ROW")]
    pub start_row: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MSBOT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Check every flag against the SAT oracle before it is placed
    #[arg(long, env = "MSBOT_AUDIT")]
    pub audit: bool,

    /// Print the agent's view of the grid after each game
    #[arg(long, env = "MSBOT_SHOW_BOARD")]
    pub show_board: bool,
}

impl Config {
    pub fn start(&self) -> Point {
        Point::new(
            self.start_col.unwrap_or(self.width / 2),
            self.start_row.unwrap_or(self.height / 2),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!("width and height must be greater than 0"));
        }

        if self.mines >= self.width * self.height {
            return Err(anyhow!(
                "mines ({}) must be fewer than the {} cells of a {}x{} grid",
                self.mines,
                self.width * self.height,
                self.width,
                self.height
            ));
        }

        let start = self.start();
        if start.col >= self.width || start.row >= self.height {
            return Err(anyhow!("start cell {} is outside the grid", start));
        }

        if self.games == 0 {
            return Err(anyhow!("games must be greater than 0"));
        }

        Ok(())
    }
}
