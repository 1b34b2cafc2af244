use minesweeper_agent as ms;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

/// Starts an agent session. `start_col`/`start_row` is the cell the game has
/// already revealed.
#[wasm_bindgen]
pub fn create_agent(
    width: usize,
    height: usize,
    mines: usize,
    start_col: usize,
    start_row: usize,
) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let agent = ms::Agent::new(width, height, mines, ms::Point::new(start_col, start_row))
        .map_err(|e| e.to_string())?;
    agent.to_bytes().map_err(|e| e.to_string())
}

/// Feeds one percept to the agent and returns its new state. Read the chosen
/// action back with [`agent_action`].
#[wasm_bindgen]
pub fn agent_step(bts: Vec<u8>, hint: i32) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut agent = ms::Agent::from_bytes(&bts).map_err(|e| e.to_string())?;
    agent.next_action(hint);
    agent.to_bytes().map_err(|e| e.to_string())
}

/// The last action as `[kind, col, row]`: 0 end turn, 1 reveal, 2 flag.
#[wasm_bindgen]
pub fn agent_action(bts: Vec<u8>) -> Result<Vec<i32>, String> {
    console_error_panic_hook::set_once();

    let agent = ms::Agent::from_bytes(&bts).map_err(|e| e.to_string())?;
    let action = agent.last_action().unwrap_or(ms::Action::EndTurn);
    Ok(action.encode().to_vec())
}

/// The agent's view of every cell, row by row: -1 covered, -2 flagged,
/// -3 detonated, otherwise the revealed count.
#[wasm_bindgen]
pub fn agent_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let agent = ms::Agent::from_bytes(&bts).map_err(|e| e.to_string())?;
    let board = agent.board();
    Ok(board.points().map(|p| cell_code(board.get(p))).collect())
}

fn cell_code(state: ms::CellState) -> i8 {
    match state {
        ms::CellState::Unknown | ms::CellState::Pending(_) => -1,
        ms::CellState::Flagged => -2,
        ms::CellState::Hit => -3,
        ms::CellState::Revealed(n) => i8::try_from(n).unwrap_or(i8::MAX),
    }
}

#[wasm_bindgen]
pub fn create_world(
    width: usize,
    height: usize,
    mines: usize,
    start_col: usize,
    start_row: usize,
    seed: u64,
) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut rng = StdRng::seed_from_u64(seed);
    let start = ms::Point::new(start_col, start_row);
    let world = ms::World::new(width, height, mines, start, &mut rng).map_err(|e| e.to_string())?;
    world.to_bytes().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn world_start_hint(bts: Vec<u8>) -> Result<i32, String> {
    console_error_panic_hook::set_once();

    let world = ms::World::from_bytes(&bts).map_err(|e| e.to_string())?;
    Ok(world.start_hint())
}

/// Applies an action to the world. Returns the new world bytes with the
/// percept appended as one trailing signed byte.
#[wasm_bindgen]
pub fn world_respond(bts: Vec<u8>, kind: i32, col: usize, row: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut world = ms::World::from_bytes(&bts).map_err(|e| e.to_string())?;
    let action = ms::Action::decode(kind, col, row).ok_or(format!("unknown action kind {kind}"))?;
    let percept = world.respond(action).map_err(|e| e.to_string())?;
    let mut xs = world.to_bytes().map_err(|e| e.to_string())?;
    xs.push(percept as i8 as u8);
    Ok(xs)
}

/// 0 playing, 1 won, 2 lost, 3 abandoned.
#[wasm_bindgen]
pub fn world_state(bts: Vec<u8>) -> Result<u8, String> {
    console_error_panic_hook::set_once();

    let world = ms::World::from_bytes(&bts).map_err(|e| e.to_string())?;
    Ok(match world.game_state() {
        ms::GameState::Playing => 0,
        ms::GameState::Won => 1,
        ms::GameState::Lost => 2,
        ms::GameState::Abandoned => 3,
    })
}
