//! An offline retrograde-analysis generator for the board game 'Connect 4'
//!
//! The generator walks every game state reachable within a bounded ply
//! window, weakly solves the children of each one, and collects the
//! *critical* positions: those where exactly one move wins, every other
//! move draws or loses, and the winning move is neither an immediate
//! four-in-a-row nor the only reply to an opposing threat. The collected
//! positions are packed into an open-addressed hash table and written to
//! `critical.db` for use by a playing agent.
//!
//! # Basic Usage
//!
//! ```no_run
//! use critical4::{database::CriticalDatabase, generator::Generator};
//!
//!# fn main() -> anyhow::Result<()> {
//! let (critical, stats) = Generator::new().run();
//! println!("{} critical positions found", stats.critical);
//!
//! CriticalDatabase::build(&critical).save("critical.db")?;
//!# Ok(())
//!# }
//! ```

use static_assertions::*;

pub mod bitboard;

pub mod transposition_table;

pub mod solver;

pub mod generator;

pub mod database;


/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

/// The lowest ply at which positions are analysed for criticality
pub const MIN_PLY: usize = 15;

/// The highest ply analysed; the game tree is not descended past this depth
pub const MAX_PLY: usize = 28;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);

// the analysis window must sit inside a playable game
const_assert!(MIN_PLY <= MAX_PLY);
const_assert!(MAX_PLY < WIDTH * HEIGHT);
