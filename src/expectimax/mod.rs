//! Expectimax move advisor for 2048.
//!
//! - [`evaluate`]: static board heuristic used at cutoff/terminal nodes.
//! - [`Expectimax`]: depth-limited search alternating player (max) and
//!   tile-spawn (chance) nodes over [`crate::engine::perform_move`].
//! - [`find_best_move`]: one-shot convenience with default settings.
//!
//! The search is deterministic and single-threaded; randomness only happens
//! when a caller spawns tiles on a real game.
//!
//! Quick start
//! ```
//! use tile_advisor::engine::{Board, Move};
//! use tile_advisor::expectimax::{find_best_move, Expectimax};
//!
//! let b: Board = "2 2 0 0  0 0 0 0  0 0 0 0  0 0 0 0".parse().unwrap();
//! let mut ex = Expectimax::new();
//! let m = ex.best_move(b).unwrap();
//! assert!(b.perform_move(m).has_changed);
//! assert_eq!(find_best_move(&b), Some(m));
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::{Board, Move};

mod heuristic;
mod search;

pub use heuristic::evaluate;
pub use search::Expectimax;

/// Search knobs. Defaults give a depth-3 lookahead with 0.9/0.1 spawn weights.
///
/// - `depth`: plies searched below each root move before falling back to [`evaluate`].
/// - `cache_enabled`: memoise chance nodes by (board, remaining depth). Scores are unchanged.
/// - `two_weight` / `four_weight`: spawn weights of a 2 and a 4 at chance nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectimaxConfig {
    pub depth: u32,
    pub cache_enabled: bool,
    pub two_weight: f64,
    pub four_weight: f64,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self { depth: 3, cache_enabled: true, two_weight: 0.9, four_weight: 0.1 }
    }
}

/// Per-branch expected value at the root.
///
/// `legal` is false when the move is a no-op for the board; `ev` is then 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

/// Basic search stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub cache_hits: u64,
    pub peak_nodes: u64,
}

/// Best direction for `board` with default settings, or `None` if no move changes it.
pub fn find_best_move(board: &Board) -> Option<Move> {
    Expectimax::new().best_move(*board)
}
