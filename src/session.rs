//! Caller-owned game state around the pure engine.
//!
//! A [`GameSession`] holds what a front end tracks between moves: the board,
//! running score, best score, win flag and move count. The engine itself
//! stays stateless; the session only commits [`MoveResult`]s and spawns tiles.
//!
//! ```
//! use tile_advisor::engine::Move;
//! use tile_advisor::session::GameSession;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut game = GameSession::new(&mut rng);
//! assert_eq!(game.board().count_empty(), 14);
//! for dir in Move::ALL {
//!     if let Some(turn) = game.apply_move(dir, &mut rng) {
//!         assert!(turn.result.has_changed);
//!         assert!(turn.spawned.is_some());
//!         break;
//!     }
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::engine::{Board, Move, MoveResult, Tile, WIN_TILE};

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("best score file is not an integer: {0}")]
    Parse(#[from] std::num::ParseIntError),
}

/// What a committed move did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub result: MoveResult,
    /// Cell and tile placed after the move.
    pub spawned: Option<(usize, Tile)>,
    /// True only on the move that first reached [`WIN_TILE`].
    pub just_won: bool,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    board: Board,
    score: u64,
    best: u64,
    won: bool,
    moves: u64,
}

impl GameSession {
    /// Fresh game: empty board plus two spawned tiles.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_best(0, rng)
    }

    /// Fresh game carrying a previously stored best score.
    pub fn with_best<R: Rng + ?Sized>(best: u64, rng: &mut R) -> Self {
        let mut session = GameSession { board: Board::EMPTY, score: 0, best, won: false, moves: 0 };
        session.spawn_tile(rng);
        session.spawn_tile(rng);
        session
    }

    /// Resume from an existing board (no tiles spawned).
    pub fn from_board(board: Board, score: u64, best: u64) -> Self {
        GameSession { board, score, best: best.max(score), won: board.has_won(WIN_TILE), moves: 0 }
    }

    #[inline] pub fn board(&self) -> Board { self.board }
    #[inline] pub fn score(&self) -> u64 { self.score }
    #[inline] pub fn best(&self) -> u64 { self.best }
    #[inline] pub fn has_won(&self) -> bool { self.won }
    #[inline] pub fn moves(&self) -> u64 { self.moves }
    #[inline] pub fn is_game_over(&self) -> bool { self.board.is_game_over() }

    /// Place a 2 (90%) or 4 (10%) in a uniformly random empty cell.
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(usize, Tile)> {
        let empty = self.board.count_empty();
        if empty == 0 {
            return None;
        }
        let nth = rng.gen_range(0..empty);
        let idx = self.board.empty_cells().nth(nth)?;
        let tile = generate_random_tile(rng);
        self.board = self.board.with_tile(idx, tile);
        tracing::trace!(idx, value = tile.value(), "spawned tile");
        Some((idx, tile))
    }

    /// Apply `dir`; `None` (and no state change) if the move is a no-op.
    pub fn apply_move<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R) -> Option<Turn> {
        let result = self.board.perform_move(dir);
        if !result.has_changed {
            return None;
        }
        self.board = result.board;
        self.score = self.score.saturating_add(result.score_change);
        self.best = self.best.max(self.score);
        self.moves += 1;
        let spawned = self.spawn_tile(rng);

        let just_won = !self.won && self.board.has_won(WIN_TILE);
        if just_won {
            self.won = true;
            tracing::debug!(score = self.score, moves = self.moves, "reached {WIN_TILE}");
        }
        let game_over = self.board.is_game_over();
        if game_over {
            tracing::debug!(score = self.score, moves = self.moves, "game over");
        }
        Some(Turn { result, spawned, just_won, game_over })
    }

    /// New game keeping the best score.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        *self = Self::with_best(self.best, rng);
    }
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_range(0..10) < 9 { Tile::TWO } else { Tile::FOUR }
}

/// File holding the single persisted best-score integer.
#[derive(Debug, Clone)]
pub struct BestScoreStore {
    path: PathBuf,
}

impl BestScoreStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        BestScoreStore { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Stored best score, 0 if the file does not exist yet.
    pub fn load(&self) -> Result<u64, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text.trim().parse()?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, best: u64) -> Result<(), SessionError> {
        fs::write(&self.path, best.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::tempdir;

    fn board(values: [u64; 16]) -> Board {
        Board::from_values(&values).unwrap()
    }

    #[test]
    fn it_starts_with_two_tiles() {
        let mut rng = StdRng::seed_from_u64(3);
        let s = GameSession::new(&mut rng);
        assert_eq!(s.board().count_empty(), 14);
        assert!(s.board().tiles().iter().all(|t| t.is_empty() || *t == Tile::TWO || *t == Tile::FOUR));
        assert_eq!(s.score(), 0);
        assert!(!s.has_won());
    }

    #[test]
    fn it_rejects_noop_moves() {
        let mut rng = StdRng::seed_from_u64(3);
        let b = board([2, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut s = GameSession::from_board(b, 10, 10);
        let before = s.clone();
        assert!(s.apply_move(Move::Left, &mut rng).is_none());
        assert!(s.apply_move(Move::Up, &mut rng).is_none());
        assert_eq!(s, before);
    }

    #[test]
    fn it_commits_score_and_spawns() {
        let mut rng = StdRng::seed_from_u64(9);
        let b = board([2, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut s = GameSession::from_board(b, 0, 2);
        let turn = s.apply_move(Move::Left, &mut rng).unwrap();
        assert_eq!(turn.result.score_change, 4);
        assert_eq!(s.score(), 4);
        assert_eq!(s.best(), 4);
        assert_eq!(s.moves(), 1);
        let (idx, tile) = turn.spawned.unwrap();
        assert_ne!(idx, 0);
        assert_eq!(s.board().tile(idx), tile);
        assert_eq!(s.board().count_empty(), 14);
    }

    #[test]
    fn it_signals_win_once() {
        let mut rng = StdRng::seed_from_u64(11);
        let b = board([1024, 1024, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut s = GameSession::from_board(b, 0, 0);
        let turn = s.apply_move(Move::Left, &mut rng).unwrap();
        assert!(turn.just_won);
        assert!(s.has_won());
        let again = Move::ALL.iter().find_map(|&d| s.apply_move(d, &mut rng)).unwrap();
        assert!(!again.just_won);
    }

    #[test]
    fn it_detects_game_over() {
        let mut rng = StdRng::seed_from_u64(0);
        // one move left: merging the 2s leaves a single gap for the spawn
        let b = board([2, 2, 8, 16, 4, 32, 64, 128, 8, 16, 32, 64, 16, 8, 4, 2]);
        let mut s = GameSession::from_board(b, 0, 0);
        assert!(!s.is_game_over());
        let turn = s.apply_move(Move::Left, &mut rng).unwrap();
        assert_eq!(turn.spawned.map(|(i, _)| i), Some(3));
        assert_eq!(turn.game_over, s.is_game_over());
    }

    #[test]
    fn spawn_on_full_board_is_none() {
        let mut rng = StdRng::seed_from_u64(0);
        let full = board([2, 4, 8, 16, 4, 2, 16, 8, 8, 16, 2, 4, 16, 8, 4, 2]);
        let mut s = GameSession::from_board(full, 0, 0);
        assert_eq!(s.spawn_tile(&mut rng), None);
        assert!(s.is_game_over());
    }

    #[test]
    fn spawn_distribution_is_mostly_twos() {
        let mut rng = StdRng::seed_from_u64(5);
        let fours = (0..10_000).filter(|_| generate_random_tile(&mut rng) == Tile::FOUR).count();
        assert!((800..1200).contains(&fours), "fours = {fours}");
    }

    #[test]
    fn restart_keeps_best() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut s = GameSession::from_board(Board::EMPTY, 500, 800);
        s.restart(&mut rng);
        assert_eq!(s.score(), 0);
        assert_eq!(s.best(), 800);
        assert_eq!(s.board().count_empty(), 14);
    }

    #[test]
    fn best_score_round_trip() {
        let dir = tempdir().unwrap();
        let store = BestScoreStore::new(dir.path().join("best"));
        assert_eq!(store.load().unwrap(), 0);
        store.save(12_345).unwrap();
        assert_eq!(store.load().unwrap(), 12_345);
        fs::write(store.path(), "not a number").unwrap();
        assert!(matches!(store.load(), Err(SessionError::Parse(_))));
    }
}
