//! Advisor-driven game loop shared by the binaries.
//!
//! ```
//! use tile_advisor::autoplay::play_game;
//! use tile_advisor::expectimax::Expectimax;
//! use tile_advisor::session::GameSession;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let mut game = GameSession::new(&mut rng);
//! let mut policy = Expectimax::new();
//! let record = play_game(&mut policy, &mut game, &mut rng, Some(4), |_, _, _| {});
//! assert_eq!(record.moves.len(), 4);
//! assert_eq!(record.states.len(), 5);
//! ```

use std::time::{Duration, Instant};

use rand::Rng;

use crate::engine::{Board, Move};
use crate::expectimax::Expectimax;
use crate::session::{GameSession, Turn};
use crate::trace::{self, Meta};

/// Everything needed to summarise or trace one finished game.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub states: Vec<Board>,
    pub moves: Vec<Move>,
    pub final_score: u64,
    pub highest_tile: u64,
    pub won: bool,
    pub start_unix_s: u64,
    pub elapsed: Duration,
    pub nodes: u64,
}

impl GameRecord {
    pub fn meta(&self, engine_str: Option<String>) -> Meta {
        Meta {
            steps: self.moves.len() as u32,
            start_unix_s: self.start_unix_s,
            elapsed_s: self.elapsed.as_secs_f32(),
            final_score: self.final_score,
            highest_tile: self.highest_tile,
            engine_str,
        }
    }
}

/// Let `policy` play `session` until game over, no legal move, or `max_moves`.
///
/// `on_turn` sees the session after each committed move.
pub fn play_game<R, F>(
    policy: &mut Expectimax,
    session: &mut GameSession,
    rng: &mut R,
    max_moves: Option<u64>,
    mut on_turn: F,
) -> GameRecord
where
    R: Rng + ?Sized,
    F: FnMut(&GameSession, Move, &Turn),
{
    let start = Instant::now();
    let start_unix_s = trace::now_unix_seconds();
    let mut states = vec![session.board()];
    let mut moves = Vec::new();
    let mut nodes = 0u64;

    while !session.is_game_over() {
        if max_moves.is_some_and(|limit| moves.len() as u64 >= limit) {
            break;
        }
        let Some(dir) = policy.best_move(session.board()) else { break };
        nodes = nodes.saturating_add(policy.last_stats().nodes);
        let Some(turn) = session.apply_move(dir, rng) else {
            tracing::warn!(%dir, board = ?session.board(), "advisor proposed a no-op move");
            break;
        };
        moves.push(dir);
        states.push(session.board());
        on_turn(session, dir, &turn);
    }

    let highest_tile = states.iter().map(Board::highest_tile).max().unwrap_or(0);
    GameRecord {
        states,
        moves,
        final_score: session.score(),
        highest_tile,
        won: session.has_won(),
        start_unix_s,
        elapsed: start.elapsed(),
        nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectimax::ExpectimaxConfig;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn it_plays_until_limit() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut game = GameSession::new(&mut rng);
        let mut policy = Expectimax::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
        let mut seen = 0;
        let record = play_game(&mut policy, &mut game, &mut rng, Some(25), |s, _, t| {
            seen += 1;
            assert_eq!(s.board(), t.spawned.map_or(t.result.board, |(i, tile)| t.result.board.with_tile(i, tile)));
        });
        assert_eq!(seen, 25);
        assert_eq!(record.moves.len(), 25);
        assert_eq!(record.final_score, game.score());
        assert!(record.highest_tile >= 4);
        assert!(record.nodes > 0);

        let meta = record.meta(None);
        assert_eq!(meta.steps, 25);
    }

    #[test]
    fn scores_add_up() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut game = GameSession::new(&mut rng);
        let mut policy = Expectimax::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
        let mut total = 0;
        play_game(&mut policy, &mut game, &mut rng, Some(40), |_, _, t| total += t.result.score_change);
        assert_eq!(total, game.score());
    }

    #[test]
    fn stuck_board_records_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        let stuck: Board = "2 4 8 16 4 2 16 8 8 16 2 4 16 8 4 2".parse().unwrap();
        let mut game = GameSession::from_board(stuck, 0, 0);
        let record = play_game(&mut Expectimax::new(), &mut game, &mut rng, None, |_, _, _| {});
        assert!(record.moves.is_empty());
        assert_eq!(record.states, vec![stuck]);
    }

    #[test]
    fn it_records_a_win() {
        let mut rng = StdRng::seed_from_u64(3);
        // only left/right change the board and both make 2048
        let b: Board = "1024 1024 2 4 4 2 16 8 8 16 2 4 16 8 4 2".parse().unwrap();
        let mut game = GameSession::from_board(b, 0, 0);
        assert!(!game.has_won());
        let record = play_game(&mut Expectimax::new(), &mut game, &mut rng, Some(1), |_, _, _| {});
        assert_eq!(record.moves.len(), 1);
        assert!(record.won);
        assert_eq!(record.highest_tile, 2048);
    }
}
