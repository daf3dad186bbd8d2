//! tile-advisor: a 2048 move engine plus an expectimax move advisor
//!
//! This crate provides:
//! - A pure move engine (`engine`): board + direction in, new board, score
//!   gained and per-tile animation actions out
//! - A static board evaluator and depth-limited Expectimax search (`expectimax`)
//! - A caller-owned game session with tile spawning and best-score storage (`session`)
//! - An advisor-driven game loop (`autoplay`) and a binary run trace (`trace`)
//!
//! Quick start:
//! ```
//! use tile_advisor::engine::{Board, Move};
//!
//! let b = Board::from_tokens(&[
//!     "2", "2", "0", "0",
//!     "0", "0", "0", "0",
//!     "0", "0", "0", "0",
//!     "0", "0", "0", "0",
//! ]).unwrap();
//! let r = b.perform_move(Move::Left);
//! assert!(r.has_changed);
//! assert_eq!(r.score_change, 4);
//! assert_eq!(r.actions.len(), 2);
//! assert!(r.actions.iter().all(|a| a.is_merge && a.to == 0));
//! ```
//!
//! Advisor plus session (what a front end's auto-play timer would drive):
//! ```
//! use tile_advisor::expectimax::Expectimax;
//! use tile_advisor::session::GameSession;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = GameSession::new(&mut rng);
//! let mut policy = Expectimax::new();
//! let mut moves = 0;
//! while !game.is_game_over() && moves < 3 {
//!     let Some(dir) = policy.best_move(game.board()) else { break };
//!     game.apply_move(dir, &mut rng).expect("advisor only proposes legal moves");
//!     moves += 1;
//! }
//! assert_eq!(game.moves(), 3);
//! ```
//!
pub mod autoplay;
pub mod engine;
pub mod expectimax;
pub mod session;
pub mod trace;
