use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tile_advisor::autoplay::play_game;
use tile_advisor::engine::{Board, Move};
use tile_advisor::expectimax::{evaluate, Expectimax, ExpectimaxConfig};
use tile_advisor::session::{BestScoreStore, GameSession};
use tile_advisor::trace;

#[derive(Debug, Parser)]
#[command(name = "tile-advisor", version, about = "2048 move engine and expectimax advisor")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Plies searched below each root move
    #[arg(long, default_value_t = 3)]
    depth: u32,
    /// Disable the chance-node cache
    #[arg(long)]
    no_cache: bool,
}

impl SearchArgs {
    fn config(&self) -> ExpectimaxConfig {
        ExpectimaxConfig { depth: self.depth, cache_enabled: !self.no_cache, ..Default::default() }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Let the advisor play a full game
    Play {
        #[command(flatten)]
        search: SearchArgs,
        /// Seed for tile spawns (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<u64>,
        /// Write a binary trace of the game to this path
        #[arg(long, value_name = "PATH")]
        trace: Option<PathBuf>,
        /// File holding the best score across games
        #[arg(long, value_name = "PATH")]
        best_file: Option<PathBuf>,
        /// Don't print boards
        #[arg(long)]
        quiet: bool,
    },
    /// Resolve one move and print the result as JSON
    Move {
        /// up, down, left or right
        dir: Move,
        /// 16 cell values, row-major ("0" = empty)
        #[arg(required = true, num_args = 1..)]
        cells: Vec<String>,
    },
    /// Print the advisor's move for a board, or "none"
    Advise {
        #[command(flatten)]
        search: SearchArgs,
        #[arg(required = true, num_args = 1..)]
        cells: Vec<String>,
    },
    /// Print the static evaluation of a board
    Eval {
        #[arg(required = true, num_args = 1..)]
        cells: Vec<String>,
    },
}

fn parse_board(cells: &[String]) -> anyhow::Result<Board> {
    cells.join(" ").parse().context("invalid board")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().cmd {
        Command::Play { search, seed, max_moves, trace: trace_path, best_file, quiet } => {
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };
            let store = best_file.map(BestScoreStore::new);
            let best = match &store {
                Some(s) => s.load().with_context(|| format!("reading {}", s.path().display()))?,
                None => 0,
            };
            let cfg = search.config();
            let engine_str = format!("expectimax-d{}", cfg.depth);
            let mut policy = Expectimax::with_config(cfg);
            let mut game = GameSession::with_best(best, &mut rng);
            if !quiet {
                println!("{}", game.board());
            }

            let record = play_game(&mut policy, &mut game, &mut rng, max_moves, |s, dir, turn| {
                if turn.just_won {
                    info!(moves = s.moves(), score = s.score(), "reached 2048");
                }
                if !quiet {
                    println!("{dir} (+{})\n{}", turn.result.score_change, s.board());
                }
            });

            info!(
                moves = record.moves.len(),
                score = record.final_score,
                best = game.best(),
                highest_tile = record.highest_tile,
                nodes = record.nodes,
                elapsed_s = record.elapsed.as_secs_f64(),
                "game finished"
            );

            if let Some(store) = &store {
                store.save(game.best()).with_context(|| format!("writing {}", store.path().display()))?;
            }
            if let Some(path) = trace_path {
                let meta = record.meta(Some(engine_str));
                trace::write_run_to_path(&path, &meta, &record.states, &record.moves)
                    .with_context(|| format!("writing trace {}", path.display()))?;
                info!(path = %path.display(), "trace written");
            }
        }
        Command::Move { dir, cells } => {
            let board = parse_board(&cells)?;
            println!("{}", serde_json::to_string_pretty(&board.perform_move(dir))?);
        }
        Command::Advise { search, cells } => {
            let board = parse_board(&cells)?;
            let mut policy = Expectimax::with_config(search.config());
            match policy.best_move(board) {
                Some(dir) => println!("{dir}"),
                None => println!("none"),
            }
        }
        Command::Eval { cells } => {
            let board = parse_board(&cells)?;
            println!("{}", evaluate(&board));
        }
    }
    Ok(())
}
