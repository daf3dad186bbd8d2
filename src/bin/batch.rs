use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tile_advisor::autoplay::{play_game, GameRecord};
use tile_advisor::expectimax::{Expectimax, ExpectimaxConfig};
use tile_advisor::session::GameSession;
use tile_advisor::trace;

#[derive(Debug, Parser)]
#[command(name = "batch", about = "Play many seeded 2048 games with the expectimax advisor in parallel")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 16)]
    games: u64,
    /// Seed of the first game; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Plies searched below each root move
    #[arg(long, default_value_t = 3)]
    depth: u32,
    /// Per-game: stop after this many moves
    #[arg(long)]
    max_moves: Option<u64>,
    /// Write one trace per game into this directory
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
    /// Worker threads (rayon default if omitted)
    #[arg(long)]
    threads: Option<usize>,
    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

fn run_single_game(seed: u64, cfg: ExpectimaxConfig, max_moves: Option<u64>) -> GameRecord {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut policy = Expectimax::with_config(cfg);
    let mut game = GameSession::new(&mut rng);
    play_game(&mut policy, &mut game, &mut rng, max_moves, |_, _, _| {})
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(n).build_global().context("building thread pool")?;
    }
    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let cfg = ExpectimaxConfig { depth: args.depth, ..Default::default() };
    let engine_str = format!("expectimax-d{}", cfg.depth);
    let start = Instant::now();

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
                .progress_chars("=>-"),
        );
        pb
    };

    let records: Vec<(u64, GameRecord)> = (0..args.games)
        .into_par_iter()
        .map(|i| {
            let seed = args.seed.wrapping_add(i);
            let record = run_single_game(seed, cfg.clone(), args.max_moves);
            pb.inc(1);
            (seed, record)
        })
        .collect();
    pb.finish_and_clear();

    if let Some(dir) = &args.out_dir {
        for (seed, record) in &records {
            let path = dir.join(format!("game-{seed:06}.t2a"));
            let meta = record.meta(Some(engine_str.clone()));
            trace::write_run_to_path(&path, &meta, &record.states, &record.moves)
                .with_context(|| format!("writing trace {}", path.display()))?;
        }
        info!(dir = %dir.display(), count = records.len(), "traces written");
    }

    let scores: Vec<u64> = records.iter().map(|(_, r)| r.final_score).collect();
    let games = scores.len().max(1) as f64;
    let mean = scores.iter().sum::<u64>() as f64 / games;
    let wins = records.iter().filter(|(_, r)| r.won).count();
    let highest = records.iter().map(|(_, r)| r.highest_tile).max().unwrap_or(0);
    let total_moves: usize = records.iter().map(|(_, r)| r.moves.len()).sum();

    println!(
        "games: {} | mean score: {:.1} | max: {} | min: {} | highest tile: {} | wins: {} | moves: {} | elapsed: {:.1}s",
        records.len(),
        mean,
        scores.iter().max().copied().unwrap_or(0),
        scores.iter().min().copied().unwrap_or(0),
        highest,
        wins,
        total_moves,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
