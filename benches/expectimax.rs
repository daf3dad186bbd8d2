use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;
use tile_advisor::autoplay::play_game;
use tile_advisor::engine::{Board, Move};
use tile_advisor::expectimax::{Expectimax, ExpectimaxConfig};
use tile_advisor::session::GameSession;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(4242);
    let mut game = GameSession::new(&mut rng);
    let mut boards = vec![game.board()];
    for i in 0..64 {
        if game.apply_move(Move::ALL[i % 4], &mut rng).is_some() {
            boards.push(game.board());
        }
    }
    boards
}

fn bench_search(c: &mut Criterion) {
    let boards = corpus();
    let mut ex = Expectimax::new();
    let mut plain = Expectimax::with_config(ExpectimaxConfig { cache_enabled: false, ..Default::default() });

    c.bench_function("expectimax/best_move", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards {
                acc ^= ex.best_move(bd).map(|m| m.to_u8() as u64).unwrap_or(4);
            }
            black_box(acc)
        })
    });

    c.bench_function("expectimax/best_move_uncached", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards {
                acc ^= plain.best_move(bd).map(|m| m.to_u8() as u64).unwrap_or(4);
            }
            black_box(acc)
        })
    });

    c.bench_function("expectimax/state_value", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards { acc += ex.state_value(bd); }
            black_box(acc)
        })
    });
}

fn bench_e2e(c: &mut Criterion) {
    let mut ex = Expectimax::new();
    c.bench_function("e2e/64_moves", |bch| {
        bch.iter(|| {
            let mut rng = StdRng::seed_from_u64(7);
            let mut game = GameSession::new(&mut rng);
            let record = play_game(&mut ex, &mut game, &mut rng, Some(64), |_, _, _| {});
            black_box((record.final_score, record.moves.len()))
        })
    });
}

criterion_group!(expectimax, bench_search, bench_e2e);
criterion_main!(expectimax);
