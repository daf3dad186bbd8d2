use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;
use tile_advisor::engine::{resolve_line, Board, Move, Tile};
use tile_advisor::expectimax::evaluate;
use tile_advisor::session::GameSession;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut boards = vec![Board::EMPTY];
    let mut game = GameSession::new(&mut rng);
    boards.push(game.board());
    // Derive a variety of densities deterministically
    for i in 0..40 {
        if game.apply_move(Move::ALL[i % 4], &mut rng).is_some() {
            boards.push(game.board());
        }
    }
    boards
}

fn bench_perform_move(c: &mut Criterion) {
    let boards = corpus();
    for dir in Move::ALL {
        c.bench_function(&format!("perform_move/{dir}"), |bch| {
            bch.iter(|| {
                let mut acc = 0usize;
                for bd in &boards { acc += bd.perform_move(dir).actions.len(); }
                black_box(acc)
            })
        });
    }
}

fn bench_line(c: &mut Criterion) {
    let two = Tile::TWO;
    let lines = [
        [two, two, two, two],
        [Tile::EMPTY, two, Tile::EMPTY, two],
        [two, Tile::FOUR, two, Tile::FOUR],
    ];
    c.bench_function("resolve_line", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for l in &lines { acc += resolve_line(black_box(l)).score; }
            black_box(acc)
        })
    });
}

fn bench_board_queries(c: &mut Criterion) {
    let boards = corpus();
    c.bench_function("evaluate", |bch| {
        bch.iter(|| {
            let mut acc = 0f64;
            for bd in &boards { acc += evaluate(bd); }
            black_box(acc)
        })
    });
    c.bench_function("is_game_over", |bch| {
        bch.iter(|| boards.iter().filter(|b| b.is_game_over()).count())
    });
}

criterion_group!(engine_ops, bench_perform_move, bench_line, bench_board_queries);
criterion_main!(engine_ops);
