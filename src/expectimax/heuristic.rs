use crate::engine::{Board, SIZE};

/// Static score of a board; only meaningful for ranking within one search.
///
/// Sum of five terms: empty cells, corner placement of the highest tile,
/// monotonicity, merge opportunities and a smoothness penalty.
pub fn evaluate(board: &Board) -> f64 {
    let grid = to_grid(board);
    calc_empty(board) + calc_corner(board) + calc_monotonicity(&grid) + calc_merges(&grid)
        - calc_smoothness(&grid)
}

type Grid = [[u64; SIZE]; SIZE];

fn to_grid(board: &Board) -> Grid {
    let values = board.to_values();
    std::array::from_fn(|r| std::array::from_fn(|c| values[r * SIZE + c]))
}

fn calc_empty(board: &Board) -> f64 {
    const EMPTY_WEIGHT: f64 = 100.0;
    board.count_empty() as f64 * EMPTY_WEIGHT
}

fn calc_corner(board: &Board) -> f64 {
    const CORNER_BONUS: f64 = 2000.0;
    const OFF_CORNER_PENALTY: f64 = -500.0;
    const CORNERS: [usize; 4] = [0, 3, 12, 15];
    // duplicate maxima: only the first in board order counts
    if CORNERS.contains(&board.highest_tile_index()) {
        CORNER_BONUS
    } else {
        OFF_CORNER_PENALTY
    }
}

/// Adjacent non-empty pairs, rows left-to-right then columns top-to-bottom.
fn adjacent_pairs(grid: &Grid) -> impl Iterator<Item = (u64, u64)> + '_ {
    let rows = (0..SIZE).flat_map(move |r| (0..SIZE - 1).map(move |c| (grid[r][c], grid[r][c + 1])));
    let cols = (0..SIZE).flat_map(move |c| (0..SIZE - 1).map(move |r| (grid[r][c], grid[r + 1][c])));
    rows.chain(cols).filter(|&(a, b)| a != 0 && b != 0)
}

fn calc_monotonicity(grid: &Grid) -> f64 {
    const ORDERED: f64 = 10.0;
    const UNORDERED: f64 = -20.0;
    adjacent_pairs(grid).map(|(a, b)| if a >= b { ORDERED } else { UNORDERED }).sum()
}

fn calc_merges(grid: &Grid) -> f64 {
    const MERGES_WEIGHT: f64 = 5.0;
    let mut opportunities = 0u64;
    for r in 0..SIZE {
        for c in 0..SIZE {
            let v = grid[r][c];
            if v == 0 {
                continue;
            }
            if c + 1 < SIZE && grid[r][c + 1] == v {
                opportunities += v;
            }
            if r + 1 < SIZE && grid[r + 1][c] == v {
                opportunities += v;
            }
        }
    }
    opportunities as f64 * MERGES_WEIGHT
}

fn calc_smoothness(grid: &Grid) -> f64 {
    const SMOOTHNESS_WEIGHT: f64 = 2.0;
    adjacent_pairs(grid).map(|(a, b)| a.abs_diff(b) as f64).sum::<f64>() * SMOOTHNESS_WEIGHT
}
