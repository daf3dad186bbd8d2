use std::collections::HashMap;

use crate::engine::{Board, Move, Tile};

use super::heuristic::evaluate;
use super::{BranchEval, ExpectimaxConfig, SearchStats};

enum Node { Max, Chance }

type ChanceCache = HashMap<(Board, u32), f64>;

/// Single-threaded expectimax search.
#[derive(Debug, Clone, Default)]
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    /// Best legal direction, or `None` when no move changes the board.
    ///
    /// Only strictly greater values replace the incumbent, so ties go to the
    /// earlier direction in [`Move::ALL`].
    ///
    /// ```
    /// use tile_advisor::engine::Board;
    /// use tile_advisor::expectimax::Expectimax;
    /// let stuck: Board = "2 4 8 16 4 2 16 8 8 16 2 4 16 8 4 2".parse().unwrap();
    /// assert_eq!(Expectimax::new().best_move(stuck), None);
    /// ```
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let mut best: Option<(Move, f64)> = None;
        for branch in self.branch_evals(board) {
            if branch.legal && best.map_or(true, |(_, ev)| branch.ev > ev) {
                best = Some((branch.dir, branch.ev));
            }
        }
        tracing::debug!(
            chosen = ?best.map(|(m, _)| m),
            ev = ?best.map(|(_, ev)| ev),
            nodes = self.stats.nodes,
            depth = self.cfg.depth,
            "expectimax search finished"
        );
        best.map(|(m, _)| m)
    }

    /// Expected value of each direction, in [`Move::ALL`] order.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let mut cache = ChanceCache::new();
        let mut nodes = 0u64;
        let mut hits = 0u64;
        let out = Move::ALL.map(|dir| {
            let result = board.perform_move(dir);
            if result.has_changed {
                let ev = self.expectimax(result.board, Node::Chance, self.cfg.depth, &mut cache, &mut nodes, &mut hits);
                BranchEval { dir, ev, legal: true }
            } else {
                BranchEval { dir, ev: 0.0, legal: false }
            }
        });
        self.record(nodes, hits);
        out
    }

    /// Value of the best branch, or the static evaluation when no move is legal.
    pub fn state_value(&mut self, board: Board) -> f64 {
        self.branch_evals(board)
            .iter()
            .filter(|b| b.legal)
            .map(|b| b.ev)
            .fold(None, |acc: Option<f64>, ev| Some(acc.map_or(ev, |a| a.max(ev))))
            .unwrap_or_else(|| evaluate(&board))
    }

    /// Statistics from the last call to [`Self::best_move`],
    /// [`Self::branch_evals`] or [`Self::state_value`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    fn record(&mut self, nodes: u64, hits: u64) {
        self.stats.nodes = nodes;
        self.stats.cache_hits = hits;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
    }

    fn expectimax(
        &self,
        board: Board,
        node: Node,
        depth: u32,
        cache: &mut ChanceCache,
        nodes: &mut u64,
        hits: &mut u64,
    ) -> f64 {
        *nodes += 1;
        if depth == 0 || board.is_game_over() {
            return evaluate(&board);
        }
        match node {
            Node::Max => self.evaluate_max(board, depth, cache, nodes, hits),
            Node::Chance => self.evaluate_chance(board, depth, cache, nodes, hits),
        }
    }

    fn evaluate_max(
        &self,
        board: Board,
        depth: u32,
        cache: &mut ChanceCache,
        nodes: &mut u64,
        hits: &mut u64,
    ) -> f64 {
        let mut best: Option<f64> = None;
        for dir in Move::ALL {
            let result = board.perform_move(dir);
            if result.has_changed {
                let score = self.expectimax(result.board, Node::Chance, depth - 1, cache, nodes, hits);
                best = Some(best.map_or(score, |b| b.max(score)));
            }
        }
        best.unwrap_or_else(|| evaluate(&board))
    }

    fn evaluate_chance(
        &self,
        board: Board,
        depth: u32,
        cache: &mut ChanceCache,
        nodes: &mut u64,
        hits: &mut u64,
    ) -> f64 {
        if self.cfg.cache_enabled {
            if let Some(&score) = cache.get(&(board, depth)) {
                *hits += 1;
                return score;
            }
        }
        let empty: Vec<usize> = board.empty_cells().collect();
        if empty.is_empty() {
            return evaluate(&board);
        }
        let mut score = 0.0;
        for &idx in &empty {
            let with_two = board.with_tile(idx, Tile::TWO);
            score += self.cfg.two_weight * self.expectimax(with_two, Node::Max, depth - 1, cache, nodes, hits);
            let with_four = board.with_tile(idx, Tile::FOUR);
            score += self.cfg.four_weight * self.expectimax(with_four, Node::Max, depth - 1, cache, nodes, hits);
        }
        score /= empty.len() as f64;
        if self.cfg.cache_enabled {
            cache.insert((board, depth), score);
        }
        score
    }
}
