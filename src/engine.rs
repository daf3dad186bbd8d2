//! Move resolution for the 4x4 board.
//!
//! Everything here is pure: a [`Board`] plus a [`Move`] yields a
//! [`MoveResult`] holding the new board, the points gained and the ordered
//! per-tile [`TileAction`]s a renderer needs to animate the slide.
//!
//! ```
//! use tile_advisor::engine::{Board, Move};
//!
//! let b: Board = "2 2 0 0  0 0 0 0  0 0 0 0  0 0 0 4".parse().unwrap();
//! let r = b.perform_move(Move::Left);
//! assert!(r.has_changed);
//! assert_eq!(r.score_change, 4);
//! assert_eq!(r.board.tile(0).value(), 4);
//! assert_eq!(r.board.tile(12).value(), 4);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Cells per side.
pub const SIZE: usize = 4;
/// Cells per board.
pub const CELLS: usize = SIZE * SIZE;
/// Largest exponent a [`Tile`] can hold (value 2^60).
///
/// With every tile at most 2^60, one move merges at most eight pairs below
/// the cap, so `score_change` stays within 2^63.
pub const MAX_EXPONENT: u8 = 60;
/// Tile value that signals a win.
pub const WIN_TILE: u64 = 2048;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("board must have {expected} cells, got {found}")]
    BoardLength { expected: usize, found: usize },
    #[error("invalid tile token {0:?}")]
    InvalidToken(String),
    #[error("tile value {0} is not a power of two >= 2")]
    NotPowerOfTwo(u64),
    #[error("tile value {0} exceeds 2^{max}", max = MAX_EXPONENT)]
    TileTooLarge(u64),
    #[error("unknown direction {0:?}")]
    UnknownDirection(String),
}

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Enumeration order used wherever directions are tried in turn.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        }
    }

    /// Compact code used by the trace format (0=up, 1=down, 2=left, 3=right).
    #[inline]
    pub fn to_u8(self) -> u8 {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    #[inline]
    pub fn from_u8(code: u8) -> Option<Move> {
        Move::ALL.get(code as usize).copied()
    }

    /// Board index of position `pos` in line `line`, where position 0 is the
    /// edge tiles slide toward.
    #[inline]
    fn line_index(self, line: usize, pos: usize) -> usize {
        match self {
            Move::Left => line * SIZE + pos,
            Move::Right => line * SIZE + (SIZE - 1 - pos),
            Move::Up => pos * SIZE + line,
            Move::Down => (SIZE - 1 - pos) * SIZE + line,
        }
    }

    fn line_indices(self, line: usize) -> [usize; SIZE] {
        std::array::from_fn(|pos| self.line_index(line, pos))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Move::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| ParseError::UnknownDirection(token.to_string()))
    }
}

/// One board cell: empty, or a power-of-two tile stored as its exponent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Tile(u8);

impl Tile {
    pub const EMPTY: Tile = Tile(0);
    pub const TWO: Tile = Tile(1);
    pub const FOUR: Tile = Tile(2);

    /// `0` is empty, `k` is the tile 2^k. `None` past [`MAX_EXPONENT`].
    #[inline]
    pub fn from_exponent(exponent: u8) -> Option<Tile> {
        (exponent <= MAX_EXPONENT).then_some(Tile(exponent))
    }

    /// `0` is empty; anything else must be a power of two in `2..=2^60`.
    pub fn from_value(value: u64) -> Result<Tile, ParseError> {
        match value {
            0 => Ok(Tile::EMPTY),
            v if v >= 2 && v.is_power_of_two() => {
                Tile::from_exponent(v.trailing_zeros() as u8).ok_or(ParseError::TileTooLarge(v))
            }
            v => Err(ParseError::NotPowerOfTwo(v)),
        }
    }

    #[inline]
    pub fn exponent(self) -> u8 {
        self.0
    }

    /// Face value, 0 for empty.
    #[inline]
    pub fn value(self) -> u64 {
        if self.0 == 0 { 0 } else { 1u64 << self.0 }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    fn merged(self) -> Tile {
        assert!(self.0 < MAX_EXPONENT, "tile overflow merging {}", self.value());
        Tile(self.0 + 1)
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Serialize for Tile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value())
    }
}

impl<'de> Deserialize<'de> for Tile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = u64::deserialize(deserializer)?;
        Tile::from_value(v).map_err(de::Error::custom)
    }
}

/// Row-major 4x4 board; index = row * 4 + col.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board([Tile; CELLS]);

impl Board {
    pub const EMPTY: Board = Board([Tile::EMPTY; CELLS]);

    #[inline]
    pub fn from_tiles(tiles: [Tile; CELLS]) -> Self {
        Board(tiles)
    }

    /// Build from raw exponents (0 = empty).
    ///
    /// Panics if any exponent exceeds [`MAX_EXPONENT`].
    pub fn from_exponents(exponents: [u8; CELLS]) -> Self {
        Board(exponents.map(|e| {
            Tile::from_exponent(e).unwrap_or_else(|| panic!("tile exponent {e} out of range"))
        }))
    }

    /// Build from face values (0 = empty). Rejects wrong lengths and non powers of two.
    pub fn from_values(values: &[u64]) -> Result<Self, ParseError> {
        if values.len() != CELLS {
            return Err(ParseError::BoardLength { expected: CELLS, found: values.len() });
        }
        let mut tiles = [Tile::EMPTY; CELLS];
        for (slot, &v) in tiles.iter_mut().zip(values) {
            *slot = Tile::from_value(v)?;
        }
        Ok(Board(tiles))
    }

    /// Build from decimal tokens as the browser front end sends them ("0" or "" = empty).
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, ParseError> {
        if tokens.len() != CELLS {
            return Err(ParseError::BoardLength { expected: CELLS, found: tokens.len() });
        }
        let mut values = [0u64; CELLS];
        for (slot, token) in values.iter_mut().zip(tokens) {
            let t = token.as_ref().trim();
            *slot = if t.is_empty() {
                0
            } else {
                t.parse().map_err(|_| ParseError::InvalidToken(t.to_string()))?
            };
        }
        Board::from_values(&values)
    }

    #[inline]
    pub fn tiles(&self) -> &[Tile; CELLS] {
        &self.0
    }

    #[inline]
    pub fn tile(&self, idx: usize) -> Tile {
        self.0[idx]
    }

    pub fn exponents(&self) -> [u8; CELLS] {
        self.0.map(Tile::exponent)
    }

    pub fn to_values(&self) -> [u64; CELLS] {
        self.0.map(Tile::value)
    }

    /// Copy of this board with `idx` set to `tile`.
    #[inline]
    pub fn with_tile(mut self, idx: usize, tile: Tile) -> Self {
        self.0[idx] = tile;
        self
    }

    /// See [`perform_move`].
    #[inline]
    pub fn perform_move(&self, dir: Move) -> MoveResult {
        perform_move(self, dir)
    }

    /// Board resulting from sliding/merging in `dir`, without the action list.
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        perform_move(&self, dir).board
    }

    pub fn count_empty(&self) -> usize {
        self.0.iter().filter(|t| t.is_empty()).count()
    }

    /// Indices of empty cells in board order.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().filter(|(_, t)| t.is_empty()).map(|(i, _)| i)
    }

    /// Highest face value on the board (0 when empty).
    pub fn highest_tile(&self) -> u64 {
        self.0.iter().copied().max().unwrap_or(Tile::EMPTY).value()
    }

    /// First board index holding the highest tile.
    pub fn highest_tile_index(&self) -> usize {
        let max = self.0.iter().copied().max().unwrap_or(Tile::EMPTY);
        self.0.iter().position(|&t| t == max).unwrap_or(0)
    }

    pub fn has_won(&self, threshold: u64) -> bool {
        self.0.iter().any(|t| t.value() >= threshold)
    }

    /// True iff some non-empty cell equals its right or bottom neighbour.
    pub fn can_merge(&self) -> bool {
        (0..CELLS).any(|i| {
            let t = self.0[i];
            !t.is_empty()
                && ((i % SIZE != SIZE - 1 && self.0[i + 1] == t)
                    || (i + SIZE < CELLS && self.0[i + SIZE] == t))
        })
    }

    /// No empty cell and no adjacent equal pair.
    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.count_empty() == 0 && !self.can_merge()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.to_values())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..SIZE {
            if row > 0 {
                writeln!(f, "-------------------------------")?;
            }
            let cells: Vec<String> =
                (0..SIZE).map(|col| format_val(self.0[row * SIZE + col])).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = ParseError;

    /// Whitespace and/or comma separated tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        Board::from_tokens(&tokens)
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_values())
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<u64>::deserialize(deserializer)?;
        Board::from_values(&values).map_err(de::Error::custom)
    }
}

fn format_val(tile: Tile) -> String {
    if tile.is_empty() {
        return " ".repeat(7);
    }
    format!("{:^7}", tile.value())
}

/// A single tile's movement within one move.
///
/// `value` is the tile as it was before any merge. Two merge actions
/// sharing `to` form a merging pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileAction {
    pub from: usize,
    pub to: usize,
    pub value: Tile,
    pub is_merge: bool,
}

/// Outcome of [`perform_move`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    #[serde(rename = "newBoard")]
    pub board: Board,
    pub score_change: u64,
    pub actions: Vec<TileAction>,
    pub has_changed: bool,
}

/// Outcome of [`resolve_line`]; action indices are line positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResolution {
    pub merged: [Tile; SIZE],
    pub score: u64,
    pub actions: Vec<TileAction>,
}

/// Slide and merge one line toward position 0.
///
/// Each output slot consumes either one tile or the two equal tiles mapped
/// to it, so `2 2 2 2` becomes `4 4`, never `8`.
///
/// ```
/// use tile_advisor::engine::{resolve_line, Tile};
/// let two = Tile::TWO;
/// let r = resolve_line(&[two, two, two, two]);
/// assert_eq!(r.merged, [Tile::FOUR, Tile::FOUR, Tile::EMPTY, Tile::EMPTY]);
/// assert_eq!(r.score, 8);
/// ```
pub fn resolve_line(line: &[Tile; SIZE]) -> LineResolution {
    let survivors: Vec<(usize, Tile)> =
        line.iter().copied().enumerate().filter(|(_, t)| !t.is_empty()).collect();

    let mut merged = [Tile::EMPTY; SIZE];
    let mut score = 0;
    let mut actions = Vec::with_capacity(survivors.len());
    let mut out = 0;
    let mut i = 0;
    while i < survivors.len() {
        let (from, tile) = survivors[i];
        match survivors.get(i + 1) {
            Some(&(next_from, next)) if next == tile => {
                let combined = tile.merged();
                score += combined.value();
                actions.push(TileAction { from, to: out, value: tile, is_merge: true });
                actions.push(TileAction { from: next_from, to: out, value: next, is_merge: true });
                merged[out] = combined;
                i += 2;
            }
            _ => {
                actions.push(TileAction { from, to: out, value: tile, is_merge: false });
                merged[out] = tile;
                i += 1;
            }
        }
        out += 1;
    }
    LineResolution { merged, score, actions }
}

/// Slide/merge every line of `board` toward `dir`. No randomness.
///
/// Actions come line by line (row or column 0 first), each line in
/// traversal order from the destination edge.
pub fn perform_move(board: &Board, dir: Move) -> MoveResult {
    let mut cells = [Tile::EMPTY; CELLS];
    let mut score_change = 0;
    let mut actions = Vec::with_capacity(CELLS);

    for line in 0..SIZE {
        let indices = dir.line_indices(line);
        let resolved = resolve_line(&indices.map(|idx| board.0[idx]));
        score_change += resolved.score;
        actions.extend(resolved.actions.into_iter().map(|a| TileAction {
            from: indices[a.from],
            to: indices[a.to],
            ..a
        }));
        for (pos, &idx) in indices.iter().enumerate() {
            cells[idx] = resolved.merged[pos];
        }
    }

    let new_board = Board(cells);
    MoveResult { has_changed: new_board != *board, board: new_board, score_change, actions }
}
