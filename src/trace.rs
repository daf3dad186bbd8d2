//! Binary record of a played game.
//!
//! Layout (little-endian): magic `T2A1`, version, endian flag, steps u32,
//! start unix seconds u64, elapsed seconds f32, final score u64, highest tile
//! u64, engine string (u16 length + bytes), `steps + 1` boards of 16 exponent
//! bytes, `steps` move codes, then a CRC32C of everything before it.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::engine::{Board, Move, Tile, CELLS};

const MAGIC: &[u8; 4] = b"T2A1";
const VERSION: u8 = 1;
const ENDIAN_LE: u8 = 0;
// magic + version + endian + steps + start + elapsed + score + tile + engine_len
const HEADER_LEN: usize = 4 + 1 + 1 + 4 + 8 + 4 + 8 + 8 + 2;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub steps: u32,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
    pub final_score: u64,
    pub highest_tile: u64,
    pub engine_str: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub meta: Meta,
    pub states: Vec<Board>, // length = steps + 1
    pub moves: Vec<Move>,   // length = steps
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("unsupported endianness")]
    Endianness,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
    #[error("invalid tile exponent {0}")]
    InvalidTile(u8),
    #[error("invalid move code {0}")]
    InvalidMove(u8),
}

struct Reader<'a> {
    bytes: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TraceError> {
        let end = self.off.checked_add(n).ok_or(TraceError::Malformed)?;
        let out = self.bytes.get(self.off..end).ok_or(TraceError::Malformed)?;
        self.off = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], TraceError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn u16(&mut self) -> Result<u16, TraceError> { Ok(u16::from_le_bytes(self.array()?)) }
    fn u32(&mut self) -> Result<u32, TraceError> { Ok(u32::from_le_bytes(self.array()?)) }
    fn u64(&mut self) -> Result<u64, TraceError> { Ok(u64::from_le_bytes(self.array()?)) }
    fn f32(&mut self) -> Result<f32, TraceError> { self.u32().map(f32::from_bits) }
}

pub fn encode_run(meta: &Meta, states: &[Board], moves: &[Move]) -> Vec<u8> {
    assert_eq!(states.len(), meta.steps as usize + 1);
    assert_eq!(moves.len(), meta.steps as usize);

    let engine_bytes = meta.engine_str.as_deref().map(str::as_bytes).unwrap_or(&[]);
    let engine_len: u16 = engine_bytes.len().try_into().expect("engine_str too long for u16 length");

    let payload_len = engine_bytes.len() + states.len() * CELLS + moves.len();
    let mut buf = Vec::with_capacity(HEADER_LEN + payload_len + CHECKSUM_LEN);

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.push(ENDIAN_LE);
    buf.extend_from_slice(&meta.steps.to_le_bytes());
    buf.extend_from_slice(&meta.start_unix_s.to_le_bytes());
    buf.extend_from_slice(&meta.elapsed_s.to_bits().to_le_bytes());
    buf.extend_from_slice(&meta.final_score.to_le_bytes());
    buf.extend_from_slice(&meta.highest_tile.to_le_bytes());
    buf.extend_from_slice(&engine_len.to_le_bytes());
    buf.extend_from_slice(engine_bytes);

    for b in states { buf.extend_from_slice(&b.exponents()); }
    buf.extend(moves.iter().map(|m| m.to_u8()));

    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf
}

pub fn write_run_to_path<P: AsRef<Path>>(path: P, meta: &Meta, states: &[Board], moves: &[Move]) -> Result<(), TraceError> {
    let data = encode_run(meta, states, moves);
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    Ok(())
}

pub fn parse_run_bytes(bytes: &[u8]) -> Result<Run, TraceError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(TraceError::Malformed);
    }

    // Validate checksum before reading any field
    let (content, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let file_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if file_crc != crc32c::crc32c(content) { return Err(TraceError::Checksum); }

    let mut r = Reader { bytes: content, off: 0 };
    if r.take(4)? != MAGIC { return Err(TraceError::MagicOrVersion); }
    if r.array::<1>()?[0] != VERSION { return Err(TraceError::MagicOrVersion); }
    if r.array::<1>()?[0] != ENDIAN_LE { return Err(TraceError::Endianness); }

    let steps = r.u32()?;
    let start_unix_s = r.u64()?;
    let elapsed_s = r.f32()?;
    let final_score = r.u64()?;
    let highest_tile = r.u64()?;
    let engine_len = r.u16()? as usize;
    let engine_str = match r.take(engine_len)? {
        [] => None,
        b => std::str::from_utf8(b).ok().map(str::to_string),
    };

    let states = (0..=steps as usize)
        .map(|_| -> Result<Board, TraceError> {
            let raw: [u8; CELLS] = r.array()?;
            let mut tiles = [Tile::EMPTY; CELLS];
            for (slot, e) in tiles.iter_mut().zip(raw) {
                *slot = Tile::from_exponent(e).ok_or(TraceError::InvalidTile(e))?;
            }
            Ok(Board::from_tiles(tiles))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let moves = r
        .take(steps as usize)?
        .iter()
        .map(|&c| Move::from_u8(c).ok_or(TraceError::InvalidMove(c)))
        .collect::<Result<Vec<_>, _>>()?;

    if r.off != content.len() { return Err(TraceError::Malformed); }

    let meta = Meta { steps, start_unix_s, elapsed_s, final_score, highest_tile, engine_str };
    Ok(Run { meta, states, moves })
}

pub fn parse_run_file<P: AsRef<Path>>(path: P) -> Result<Run, TraceError> {
    let data = fs::read(path)?;
    parse_run_bytes(&data)
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample() -> (Meta, Vec<Board>, Vec<Move>) {
        let b0: Board = "2 0 0 0 0 0 0 0 0 0 0 0 0 0 0 2".parse().unwrap();
        let b1 = b0.shift(Move::Left).with_tile(5, Tile::FOUR);
        let b2 = b1.shift(Move::Up).with_tile(15, Tile::TWO);
        let moves = vec![Move::Left, Move::Up];
        let meta = Meta {
            steps: moves.len() as u32,
            start_unix_s: 1_700_000_000,
            elapsed_s: 12.34,
            final_score: 4,
            highest_tile: 4,
            engine_str: Some("expectimax-d3".to_string()),
        };
        (meta, vec![b0, b1, b2], moves)
    }

    #[test]
    fn file_round_trip() {
        let (meta, states, moves) = sample();
        let tmp = NamedTempFile::new().unwrap();
        write_run_to_path(tmp.path(), &meta, &states, &moves).unwrap();
        let run = parse_run_file(tmp.path()).unwrap();
        assert_eq!(run.meta, meta);
        assert_eq!(run.states, states);
        assert_eq!(run.moves, moves);
    }

    #[test]
    fn checksum_mismatch() {
        let (meta, states, moves) = sample();
        let mut bytes = encode_run(&meta, &states, &moves);
        bytes[HEADER_LEN] ^= 0xFF;
        assert!(matches!(parse_run_bytes(&bytes), Err(TraceError::Checksum)));
    }

    #[test]
    fn malformed_bounds() {
        let (meta, states, moves) = sample();
        let mut bytes = encode_run(&meta, &states, &moves);
        bytes.truncate(bytes.len() - 5);
        // truncation breaks the checksum first
        assert!(parse_run_bytes(&bytes).is_err());
        assert!(matches!(parse_run_bytes(&bytes[..10]), Err(TraceError::Malformed)));
    }

    #[test]
    fn bad_magic_with_valid_checksum() {
        let (meta, states, moves) = sample();
        let mut bytes = encode_run(&meta, &states, &moves);
        let body = bytes.len() - CHECKSUM_LEN;
        bytes[0] = b'X';
        let crc = crc32c::crc32c(&bytes[..body]);
        bytes[body..].copy_from_slice(&crc.to_le_bytes());
        assert!(matches!(parse_run_bytes(&bytes), Err(TraceError::MagicOrVersion)));
    }

    #[test]
    fn invalid_move_code() {
        let (meta, states, moves) = sample();
        let mut bytes = encode_run(&meta, &states, &moves);
        let body = bytes.len() - CHECKSUM_LEN;
        bytes[body - 1] = 9;
        let crc = crc32c::crc32c(&bytes[..body]);
        bytes[body..].copy_from_slice(&crc.to_le_bytes());
        assert!(matches!(parse_run_bytes(&bytes), Err(TraceError::InvalidMove(9))));
    }
}
