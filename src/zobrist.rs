//! Zobrist hashing with deterministic key tables.
//!
//! Keys are drawn from a fixed-seed splitmix64 stream so hashes are identical
//! across runs; that keeps transposition-table behavior reproducible and makes
//! hash mismatches debuggable. 793 keys in total: 12x64 piece-square, 16
//! castling-rights combinations, 8 en-passant files, one side-to-move toggle.

use std::sync::OnceLock;

use crate::board::Board;
use crate::moves::{Color, PieceKind};

pub struct ZobristKeys {
    /// Indexed by [color * 6 + piece_kind][square].
    pub piece_square: [[u64; 64]; 12],
    pub castling: [u64; 16],
    pub ep_file: [u64; 8],
    pub side_to_move: u64,
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

const SEED: u64 = 0x9E37_79B9_7F4A_7C15;

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn build_keys() -> ZobristKeys {
    let mut state = SEED;

    let mut piece_square = [[0u64; 64]; 12];
    for piece in piece_square.iter_mut() {
        for key in piece.iter_mut() {
            *key = splitmix64(&mut state);
        }
    }

    let mut castling = [0u64; 16];
    for key in castling.iter_mut() {
        *key = splitmix64(&mut state);
    }

    let mut ep_file = [0u64; 8];
    for key in ep_file.iter_mut() {
        *key = splitmix64(&mut state);
    }

    let side_to_move = splitmix64(&mut state);

    ZobristKeys {
        piece_square,
        castling,
        ep_file,
        side_to_move,
    }
}

#[inline]
pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(build_keys)
}

#[inline]
pub fn piece_key(kind: PieceKind, color: Color, sq: usize) -> u64 {
    keys().piece_square[color.index() * 6 + kind.index()][sq]
}

#[inline]
pub fn castling_key(rights: u8) -> u64 {
    keys().castling[(rights & 0xF) as usize]
}

#[inline]
pub fn ep_key(ep_sq: u8) -> u64 {
    keys().ep_file[(ep_sq % 8) as usize]
}

#[inline]
pub fn side_key() -> u64 {
    keys().side_to_move
}

/// Recompute the hash from scratch. The incremental hash on the Board must
/// always equal this; tests and debug assertions compare the two.
pub fn compute(board: &Board) -> u64 {
    let mut hash = 0u64;

    for color in [Color::White, Color::Black] {
        for kind in PieceKind::ALL {
            let mut bb = board.pieces(kind, color);
            while let Some(sq) = crate::bits::pop_lsb(&mut bb) {
                hash ^= piece_key(kind, color, sq);
            }
        }
    }

    if board.side_to_move() == Color::Black {
        hash ^= side_key();
    }
    hash ^= castling_key(board.castling_rights());
    if let Some(ep_sq) = board.ep_square() {
        hash ^= ep_key(ep_sq);
    }

    hash
}

/// Force key construction up front.
pub fn init() {
    let _ = keys();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        let a = build_keys();
        let b = build_keys();
        assert_eq!(a.piece_square[3][17], b.piece_square[3][17]);
        assert_eq!(a.side_to_move, b.side_to_move);
        assert_eq!(a.castling[0b1010], b.castling[0b1010]);
    }

    #[test]
    fn keys_are_distinct() {
        // splitmix64 from a fixed seed should not collide across the table.
        let k = keys();
        let mut all: Vec<u64> = Vec::new();
        for piece in &k.piece_square {
            all.extend_from_slice(piece);
        }
        all.extend_from_slice(&k.castling);
        all.extend_from_slice(&k.ep_file);
        all.push(k.side_to_move);
        let count = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), count);
    }
}
