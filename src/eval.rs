//! Static evaluation: material plus tapered piece-square tables.
//!
//! All tables are stored from White's point of view with A1 = index 0; a
//! black piece reads the vertically mirrored square (`sq ^ 56`). The board
//! keeps the material balance, the middlegame/endgame PST sums and the game
//! phase incrementally up to date, so evaluating a position is O(1).
//!
//! Phase runs from 24 (full material) down to 0 (bare kings); the PST
//! contribution interpolates linearly between the middlegame and endgame
//! sums. Only the king has genuinely different tables: in the middlegame it
//! hides behind its pawn shield, in the endgame it centralizes.

use crate::board::Board;
use crate::moves::{Color, PieceKind};

/// Piece values in centipawns, indexed by `PieceKind`. The king carries no
/// material term; its loss is expressed through mate scores.
pub const MATERIAL: [i16; 6] = [100, 320, 330, 500, 900, 0];

/// Contribution of each piece kind to the game phase.
pub const PHASE_WEIGHT: [i16; 6] = [0, 1, 1, 2, 4, 0];

/// Phase of a position with full material.
pub const MAX_PHASE: i16 = 24;

/// Above this material imbalance positional terms are dwarfed and the
/// evaluation returns material alone.
pub const LAZY_MATERIAL_MARGIN: i16 = 1500;

#[rustfmt::skip]
const PAWN_PST: [i16; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10, -20, -20,  10,  10,   5,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,   5,  10,  25,  25,  10,   5,   5,
     10,  10,  20,  30,  30,  20,  10,  10,
     50,  50,  50,  50,  50,  50,  50,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i16; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_PST: [i16; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_PST: [i16; 64] = [
      0,   0,   0,   5,   5,   0,   0,   0,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      5,  10,  10,  10,  10,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_PST: [i16; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -10,   5,   5,   5,   5,   5,   0, -10,
      0,   0,   5,   5,   5,   5,   0,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,   0,   5,   5,   5,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_MG_PST: [i16; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];

#[rustfmt::skip]
const KING_EG_PST: [i16; 64] = [
    -50, -30, -30, -30, -30, -30, -30, -50,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -50, -40, -30, -20, -20, -30, -40, -50,
];

/// White-oriented middlegame/endgame PST values for a piece on `sq`.
#[inline]
pub(crate) fn pst(kind: PieceKind, sq: usize) -> (i16, i16) {
    match kind {
        PieceKind::Pawn => (PAWN_PST[sq], PAWN_PST[sq]),
        PieceKind::Knight => (KNIGHT_PST[sq], KNIGHT_PST[sq]),
        PieceKind::Bishop => (BISHOP_PST[sq], BISHOP_PST[sq]),
        PieceKind::Rook => (ROOK_PST[sq], ROOK_PST[sq]),
        PieceKind::Queen => (QUEEN_PST[sq], QUEEN_PST[sq]),
        PieceKind::King => (KING_MG_PST[sq], KING_EG_PST[sq]),
    }
}

/// Static score in centipawns from the side-to-move perspective.
pub fn evaluate(board: &Board) -> i16 {
    let material = board.material_balance();

    // Lopsided positions: material alone decides, skip the positional terms.
    if material.abs() > LAZY_MATERIAL_MARGIN {
        return if board.side_to_move() == Color::Black {
            -material
        } else {
            material
        };
    }

    let phase = board.phase().min(MAX_PHASE) as i32;
    let tapered_pst =
        (board.pst_mg() * phase + board.pst_eg() * (MAX_PHASE as i32 - phase)) / MAX_PHASE as i32;

    let score = (material as i32 + tapered_pst) as i16;
    if board.side_to_move() == Color::Black {
        -score
    } else {
        score
    }
}
