//! Board representation: piece bitboards, packed metadata, make/unmake with
//! incremental Zobrist hashing and incremental evaluation terms.
//!
//! The board owns its undo stack; `make_move` pushes a record and
//! `unmake_move` pops it, restoring the position byte for byte (hash, clocks
//! and evaluation increments included). Nothing outside this module mutates
//! position state.

use std::fmt;

use crate::bits;
use crate::error::EngineError;
use crate::eval;
use crate::magic;
use crate::moves::{
    is_en_passant, is_promotion, move_flags, move_from, move_to, promotion_kind, Color, Move,
    PieceKind, FLAG_DOUBLE_PUSH, FLAG_KING_CASTLE, FLAG_QUEEN_CASTLE, MOVE_NULL,
};
use crate::zobrist;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Castling-rights bits.
pub const CASTLE_WK: u8 = 1;
pub const CASTLE_WQ: u8 = 2;
pub const CASTLE_BK: u8 = 4;
pub const CASTLE_BQ: u8 = 8;

/// Per-square mask of castling rights that survive a piece moving from or to
/// the square. Only the king and rook home squares clear anything.
const CASTLE_MASK: [u8; 64] = {
    let mut mask = [0xFu8; 64];
    mask[0] = 0xF & !CASTLE_WQ; // a1
    mask[4] = 0xF & !(CASTLE_WK | CASTLE_WQ); // e1
    mask[7] = 0xF & !CASTLE_WK; // h1
    mask[56] = 0xF & !CASTLE_BQ; // a8
    mask[60] = 0xF & !(CASTLE_BK | CASTLE_BQ); // e8
    mask[63] = 0xF & !CASTLE_BK; // h8
    mask
};

/// Record pushed by make_move / make_null_move and consumed by the matching
/// unmake. Holds everything that cannot be recomputed cheaply.
#[derive(Debug, Clone, Copy)]
struct Undo {
    mv: Move,
    captured: Option<PieceKind>,
    castling: u8,
    ep: Option<u8>,
    halfmove: u16,
    fullmove: u16,
    zobrist: u64,
    material: i16,
    pst_mg: i32,
    pst_eg: i32,
    phase: i16,
}

#[derive(Clone)]
pub struct Board {
    /// Indexed by color * 6 + piece kind.
    pieces: [u64; 12],
    occ_color: [u64; 2],
    occ: u64,
    side: Color,
    castling: u8,
    ep: Option<u8>,
    halfmove: u16,
    fullmove: u16,
    zobrist: u64,
    // Incremental evaluation terms, always from White's point of view.
    material: i16,
    pst_mg: i32,
    pst_eg: i32,
    phase: i16,
    undo_stack: Vec<Undo>,
    // Hashes of all earlier positions on the current line, for repetition
    // detection. Null moves are not recorded.
    history: Vec<u64>,
}

impl Board {
    /// Standard starting position.
    pub fn new() -> Self {
        Self::from_fen(START_FEN).expect("start position FEN is valid")
    }

    fn empty() -> Self {
        Self {
            pieces: [0; 12],
            occ_color: [0; 2],
            occ: 0,
            side: Color::White,
            castling: 0,
            ep: None,
            halfmove: 0,
            fullmove: 1,
            zobrist: 0,
            material: 0,
            pst_mg: 0,
            pst_eg: 0,
            phase: 0,
            undo_stack: Vec::with_capacity(128),
            history: Vec::with_capacity(128),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[inline]
    pub fn pieces(&self, kind: PieceKind, color: Color) -> u64 {
        self.pieces[color.index() * 6 + kind.index()]
    }

    #[inline]
    pub fn occupied(&self) -> u64 {
        self.occ
    }

    #[inline]
    pub fn occupied_by(&self, color: Color) -> u64 {
        self.occ_color[color.index()]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side
    }

    #[inline]
    pub fn castling_rights(&self) -> u8 {
        self.castling
    }

    #[inline]
    pub fn ep_square(&self) -> Option<u8> {
        self.ep
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove
    }

    #[inline]
    pub fn zobrist(&self) -> u64 {
        self.zobrist
    }

    #[inline]
    pub fn material_balance(&self) -> i16 {
        self.material
    }

    #[inline]
    pub fn pst_mg(&self) -> i32 {
        self.pst_mg
    }

    #[inline]
    pub fn pst_eg(&self) -> i32 {
        self.pst_eg
    }

    #[inline]
    pub fn phase(&self) -> i16 {
        self.phase
    }

    #[inline]
    pub fn king_sq(&self, color: Color) -> usize {
        let king = self.pieces(PieceKind::King, color);
        debug_assert!(king != 0, "side without a king");
        king.trailing_zeros() as usize
    }

    /// Piece kind and color on a square, if any.
    pub fn piece_on(&self, sq: usize) -> Option<(PieceKind, Color)> {
        let bit = 1u64 << sq;
        let color = if self.occ_color[0] & bit != 0 {
            Color::White
        } else if self.occ_color[1] & bit != 0 {
            Color::Black
        } else {
            return None;
        };
        for kind in PieceKind::ALL {
            if self.pieces(kind, color) & bit != 0 {
                return Some((kind, color));
            }
        }
        unreachable!("occupancy and piece bitboards out of sync");
    }

    #[inline]
    fn piece_kind_on(&self, sq: usize, color: Color) -> Option<PieceKind> {
        let bit = 1u64 << sq;
        if self.occ_color[color.index()] & bit == 0 {
            return None;
        }
        PieceKind::ALL
            .into_iter()
            .find(|&kind| self.pieces(kind, color) & bit != 0)
    }

    /// Does any piece of `by` attack `sq` under the current occupancy?
    pub fn is_square_attacked(&self, sq: usize, by: Color) -> bool {
        // A pawn of `by` attacks sq exactly when a pawn of the other color
        // standing on sq would attack the pawn's square.
        if bits::pawn_attacks(by.opposite().index(), sq) & self.pieces(PieceKind::Pawn, by) != 0 {
            return true;
        }
        if bits::knight_attacks(sq) & self.pieces(PieceKind::Knight, by) != 0 {
            return true;
        }
        if bits::king_attacks(sq) & self.pieces(PieceKind::King, by) != 0 {
            return true;
        }
        let queens = self.pieces(PieceKind::Queen, by);
        if magic::bishop_attacks(sq, self.occ) & (self.pieces(PieceKind::Bishop, by) | queens) != 0
        {
            return true;
        }
        magic::rook_attacks(sq, self.occ) & (self.pieces(PieceKind::Rook, by) | queens) != 0
    }

    #[inline]
    pub fn in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_sq(color), color.opposite())
    }

    /// Non-pawn, non-king material for `color`; gates null-move pruning.
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        self.pieces(PieceKind::Knight, color)
            | self.pieces(PieceKind::Bishop, color)
            | self.pieces(PieceKind::Rook, color)
            | self.pieces(PieceKind::Queen, color)
            != 0
    }

    /// Threefold repetition: the current position occurred at least twice
    /// before. Only positions since the last irreversible move can match.
    pub fn is_repetition(&self) -> bool {
        let span = (self.halfmove as usize).min(self.history.len());
        let mut seen = 0;
        for &hash in self.history.iter().rev().take(span) {
            if hash == self.zobrist {
                seen += 1;
                if seen >= 2 {
                    return true;
                }
            }
        }
        false
    }

    /// Draw by threefold repetition or the 50-move rule.
    pub fn is_draw(&self) -> bool {
        self.halfmove >= 100 || self.is_repetition()
    }

    // ------------------------------------------------------------------
    // Make / unmake
    // ------------------------------------------------------------------

    #[inline]
    fn add_piece(&mut self, sq: usize, kind: PieceKind, color: Color) {
        let bit = 1u64 << sq;
        debug_assert!(self.occ & bit == 0, "square already occupied");
        self.pieces[color.index() * 6 + kind.index()] |= bit;
        self.occ_color[color.index()] |= bit;
        self.occ |= bit;
        self.zobrist ^= zobrist::piece_key(kind, color, sq);

        let pst_sq = if color == Color::White { sq } else { sq ^ 56 };
        let (mg, eg) = eval::pst(kind, pst_sq);
        let sign = if color == Color::White { 1 } else { -1 };
        self.material += sign * eval::MATERIAL[kind.index()];
        self.pst_mg += sign as i32 * mg as i32;
        self.pst_eg += sign as i32 * eg as i32;
        self.phase += eval::PHASE_WEIGHT[kind.index()];
    }

    #[inline]
    fn remove_piece(&mut self, sq: usize, kind: PieceKind, color: Color) {
        let bit = 1u64 << sq;
        debug_assert!(self.pieces(kind, color) & bit != 0, "piece not on square");
        self.pieces[color.index() * 6 + kind.index()] &= !bit;
        self.occ_color[color.index()] &= !bit;
        self.occ &= !bit;
        self.zobrist ^= zobrist::piece_key(kind, color, sq);

        let pst_sq = if color == Color::White { sq } else { sq ^ 56 };
        let (mg, eg) = eval::pst(kind, pst_sq);
        let sign = if color == Color::White { 1 } else { -1 };
        self.material -= sign * eval::MATERIAL[kind.index()];
        self.pst_mg -= sign as i32 * mg as i32;
        self.pst_eg -= sign as i32 * eg as i32;
        self.phase -= eval::PHASE_WEIGHT[kind.index()];
    }

    /// Apply a move. The move must come from this position's pseudo-legal or
    /// legal move set; legality filtering is the generator's business.
    pub fn make_move(&mut self, mv: Move) {
        let from = move_from(mv);
        let to = move_to(mv);
        let flags = move_flags(mv);
        let us = self.side;
        let them = us.opposite();

        let moving = self
            .piece_kind_on(from, us)
            .expect("make_move: no own piece on from-square");

        let (captured, capture_sq) = if is_en_passant(mv) {
            let victim_sq = if us == Color::White { to - 8 } else { to + 8 };
            (Some(PieceKind::Pawn), victim_sq)
        } else if let Some(kind) = self.piece_kind_on(to, them) {
            (Some(kind), to)
        } else {
            (None, to)
        };

        self.history.push(self.zobrist);
        self.undo_stack.push(Undo {
            mv,
            captured,
            castling: self.castling,
            ep: self.ep,
            halfmove: self.halfmove,
            fullmove: self.fullmove,
            zobrist: self.zobrist,
            material: self.material,
            pst_mg: self.pst_mg,
            pst_eg: self.pst_eg,
            phase: self.phase,
        });

        // Metadata keys out; piece keys are handled by add/remove.
        self.zobrist ^= zobrist::castling_key(self.castling);
        if let Some(ep) = self.ep {
            self.zobrist ^= zobrist::ep_key(ep);
        }

        if let Some(kind) = captured {
            self.remove_piece(capture_sq, kind, them);
        }
        self.remove_piece(from, moving, us);
        let placed = promotion_kind(mv).unwrap_or(moving);
        self.add_piece(to, placed, us);

        if flags == FLAG_KING_CASTLE || flags == FLAG_QUEEN_CASTLE {
            let (rook_from, rook_to) = match (us, flags) {
                (Color::White, FLAG_KING_CASTLE) => (7, 5),
                (Color::White, _) => (0, 3),
                (Color::Black, FLAG_KING_CASTLE) => (63, 61),
                (Color::Black, _) => (56, 59),
            };
            self.remove_piece(rook_from, PieceKind::Rook, us);
            self.add_piece(rook_to, PieceKind::Rook, us);
        }

        self.castling &= CASTLE_MASK[from] & CASTLE_MASK[to];
        self.ep = if flags == FLAG_DOUBLE_PUSH {
            Some(((from + to) / 2) as u8)
        } else {
            None
        };

        self.zobrist ^= zobrist::castling_key(self.castling);
        if let Some(ep) = self.ep {
            self.zobrist ^= zobrist::ep_key(ep);
        }
        self.zobrist ^= zobrist::side_key();

        if moving == PieceKind::Pawn || captured.is_some() {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }
        if us == Color::Black {
            self.fullmove += 1;
        }
        self.side = them;

        debug_assert_eq!(self.zobrist, zobrist::compute(self), "incremental hash drift");
        debug_assert_eq!(self.occ, self.occ_color[0] | self.occ_color[1]);
    }

    /// Reverse the most recent make_move.
    pub fn unmake_move(&mut self) {
        let undo = self
            .undo_stack
            .pop()
            .expect("unmake_move without matching make_move");
        debug_assert!(undo.mv != MOVE_NULL, "unmake_move on a null move");
        self.history.pop();

        let mv = undo.mv;
        let from = move_from(mv);
        let to = move_to(mv);
        let flags = move_flags(mv);
        let us = self.side.opposite(); // the side that made the move
        let them = self.side;

        let placed = if is_promotion(mv) {
            promotion_kind(mv).unwrap()
        } else {
            self.piece_kind_on(to, us)
                .expect("unmake_move: moved piece missing")
        };
        let moving = if is_promotion(mv) {
            PieceKind::Pawn
        } else {
            placed
        };

        self.remove_piece(to, placed, us);
        self.add_piece(from, moving, us);

        if let Some(kind) = undo.captured {
            let capture_sq = if is_en_passant(mv) {
                if us == Color::White {
                    to - 8
                } else {
                    to + 8
                }
            } else {
                to
            };
            self.add_piece(capture_sq, kind, them);
        }

        if flags == FLAG_KING_CASTLE || flags == FLAG_QUEEN_CASTLE {
            let (rook_from, rook_to) = match (us, flags) {
                (Color::White, FLAG_KING_CASTLE) => (7, 5),
                (Color::White, _) => (0, 3),
                (Color::Black, FLAG_KING_CASTLE) => (63, 61),
                (Color::Black, _) => (56, 59),
            };
            self.remove_piece(rook_to, PieceKind::Rook, us);
            self.add_piece(rook_from, PieceKind::Rook, us);
        }

        self.side = us;
        self.castling = undo.castling;
        self.ep = undo.ep;
        self.halfmove = undo.halfmove;
        self.fullmove = undo.fullmove;
        // The saved values win over whatever the piece shuffling re-derived.
        self.zobrist = undo.zobrist;
        self.material = undo.material;
        self.pst_mg = undo.pst_mg;
        self.pst_eg = undo.pst_eg;
        self.phase = undo.phase;
    }

    /// Pass the turn without moving. Illegal while in check; used only by
    /// null-move pruning.
    pub fn make_null_move(&mut self) {
        debug_assert!(!self.in_check(self.side), "null move while in check");
        self.undo_stack.push(Undo {
            mv: MOVE_NULL,
            captured: None,
            castling: self.castling,
            ep: self.ep,
            halfmove: self.halfmove,
            fullmove: self.fullmove,
            zobrist: self.zobrist,
            material: self.material,
            pst_mg: self.pst_mg,
            pst_eg: self.pst_eg,
            phase: self.phase,
        });

        if let Some(ep) = self.ep.take() {
            self.zobrist ^= zobrist::ep_key(ep);
        }
        self.zobrist ^= zobrist::side_key();
        self.side = self.side.opposite();
    }

    pub fn unmake_null_move(&mut self) {
        let undo = self
            .undo_stack
            .pop()
            .expect("unmake_null_move without matching make_null_move");
        debug_assert!(undo.mv == MOVE_NULL, "unmake_null_move on a real move");
        self.side = self.side.opposite();
        self.ep = undo.ep;
        self.zobrist = undo.zobrist;
    }

    // ------------------------------------------------------------------
    // FEN
    // ------------------------------------------------------------------

    /// Parse a FEN string, strictly: exactly six fields, rank sums of eight,
    /// and the resulting position must satisfy the board invariants.
    pub fn from_fen(fen: &str) -> Result<Board, EngineError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(EngineError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut board = Board::empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(EngineError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(run) = ch.to_digit(10) {
                    if !(1..=8).contains(&run) {
                        return Err(EngineError::InvalidFen(format!("bad digit '{ch}'")));
                    }
                    file += run as usize;
                } else {
                    let color = if ch.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    let kind = match ch.to_ascii_lowercase() {
                        'p' => PieceKind::Pawn,
                        'n' => PieceKind::Knight,
                        'b' => PieceKind::Bishop,
                        'r' => PieceKind::Rook,
                        'q' => PieceKind::Queen,
                        'k' => PieceKind::King,
                        _ => {
                            return Err(EngineError::InvalidFen(format!("bad piece '{ch}'")));
                        }
                    };
                    if file >= 8 {
                        return Err(EngineError::InvalidFen(format!(
                            "rank {} overflows",
                            rank + 1
                        )));
                    }
                    board.add_piece(rank * 8 + file, kind, color);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(EngineError::InvalidFen(format!(
                    "rank {} sums to {file}, not 8",
                    rank + 1
                )));
            }
        }

        board.side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            s => return Err(EngineError::InvalidFen(format!("bad side '{s}'"))),
        };

        board.castling = 0;
        if fields[2] != "-" {
            for ch in fields[2].chars() {
                board.castling |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => {
                        return Err(EngineError::InvalidFen(format!("bad castling '{ch}'")));
                    }
                };
            }
        }

        board.ep = match fields[3] {
            "-" => None,
            s => {
                let sq = crate::moves::parse_square(s)
                    .map_err(|_| EngineError::InvalidFen(format!("bad ep square '{s}'")))?;
                let expected_rank = if board.side == Color::White { 5 } else { 2 };
                if sq / 8 != expected_rank {
                    return Err(EngineError::InvalidFen(format!(
                        "ep square '{s}' on wrong rank"
                    )));
                }
                Some(sq as u8)
            }
        };

        board.halfmove = fields[4]
            .parse()
            .map_err(|_| EngineError::InvalidFen(format!("bad halfmove '{}'", fields[4])))?;
        board.fullmove = fields[5]
            .parse()
            .map_err(|_| EngineError::InvalidFen(format!("bad fullmove '{}'", fields[5])))?;

        board.validate()?;
        // add_piece built the piece keys; fold in the metadata keys.
        board.zobrist = zobrist::compute(&board);
        Ok(board)
    }

    /// Structural invariants checked after FEN parsing.
    fn validate(&self) -> Result<(), EngineError> {
        for color in [Color::White, Color::Black] {
            let kings = self.pieces(PieceKind::King, color).count_ones();
            if kings != 1 {
                return Err(EngineError::InvalidFen(format!(
                    "{kings} kings for one side"
                )));
            }
        }
        let pawns = self.pieces(PieceKind::Pawn, Color::White)
            | self.pieces(PieceKind::Pawn, Color::Black);
        if pawns & (bits::RANK_1 | bits::RANK_8) != 0 {
            return Err(EngineError::InvalidFen(
                "pawn on a promotion rank".to_string(),
            ));
        }
        if self.in_check(self.side.opposite()) {
            return Err(EngineError::InvalidFen(
                "side not to move is in check".to_string(),
            ));
        }
        // Castling rights demand king and rook on their home squares.
        let checks = [
            (CASTLE_WK, PieceKind::King, Color::White, 4usize),
            (CASTLE_WK, PieceKind::Rook, Color::White, 7),
            (CASTLE_WQ, PieceKind::King, Color::White, 4),
            (CASTLE_WQ, PieceKind::Rook, Color::White, 0),
            (CASTLE_BK, PieceKind::King, Color::Black, 60),
            (CASTLE_BK, PieceKind::Rook, Color::Black, 63),
            (CASTLE_BQ, PieceKind::King, Color::Black, 60),
            (CASTLE_BQ, PieceKind::Rook, Color::Black, 56),
        ];
        for (right, kind, color, sq) in checks {
            if self.castling & right != 0 && self.pieces(kind, color) & (1u64 << sq) == 0 {
                return Err(EngineError::InvalidFen(
                    "castling rights without king/rook on home square".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Render the position as FEN; round-trips `from_fen` exactly.
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_on(rank * 8 + file) {
                    None => empty += 1,
                    Some((kind, color)) => {
                        if empty > 0 {
                            fen.push(char::from_digit(empty, 10).unwrap());
                            empty = 0;
                        }
                        let ch = match kind {
                            PieceKind::Pawn => 'p',
                            PieceKind::Knight => 'n',
                            PieceKind::Bishop => 'b',
                            PieceKind::Rook => 'r',
                            PieceKind::Queen => 'q',
                            PieceKind::King => 'k',
                        };
                        fen.push(if color == Color::White {
                            ch.to_ascii_uppercase()
                        } else {
                            ch
                        });
                    }
                }
            }
            if empty > 0 {
                fen.push(char::from_digit(empty, 10).unwrap());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side == Color::White { 'w' } else { 'b' });

        fen.push(' ');
        if self.castling == 0 {
            fen.push('-');
        } else {
            for (right, ch) in [
                (CASTLE_WK, 'K'),
                (CASTLE_WQ, 'Q'),
                (CASTLE_BK, 'k'),
                (CASTLE_BQ, 'q'),
            ] {
                if self.castling & right != 0 {
                    fen.push(ch);
                }
            }
        }

        fen.push(' ');
        match self.ep {
            None => fen.push('-'),
            Some(sq) => fen.push_str(&crate::moves::square_name(sq as usize)),
        }

        fen.push_str(&format!(" {} {}", self.halfmove, self.fullmove));
        fen
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let ch = match self.piece_on(rank * 8 + file) {
                    None => '.',
                    Some((kind, color)) => {
                        let ch = match kind {
                            PieceKind::Pawn => 'p',
                            PieceKind::Knight => 'n',
                            PieceKind::Bishop => 'b',
                            PieceKind::Rook => 'r',
                            PieceKind::Queen => 'q',
                            PieceKind::King => 'k',
                        };
                        if color == Color::White {
                            ch.to_ascii_uppercase()
                        } else {
                            ch
                        }
                    }
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
