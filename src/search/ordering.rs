//! Move ordering: hash move first, then captures by MVV-LVA, then killer
//! moves, then quiet moves by history score.

use arrayvec::ArrayVec;

use super::MAX_PLY;
use crate::board::Board;
use crate::eval::MATERIAL;
use crate::moves::{
    is_capture, is_en_passant, is_promotion, move_from, move_to, promotion_kind, Color, Move,
    MoveList, MOVE_NONE,
};

// Ordering tiers; within a tier the MVV-LVA or history score decides.
const HASH_SCORE: i32 = 10_000_000;
const CAPTURE_BASE: i32 = 1_000_000;
const PROMO_BASE: i32 = 950_000;
const KILLER_PRIMARY: i32 = 900_000;
const KILLER_SECONDARY: i32 = 800_000;

const HISTORY_MAX: i32 = 500_000;

/// Two killer slots per ply; quiet moves that caused a beta cutoff.
pub struct Killers {
    slots: [[Move; 2]; MAX_PLY],
}

impl Killers {
    pub fn new() -> Self {
        Self {
            slots: [[MOVE_NONE; 2]; MAX_PLY],
        }
    }

    pub fn clear(&mut self) {
        self.slots = [[MOVE_NONE; 2]; MAX_PLY];
    }

    pub fn store(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY || self.slots[ply][0] == mv {
            return;
        }
        self.slots[ply][1] = self.slots[ply][0];
        self.slots[ply][0] = mv;
    }

    #[inline]
    pub fn probe(&self, ply: usize, mv: Move) -> Option<usize> {
        if ply >= MAX_PLY {
            return None;
        }
        self.slots[ply].iter().position(|&k| k == mv)
    }
}

/// History heuristic, indexed by color, from-square and to-square.
/// Quiet cutoffs accumulate depth squared.
pub struct HistoryTable {
    table: Box<[[[i32; 64]; 64]; 2]>,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            table: Box::new([[[0; 64]; 64]; 2]),
        }
    }

    pub fn clear(&mut self) {
        self.table = Box::new([[[0; 64]; 64]; 2]);
    }

    pub fn bump(&mut self, color: Color, mv: Move, depth: i32) {
        let entry = &mut self.table[color.index()][move_from(mv)][move_to(mv)];
        *entry = (*entry + depth * depth).min(HISTORY_MAX);
    }

    #[inline]
    pub fn get(&self, color: Color, mv: Move) -> i32 {
        self.table[color.index()][move_from(mv)][move_to(mv)]
    }
}

/// MVV-LVA: ten times the victim's value minus the attacker's value, so the
/// victim dominates and cheap attackers break ties.
fn mvv_lva(board: &Board, mv: Move) -> i32 {
    let victim = if is_en_passant(mv) {
        MATERIAL[0]
    } else {
        board
            .piece_on(move_to(mv))
            .map(|(kind, _)| MATERIAL[kind.index()])
            .unwrap_or(0)
    };
    let attacker = board
        .piece_on(move_from(mv))
        .map(|(kind, _)| MATERIAL[kind.index()])
        .unwrap_or(0);
    victim as i32 * 10 - attacker as i32
}

fn score_move(
    board: &Board,
    mv: Move,
    hash_move: Move,
    killers: &Killers,
    history: &HistoryTable,
    ply: usize,
) -> i32 {
    if mv == hash_move {
        return HASH_SCORE;
    }
    if is_capture(mv) {
        return CAPTURE_BASE + mvv_lva(board, mv);
    }
    if is_promotion(mv) {
        return PROMO_BASE + promotion_kind(mv).map(|k| MATERIAL[k.index()] as i32).unwrap_or(0);
    }
    match killers.probe(ply, mv) {
        Some(0) => KILLER_PRIMARY,
        Some(_) => KILLER_SECONDARY,
        None => history.get(board.side_to_move(), mv),
    }
}

/// Sort `moves` best-first for the main search.
pub fn order_moves(
    board: &Board,
    moves: &mut MoveList,
    hash_move: Move,
    killers: &Killers,
    history: &HistoryTable,
    ply: usize,
) {
    let mut scored: ArrayVec<(i32, Move), 256> = moves
        .iter()
        .map(|&mv| (score_move(board, mv, hash_move, killers, history, ply), mv))
        .collect();
    scored.sort_unstable_by_key(|&(score, _)| std::cmp::Reverse(score));
    moves.clear();
    moves.extend(scored.into_iter().map(|(_, mv)| mv));
}

/// Sort tactical moves by MVV-LVA for quiescence.
pub fn order_captures(board: &Board, moves: &mut MoveList) {
    let mut scored: ArrayVec<(i32, Move), 256> = moves
        .iter()
        .map(|&mv| (mvv_lva(board, mv), mv))
        .collect();
    scored.sort_unstable_by_key(|&(score, _)| std::cmp::Reverse(score));
    moves.clear();
    moves.extend(scored.into_iter().map(|(_, mv)| mv));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::generate_legal;
    use crate::moves::{move_to_uci, parse_uci_move};

    #[test]
    fn killers_shift_and_dedup() {
        let mut killers = Killers::new();
        killers.store(3, 100);
        killers.store(3, 100);
        assert_eq!(killers.probe(3, 100), Some(0));
        killers.store(3, 200);
        assert_eq!(killers.probe(3, 200), Some(0));
        assert_eq!(killers.probe(3, 100), Some(1));
        assert_eq!(killers.probe(3, 300), None);
        assert_eq!(killers.probe(2, 100), None);
    }

    #[test]
    fn history_accumulates_depth_squared() {
        let mut history = HistoryTable::new();
        let mv = crate::moves::new_move(12, 28, 0);
        history.bump(Color::White, mv, 3);
        assert_eq!(history.get(Color::White, mv), 9);
        history.bump(Color::White, mv, 4);
        assert_eq!(history.get(Color::White, mv), 25);
        assert_eq!(history.get(Color::Black, mv), 0);
    }

    #[test]
    fn hash_move_sorts_first_then_captures() {
        let mut board = Board::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/3PP3/8/PPP2PPP/RNBQKBNR b KQkq - 0 3",
        )
        .unwrap();
        let mut moves = generate_legal(&mut board);
        let killers = Killers::new();
        let history = HistoryTable::new();

        // Pick a quiet move as the hash move; it must still sort first.
        let hash_move = parse_uci_move("g8f6", &moves).unwrap();
        order_moves(&board, &mut moves, hash_move, &killers, &history, 0);
        assert_eq!(moves[0], hash_move);
        // The capture exd4 must come before all remaining quiet moves.
        let capture_pos = moves
            .iter()
            .position(|&m| move_to_uci(m) == "e5d4")
            .unwrap();
        assert!(moves[1..capture_pos].iter().all(|&m| is_capture(m)));
    }

    #[test]
    fn captures_ordered_most_valuable_victim_first() {
        // Pawn can take the queen or the knight.
        let mut board =
            Board::from_fen("4k3/8/8/2q1n3/3P4/8/8/4K3 w - - 0 1").unwrap();
        let mut moves = crate::movegen::generate_captures(&mut board);
        order_captures(&board, &mut moves);
        assert_eq!(move_to_uci(moves[0]), "d4c5");
    }

    #[test]
    fn killer_ranks_above_plain_quiet_moves() {
        let mut board = Board::new();
        let mut moves = generate_legal(&mut board);
        let killers = {
            let mut k = Killers::new();
            k.store(0, parse_uci_move("b1c3", &moves).unwrap());
            k
        };
        let history = HistoryTable::new();
        order_moves(&board, &mut moves, MOVE_NONE, &killers, &history, 0);
        assert_eq!(move_to_uci(moves[0]), "b1c3");
    }
}
