//! The searcher: iterative deepening with aspiration windows around a
//! fail-hard negamax, quiescence at the leaves, and a transposition table
//! shared across iterations.
//!
//! Cancellation is cooperative. The searcher polls a shared stop flag and
//! its deadline every 2048 nodes; once tripped, the tree unwinds returning
//! dummy scores and the half-finished iteration is discarded, so the result
//! always comes from the last completed iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ordering::{order_captures, order_moves, HistoryTable, Killers};
use super::tt::{Bound, TranspositionTable};
use super::{SearchParams, SearchStats, INF, MATE, MATE_THRESHOLD, MAX_PLY};
use crate::board::Board;
use crate::error::EngineError;
use crate::eval::{self, MATERIAL};
use crate::movegen::{generate_captures, generate_legal};
use crate::moves::{
    is_capture, is_en_passant, is_promotion, move_to, move_to_uci, Move, MOVE_NONE,
};

// Pruning margins, indexed by remaining depth.
const RFP_MARGINS: [i16; 4] = [0, 200, 300, 500];
const FUTILITY_MARGINS: [i16; 3] = [0, 200, 400];

// Depth subtracted by the null-move search on top of the usual one.
const NULL_MOVE_REDUCTION: i32 = 2;

// Quiescence delta-pruning margins.
const DELTA_MARGIN: i16 = 200;
const BIG_DELTA: i16 = 900;

// Elapsed-time and stop-flag polling cadence, in nodes.
const POLL_INTERVAL: u64 = 2048;

/// Outcome of a completed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Move,
    pub score_cp: i16,
    pub depth_reached: u8,
    pub nodes: u64,
    pub time_ms: u64,
    pub pv: Vec<Move>,
}

pub struct Searcher {
    board: Board,
    tt: TranspositionTable,
    params: SearchParams,
    stats: SearchStats,
    killers: Killers,
    history: HistoryTable,
    stop: Arc<AtomicBool>,
    deadline: Option<Instant>,
    aborted: bool,
}

impl Searcher {
    pub fn new(board: Board, params: SearchParams) -> Self {
        let tt = TranspositionTable::new(params.tt_size_mb);
        Self {
            board,
            tt,
            params,
            stats: SearchStats::new(),
            killers: Killers::new(),
            history: HistoryTable::new(),
            stop: Arc::new(AtomicBool::new(false)),
            deadline: None,
            aborted: false,
        }
    }

    pub fn with_board(board: Board) -> Self {
        Self::new(board, SearchParams::default())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Swap in a new position; the TT is kept so earlier work carries over.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    pub fn set_params(&mut self, params: SearchParams) {
        if params.tt_size_mb != self.params.tt_size_mb {
            self.tt = TranspositionTable::new(params.tt_size_mb);
        }
        self.params = params;
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Cancellation handle: another thread may set it to true and the search
    /// unwinds at its next polling point.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Drop all accumulated state (TT, killers, history); for `ucinewgame`.
    pub fn reset_tables(&mut self) {
        self.tt.clear();
        self.killers.clear();
        self.history.clear();
    }

    /// Iterative-deepening search under the configured limits.
    pub fn search(&mut self) -> Result<SearchResult, EngineError> {
        self.stats.reset();
        self.tt.new_search();
        self.killers.clear();
        self.aborted = false;
        self.stop.store(false, Ordering::Relaxed);
        let start = Instant::now();
        self.deadline = self
            .params
            .movetime
            .map(|ms| start + Duration::from_millis(ms));

        // Terminal root: no iteration to run, report mate or stalemate.
        let root_moves = generate_legal(&mut self.board);
        if root_moves.is_empty() {
            let score = if self.board.in_check(self.board.side_to_move()) {
                -MATE
            } else {
                0
            };
            return Ok(SearchResult {
                best_move: MOVE_NONE,
                score_cp: score,
                depth_reached: 0,
                nodes: 0,
                time_ms: start.elapsed().as_millis() as u64,
                pv: Vec::new(),
            });
        }

        let mut completed: Option<(Move, i16, u8, Vec<Move>)> = None;

        for depth in 1..=self.params.max_depth {
            let mut alpha = -INF;
            let mut beta = INF;
            if depth >= 4 && self.params.use_aspiration {
                if let Some(&(_, prev, _, _)) = completed.as_ref() {
                    alpha = prev.saturating_sub(self.params.aspiration_window);
                    beta = prev.saturating_add(self.params.aspiration_window);
                }
            }

            // Fail-low widens alpha, fail-high widens beta; at most one
            // widening per side before the window is fully open.
            let (mv, score) = loop {
                let (mv, score) = self.search_root(depth as i32, alpha, beta);
                if self.aborted {
                    break (mv, score);
                }
                if score <= alpha && alpha > -INF {
                    alpha = -INF;
                } else if score >= beta && beta < INF {
                    beta = INF;
                } else {
                    break (mv, score);
                }
            };

            if self.aborted {
                break;
            }

            let pv = self.extract_pv(mv, depth);
            self.stats.depth_reached = depth;
            completed = Some((mv, score, depth, pv.clone()));

            if self.params.report_info {
                println!(
                    "info depth {} score {} nodes {} time {} nps {} pv {}",
                    depth,
                    uci_score(score),
                    self.stats.nodes,
                    self.stats.elapsed_ms(),
                    self.stats.nps(),
                    pv.iter()
                        .map(|&m| move_to_uci(m))
                        .collect::<Vec<_>>()
                        .join(" "),
                );
            }

            // A forced mate cannot improve with more depth.
            if score.abs() >= MATE_THRESHOLD {
                break;
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }
        }

        match completed {
            Some((best_move, score_cp, depth_reached, pv)) => Ok(SearchResult {
                best_move,
                score_cp,
                depth_reached,
                nodes: self.stats.nodes,
                time_ms: start.elapsed().as_millis() as u64,
                pv,
            }),
            None => Err(EngineError::SearchAborted),
        }
    }

    /// Root node: like negamax, but tracks the best move and never cuts on
    /// the transposition table.
    fn search_root(&mut self, depth: i32, alpha: i16, beta: i16) -> (Move, i16) {
        let key = self.board.zobrist();
        let hash_move = if self.params.use_tt {
            self.tt
                .probe(key, 0, 0, -INF, INF)
                .map(|hit| hit.mv)
                .unwrap_or(MOVE_NONE)
        } else {
            MOVE_NONE
        };

        let mut moves = generate_legal(&mut self.board);
        order_moves(
            &self.board,
            &mut moves,
            hash_move,
            &self.killers,
            &self.history,
            0,
        );

        let mut best_move = moves[0];
        let mut best = -INF;
        let mut alpha_now = alpha;

        for &mv in moves.iter() {
            self.board.make_move(mv);
            let gives_check = self.board.in_check(self.board.side_to_move());
            let ext = i32::from(gives_check);
            let score = -self.negamax(depth - 1 + ext, -beta, -alpha_now, 1);
            self.board.unmake_move();

            if self.aborted {
                return (best_move, best);
            }

            if score > best {
                best = score;
                best_move = mv;
                if score > alpha_now {
                    alpha_now = score;
                }
            }
            if score >= beta {
                break;
            }
        }

        let bound = if best >= beta {
            Bound::Lower
        } else if best <= alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        if self.params.use_tt {
            self.tt.store(key, best_move, depth as u8, best, bound, 0);
        }

        (best_move, best)
    }

    fn negamax(&mut self, depth: i32, mut alpha: i16, beta: i16, ply: usize) -> i16 {
        debug_assert!(alpha < beta);

        self.stats.nodes += 1;
        if self.stats.nodes % POLL_INTERVAL == 0 {
            self.poll_abort();
        }
        if self.aborted {
            return 0;
        }

        if depth <= 0 {
            return if self.params.use_quiescence {
                self.quiescence(alpha, beta, ply)
            } else {
                eval::evaluate(&self.board)
            };
        }

        if self.board.is_draw() {
            return 0;
        }
        if ply >= MAX_PLY - 1 {
            return eval::evaluate(&self.board);
        }

        let us = self.board.side_to_move();
        let in_check = self.board.in_check(us);
        let key = self.board.zobrist();

        let mut hash_move = MOVE_NONE;
        if self.params.use_tt {
            if let Some(hit) = self.tt.probe(key, depth as u8, ply, alpha, beta) {
                self.stats.tt_hits += 1;
                hash_move = hit.mv;
                if let Some(score) = hit.score {
                    return score;
                }
            }
        }

        let static_eval = if in_check {
            0
        } else {
            eval::evaluate(&self.board)
        };

        // Reverse futility: a quiet position so far above beta that shallow
        // search cannot bring it back down. Not while hunting mates.
        if self.params.use_rfp
            && !in_check
            && depth <= 3
            && beta.abs() < MATE_THRESHOLD
            && static_eval - RFP_MARGINS[depth as usize] >= beta
        {
            return static_eval;
        }

        // Null move: hand the opponent a free tempo; if the position still
        // fails high, a real move will too. Needs non-pawn material to dodge
        // zugzwang traps.
        if self.params.use_null_move
            && !in_check
            && depth >= 3
            && static_eval >= beta
            && self.board.has_non_pawn_material(us)
        {
            self.board.make_null_move();
            let score = -self.negamax(depth - 1 - NULL_MOVE_REDUCTION, -beta, -beta + 1, ply + 1);
            self.board.unmake_null_move();
            if self.aborted {
                return 0;
            }
            if score >= beta {
                self.stats.null_cutoffs += 1;
                return beta;
            }
        }

        let mut moves = generate_legal(&mut self.board);
        if moves.is_empty() {
            return if in_check { -MATE + ply as i16 } else { 0 };
        }

        order_moves(
            &self.board,
            &mut moves,
            hash_move,
            &self.killers,
            &self.history,
            ply,
        );

        let mut best = -INF;
        let mut best_move = MOVE_NONE;
        let mut bound = Bound::Upper;
        let mut searched = 0u32;

        for (i, &mv) in moves.iter().enumerate() {
            let quiet = !is_capture(mv) && !is_promotion(mv);

            self.board.make_move(mv);
            let gives_check = self.board.in_check(self.board.side_to_move());

            // Futility: at frontier depths a quiet move cannot lift a
            // hopeless static eval past alpha. Keep at least one searched
            // move so the node still has a score.
            if self.params.use_futility
                && quiet
                && !in_check
                && !gives_check
                && depth <= 2
                && searched > 0
                && alpha.abs() < MATE_THRESHOLD
                && static_eval + FUTILITY_MARGINS[depth as usize] <= alpha
            {
                self.board.unmake_move();
                self.stats.futility_pruned += 1;
                continue;
            }

            let score = if self.params.use_lmr
                && i >= 4
                && depth >= 3
                && quiet
                && !in_check
                && !gives_check
            {
                // Late move reduction: probe a reduced null window, verify
                // at full depth, then open the window only if it improves.
                self.stats.lmr_reductions += 1;
                let mut s = -self.negamax(depth - 2, -alpha - 1, -alpha, ply + 1);
                if s > alpha && !self.aborted {
                    s = -self.negamax(depth - 1, -alpha - 1, -alpha, ply + 1);
                    if s > alpha && !self.aborted {
                        s = -self.negamax(depth - 1, -beta, -alpha, ply + 1);
                    }
                }
                s
            } else {
                let ext = i32::from(gives_check);
                -self.negamax(depth - 1 + ext, -beta, -alpha, ply + 1)
            };
            self.board.unmake_move();
            searched += 1;

            if self.aborted {
                return 0;
            }

            if score >= beta {
                if quiet {
                    self.killers.store(ply, mv);
                    self.history.bump(us, mv, depth);
                }
                self.stats.cutoffs += 1;
                if self.params.use_tt {
                    self.tt.store(key, mv, depth as u8, beta, Bound::Lower, ply);
                }
                return beta;
            }
            if score > best {
                best = score;
                best_move = mv;
                if score > alpha {
                    alpha = score;
                    bound = Bound::Exact;
                }
            }
        }

        if self.params.use_tt {
            self.tt.store(key, best_move, depth as u8, alpha, bound, ply);
        }
        alpha
    }

    /// Captures-only tail search to settle tactics before trusting the
    /// static evaluation.
    fn quiescence(&mut self, mut alpha: i16, beta: i16, ply: usize) -> i16 {
        self.stats.nodes += 1;
        self.stats.qnodes += 1;
        if self.stats.nodes % POLL_INTERVAL == 0 {
            self.poll_abort();
        }
        if self.aborted {
            return 0;
        }

        let stand_pat = eval::evaluate(&self.board);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        if ply >= MAX_PLY - 1 {
            return alpha;
        }

        let mut moves = generate_captures(&mut self.board);
        order_captures(&self.board, &mut moves);

        for &mv in moves.iter() {
            // Delta pruning: even winning this material cannot reach alpha.
            let victim = if is_en_passant(mv) {
                MATERIAL[0]
            } else {
                self.board
                    .piece_on(move_to(mv))
                    .map(|(kind, _)| MATERIAL[kind.index()])
                    .unwrap_or(0)
            };
            let upside = victim + if is_promotion(mv) { BIG_DELTA } else { 0 };
            if stand_pat + upside + DELTA_MARGIN < alpha {
                continue;
            }

            self.board.make_move(mv);
            let score = -self.quiescence(-beta, -alpha, ply + 1);
            self.board.unmake_move();

            if self.aborted {
                return 0;
            }
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }

    fn poll_abort(&mut self) {
        if self.stop.load(Ordering::Relaxed) {
            self.aborted = true;
            return;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.aborted = true;
            }
        }
    }

    /// Walk best-move links out of the TT to reconstruct the PV, stopping at
    /// a missing entry, an illegal move or a repetition.
    fn extract_pv(&mut self, first: Move, depth: u8) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut made = 0usize;

        if first != MOVE_NONE {
            self.board.make_move(first);
            pv.push(first);
            made += 1;
        }

        while pv.len() < depth as usize {
            if self.board.is_repetition() {
                break;
            }
            let Some(hit) = self.tt.probe(self.board.zobrist(), 0, 0, -INF, INF) else {
                break;
            };
            if hit.mv == MOVE_NONE {
                break;
            }
            let legal = generate_legal(&mut self.board);
            if !legal.contains(&hit.mv) {
                break;
            }
            self.board.make_move(hit.mv);
            pv.push(hit.mv);
            made += 1;
        }

        for _ in 0..made {
            self.board.unmake_move();
        }
        pv
    }
}

/// Format a score the UCI way: centipawns, or moves-to-mate when forced.
pub fn uci_score(score: i16) -> String {
    if score >= MATE_THRESHOLD {
        format!("mate {}", (MATE - score + 1) / 2)
    } else if score <= -MATE_THRESHOLD {
        format!("mate -{}", (MATE + score + 1) / 2)
    } else {
        format!("cp {score}")
    }
}
