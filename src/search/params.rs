//! Search limits and configuration.
//!
//! Every pruning/caching optimization has its own switch. They all default
//! to on; switching one off must never change the best move in a position
//! with a unique best move, only the work done to find it, and the test
//! suite holds the search to that.

/// Limits and toggles for one search invocation.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Maximum depth in plies.
    pub max_depth: u8,

    /// Hard time budget in milliseconds; `None` means depth-limited only.
    pub movetime: Option<u64>,

    /// Transposition-table probes and stores.
    pub use_tt: bool,

    /// Aspiration windows around the previous iteration's score.
    pub use_aspiration: bool,

    /// Null-move pruning.
    pub use_null_move: bool,

    /// Late move reductions.
    pub use_lmr: bool,

    /// Futility pruning at frontier depths.
    pub use_futility: bool,

    /// Reverse futility pruning (static-eval beta cutoffs).
    pub use_rfp: bool,

    /// Quiescence search at the leaves; off means raw static eval.
    pub use_quiescence: bool,

    /// Aspiration half-width in centipawns.
    pub aspiration_window: i16,

    /// Transposition table size in MiB.
    pub tt_size_mb: usize,

    /// Print a UCI `info` line per completed iteration.
    pub report_info: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_depth: super::MAX_PLY as u8 - 1,
            movetime: None,
            use_tt: true,
            use_aspiration: true,
            use_null_move: true,
            use_lmr: true,
            use_futility: true,
            use_rfp: true,
            use_quiescence: true,
            aspiration_window: 50,
            tt_size_mb: 64,
            report_info: false,
        }
    }
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: u8) -> Self {
        self.max_depth = depth.clamp(1, super::MAX_PLY as u8 - 1);
        self
    }

    pub fn movetime(mut self, ms: u64) -> Self {
        self.movetime = Some(ms);
        self
    }

    pub fn tt(mut self, enabled: bool) -> Self {
        self.use_tt = enabled;
        self
    }

    pub fn aspiration(mut self, enabled: bool) -> Self {
        self.use_aspiration = enabled;
        self
    }

    pub fn null_move(mut self, enabled: bool) -> Self {
        self.use_null_move = enabled;
        self
    }

    pub fn lmr(mut self, enabled: bool) -> Self {
        self.use_lmr = enabled;
        self
    }

    pub fn futility(mut self, enabled: bool) -> Self {
        self.use_futility = enabled;
        self
    }

    pub fn reverse_futility(mut self, enabled: bool) -> Self {
        self.use_rfp = enabled;
        self
    }

    pub fn quiescence(mut self, enabled: bool) -> Self {
        self.use_quiescence = enabled;
        self
    }

    /// Bare alpha-beta: every optimization off at once.
    pub fn all_optimizations(self, enabled: bool) -> Self {
        self.tt(enabled)
            .aspiration(enabled)
            .null_move(enabled)
            .lmr(enabled)
            .futility(enabled)
            .reverse_futility(enabled)
            .quiescence(enabled)
    }

    pub fn tt_size_mb(mut self, mb: usize) -> Self {
        self.tt_size_mb = mb;
        self
    }

    pub fn report_info(mut self, enabled: bool) -> Self {
        self.report_info = enabled;
        self
    }
}
