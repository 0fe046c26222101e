//! Search statistics: node counts, pruning counters, timing.

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SearchStats {
    /// All nodes, main search and quiescence together.
    pub nodes: u64,

    /// Quiescence nodes only.
    pub qnodes: u64,

    /// Transposition-table probe hits.
    pub tt_hits: u64,

    /// Beta cutoffs in the main search.
    pub cutoffs: u64,

    /// Cutoffs produced by the null-move search.
    pub null_cutoffs: u64,

    /// Moves searched at reduced depth.
    pub lmr_reductions: u64,

    /// Moves skipped by futility pruning.
    pub futility_pruned: u64,

    /// Deepest completed iteration.
    pub depth_reached: u8,

    start: Option<Instant>,
}

impl Default for SearchStats {
    fn default() -> Self {
        Self {
            nodes: 0,
            qnodes: 0,
            tt_hits: 0,
            cutoffs: 0,
            null_cutoffs: 0,
            lmr_reductions: 0,
            futility_pruned: 0,
            depth_reached: 0,
            start: None,
        }
    }
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self {
            start: Some(Instant::now()),
            ..Self::default()
        };
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start
            .map(|s| s.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Nodes per second over the elapsed search time.
    pub fn nps(&self) -> u64 {
        let ms = self.elapsed_ms().max(1);
        self.nodes * 1000 / ms
    }
}
