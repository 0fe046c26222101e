//! Transposition table: a single-slot, depth-preferred cache keyed by the
//! full Zobrist hash.
//!
//! The table is a plain `Vec`; the search owns it exclusively and runs on
//! one thread, so there is nothing to synchronize. Entries are 16 bytes and
//! the entry count is a power of two so the index is a mask of the key's low
//! bits. Mate scores are stored relative to the probing node (distance from
//! the current ply) and re-based on probe, keeping mate distances meaningful
//! across transpositions.

use super::MATE_THRESHOLD;
use crate::moves::{Move, MOVE_NONE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    Exact = 0,
    Lower = 1,
    Upper = 2,
}

#[derive(Debug, Clone, Copy)]
struct TTEntry {
    key: u64,
    mv: Move,
    score: i16,
    depth: u8,
    bound: Bound,
    age: u8,
}

const EMPTY: TTEntry = TTEntry {
    key: 0,
    mv: MOVE_NONE,
    score: 0,
    depth: 0,
    bound: Bound::Exact,
    age: 0,
};

/// Probe result: the stored move is always usable for ordering; the score is
/// present only when the stored bound allows a cutoff at the caller's window.
#[derive(Debug, Clone, Copy)]
pub struct TTProbe {
    pub mv: Move,
    pub score: Option<i16>,
}

pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    mask: usize,
    age: u8,
}

impl TranspositionTable {
    /// Build a table of roughly `size_mb` MiB; the entry count is rounded
    /// down to a power of two, never below 1024 entries.
    pub fn new(size_mb: usize) -> Self {
        let bytes = size_mb.max(1) * 1024 * 1024;
        let wanted = bytes / std::mem::size_of::<TTEntry>();
        let count = if wanted.is_power_of_two() {
            wanted
        } else {
            wanted.next_power_of_two() / 2
        }
        .max(1024);

        Self {
            entries: vec![EMPTY; count],
            mask: count - 1,
            age: 0,
        }
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        key as usize & self.mask
    }

    /// Bump the age; call once per root search so stale entries lose their
    /// replacement priority while staying probeable.
    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.entries.fill(EMPTY);
        self.age = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Permille of a fixed sample of entries in use; feeds `info hashfull`.
    pub fn hashfull(&self) -> usize {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample].iter().filter(|e| e.key != 0).count();
        used * 1000 / sample
    }

    /// Look up `key`. A full-key mismatch is a miss; index collisions never
    /// leak foreign entries.
    pub fn probe(&self, key: u64, depth: u8, ply: usize, alpha: i16, beta: i16) -> Option<TTProbe> {
        let entry = self.entries[self.index(key)];
        if entry.key != key {
            return None;
        }

        let mut score = None;
        if entry.depth >= depth {
            let s = score_from_tt(entry.score, ply);
            let usable = match entry.bound {
                Bound::Exact => true,
                Bound::Lower => s >= beta,
                Bound::Upper => s <= alpha,
            };
            if usable {
                score = Some(s);
            }
        }

        Some(TTProbe {
            mv: entry.mv,
            score,
        })
    }

    /// Insert or replace: depth-preferred within the current search, with
    /// entries from older searches always giving way.
    pub fn store(&mut self, key: u64, mv: Move, depth: u8, score: i16, bound: Bound, ply: usize) {
        let idx = self.index(key);
        let entry = &mut self.entries[idx];

        let replace = entry.key == 0 || entry.age != self.age || depth >= entry.depth;
        if !replace {
            return;
        }

        // Keep the old move when the new store has none.
        let mv = if mv == MOVE_NONE && entry.key == key {
            entry.mv
        } else {
            mv
        };

        *entry = TTEntry {
            key,
            mv,
            score: score_to_tt(score, ply),
            depth,
            bound,
            age: self.age,
        };
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Convert a search score to table form: mate scores become distance from
/// the storing node rather than from the root.
#[inline]
fn score_to_tt(score: i16, ply: usize) -> i16 {
    if score >= MATE_THRESHOLD {
        score + ply as i16
    } else if score <= -MATE_THRESHOLD {
        score - ply as i16
    } else {
        score
    }
}

/// Inverse of `score_to_tt` at the probing node's ply.
#[inline]
fn score_from_tt(score: i16, ply: usize) -> i16 {
    if score >= MATE_THRESHOLD {
        score - ply as i16
    } else if score <= -MATE_THRESHOLD {
        score + ply as i16
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{INF, MATE};

    #[test]
    fn store_then_probe_round_trips() {
        let mut tt = TranspositionTable::new(1);
        tt.store(0x1234, 42, 5, 17, Bound::Exact, 0);

        let hit = tt.probe(0x1234, 5, 0, -INF, INF).unwrap();
        assert_eq!(hit.mv, 42);
        assert_eq!(hit.score, Some(17));

        assert!(tt.probe(0x9999, 0, 0, -INF, INF).is_none());
    }

    #[test]
    fn full_key_mismatch_is_a_miss() {
        let mut tt = TranspositionTable::new(1);
        let count = tt.len() as u64;
        tt.store(3, 42, 5, 17, Bound::Exact, 0);
        // Same slot, different full key.
        assert!(tt.probe(3 + count, 5, 0, -INF, INF).is_none());
    }

    #[test]
    fn shallow_entries_return_move_but_no_score() {
        let mut tt = TranspositionTable::new(1);
        tt.store(7, 42, 3, 17, Bound::Exact, 0);
        let hit = tt.probe(7, 6, 0, -INF, INF).unwrap();
        assert_eq!(hit.mv, 42);
        assert_eq!(hit.score, None);
    }

    #[test]
    fn bound_usability_rules() {
        let mut tt = TranspositionTable::new(1);

        tt.store(1, 0, 4, 100, Bound::Lower, 0);
        // Lower bound usable only when score >= beta.
        assert_eq!(tt.probe(1, 4, 0, 0, 50).unwrap().score, Some(100));
        assert_eq!(tt.probe(1, 4, 0, 0, 200).unwrap().score, None);

        tt.store(2, 0, 4, -100, Bound::Upper, 0);
        // Upper bound usable only when score <= alpha.
        assert_eq!(tt.probe(2, 4, 0, -50, 50).unwrap().score, Some(-100));
        assert_eq!(tt.probe(2, 4, 0, -200, 50).unwrap().score, None);

        tt.store(3, 0, 4, 30, Bound::Exact, 0);
        // Exact usable at any window.
        assert_eq!(tt.probe(3, 4, 0, 500, 600).unwrap().score, Some(30));
    }

    #[test]
    fn depth_preferred_replacement() {
        let mut tt = TranspositionTable::new(1);
        tt.store(5, 10, 10, 100, Bound::Exact, 0);

        // Shallower store from the same search does not replace.
        tt.store(5, 20, 4, 200, Bound::Exact, 0);
        assert_eq!(tt.probe(5, 0, 0, -INF, INF).unwrap().mv, 10);

        // Equal or deeper replaces.
        tt.store(5, 30, 10, 300, Bound::Exact, 0);
        assert_eq!(tt.probe(5, 0, 0, -INF, INF).unwrap().mv, 30);
    }

    #[test]
    fn older_age_always_gives_way() {
        let mut tt = TranspositionTable::new(1);
        tt.store(5, 10, 12, 100, Bound::Exact, 0);
        tt.new_search();
        // New search, much shallower store still replaces.
        tt.store(5, 20, 1, 200, Bound::Exact, 0);
        assert_eq!(tt.probe(5, 0, 0, -INF, INF).unwrap().mv, 20);
    }

    #[test]
    fn mate_scores_rebased_by_ply() {
        let mut tt = TranspositionTable::new(1);
        // A mate-in-2-plies found at ply 3 (score MATE - 5 from the root).
        tt.store(9, 0, 8, MATE - 5, Bound::Exact, 3);
        // Probed from ply 1, the same line is mate at MATE - 3.
        let hit = tt.probe(9, 8, 1, -INF, INF).unwrap();
        assert_eq!(hit.score, Some(MATE - 3));
        // Mated scores mirror.
        tt.store(10, 0, 8, -(MATE - 5), Bound::Exact, 3);
        let hit = tt.probe(10, 8, 1, -INF, INF).unwrap();
        assert_eq!(hit.score, Some(-(MATE - 3)));
    }

    #[test]
    fn entry_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<TTEntry>(), 16);
    }

    #[test]
    fn table_sizing_is_power_of_two() {
        for mb in [1, 2, 16, 64] {
            let tt = TranspositionTable::new(mb);
            assert!(tt.len().is_power_of_two());
            assert!(tt.len() * 16 <= mb * 1024 * 1024);
        }
    }

    #[test]
    fn ply_adjustment_cannot_overflow() {
        // Plies stay under MAX_PLY so the i16 adjustments cannot overflow.
        assert!((crate::search::MAX_PLY as i16) < i16::MAX - MATE);
    }
}
