//! Time allocation for UCI `go` parameters.

use crate::moves::Color;

/// Clock fields of a `go` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub movetime: Option<u64>,
}

pub struct TimeManager;

impl TimeManager {
    /// Milliseconds to spend on this move, or `None` when only depth limits
    /// apply. Explicit movetime wins; otherwise remaining time is split over
    /// the expected moves to go plus half the increment, capped at half the
    /// clock so the engine can never flag itself on one move.
    pub fn allocate(clock: &Clock, side: Color) -> Option<u64> {
        if let Some(mt) = clock.movetime {
            return Some(mt);
        }

        let (time, inc) = match side {
            Color::White => (clock.wtime?, clock.winc.unwrap_or(0)),
            Color::Black => (clock.btime?, clock.binc.unwrap_or(0)),
        };

        let moves_to_go = clock.movestogo.unwrap_or(30).max(1) as u64;
        let budget = time / moves_to_go + inc / 2;
        Some(budget.min(time / 2).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movetime_wins_over_clock() {
        let clock = Clock {
            movetime: Some(1234),
            wtime: Some(60_000),
            ..Clock::default()
        };
        assert_eq!(TimeManager::allocate(&clock, Color::White), Some(1234));
    }

    #[test]
    fn splits_remaining_time_over_moves_to_go() {
        let clock = Clock {
            wtime: Some(60_000),
            movestogo: Some(20),
            ..Clock::default()
        };
        assert_eq!(TimeManager::allocate(&clock, Color::White), Some(3000));
    }

    #[test]
    fn uses_own_clock_and_increment() {
        let clock = Clock {
            wtime: Some(60_000),
            btime: Some(10_000),
            binc: Some(2_000),
            ..Clock::default()
        };
        // 10000/30 + 2000/2 = 333 + 1000
        assert_eq!(TimeManager::allocate(&clock, Color::Black), Some(1333));
    }

    #[test]
    fn never_allocates_more_than_half_the_clock() {
        let clock = Clock {
            wtime: Some(100),
            winc: Some(10_000),
            ..Clock::default()
        };
        assert_eq!(TimeManager::allocate(&clock, Color::White), Some(50));
    }

    #[test]
    fn no_clock_means_no_deadline() {
        assert_eq!(TimeManager::allocate(&Clock::default(), Color::White), None);
    }
}
