//! Pure progression math: level lookups and streak multipliers.
//!
//! Everything here is a stateless derivation over the tables in
//! [`crate::constants`]; nothing mutates athlete state.

use serde::Serialize;

use crate::constants::LEVELS;

/// One rung of the level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub name: &'static str,
    pub threshold: i64,
}

/// Progress toward the next level, as rendered on an athlete card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub current: Level,
    pub next: Option<Level>,
    /// Percent of the way to the next threshold, clamped to [0, 100].
    pub percent: f64,
    /// XP remaining to the next threshold; 0 at the top level.
    pub remaining: i64,
}

/// Highest level whose threshold is at or below `xp`.
///
/// Handles `xp = 0` (floor level) and xp beyond the top threshold
/// (caps at the top level).
#[must_use]
pub fn level_of(xp: i64) -> Level {
    let mut current = LEVELS[0];
    for level in LEVELS {
        if level.threshold <= xp {
            current = *level;
        } else {
            break;
        }
    }
    current
}

/// First level whose threshold is strictly above `xp`, or `None` at the top.
#[must_use]
pub fn next_level(xp: i64) -> Option<Level> {
    LEVELS.iter().copied().find(|level| level.threshold > xp)
}

/// Percent-to-next-level and remaining XP for display.
#[must_use]
pub fn level_progress(xp: i64) -> LevelProgress {
    let xp = xp.max(0);
    let current = level_of(xp);
    let next = next_level(xp);
    match next {
        Some(next_lvl) => {
            let span = (next_lvl.threshold - current.threshold).max(1);
            let into = xp - current.threshold;
            let percent = (into as f64 / span as f64 * 100.0).clamp(0.0, 100.0);
            LevelProgress {
                current,
                next,
                percent,
                remaining: (next_lvl.threshold - xp).max(0),
            }
        }
        None => LevelProgress {
            current,
            next: None,
            percent: 100.0,
            remaining: 0,
        },
    }
}

/// Largest-tier multiplier lookup: the highest `(min_days, multiplier)`
/// entry with `min_days <= streak_days` wins. Tables always carry a 0-day
/// floor tier, so the fallback of 1.0 is never reached in practice.
#[must_use]
pub fn multiplier_for(streak_days: u32, table: &[(u32, f64)]) -> f64 {
    table
        .iter()
        .filter(|(min_days, _)| *min_days <= streak_days)
        .max_by_key(|(min_days, _)| *min_days)
        .map_or(1.0, |(_, multiplier)| *multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{POOL_STREAK_TIERS, WEIGHT_STREAK_TIERS};

    #[test]
    fn level_of_floor_and_cap() {
        assert_eq!(level_of(0).name, "Minnow");
        assert_eq!(level_of(249).name, "Minnow");
        assert_eq!(level_of(250).name, "Stingray");
        assert_eq!(level_of(1_000_000).name, "Kraken");
    }

    #[test]
    fn level_of_is_monotonic() {
        let mut last_threshold = -1;
        for xp in 0..6_000 {
            let level = level_of(xp);
            assert!(level.threshold >= last_threshold, "regressed at xp={xp}");
            last_threshold = level.threshold;
        }
    }

    #[test]
    fn next_level_none_at_top() {
        assert_eq!(next_level(100).map(|l| l.name), Some("Stingray"));
        assert_eq!(next_level(5_000), None);
        assert_eq!(next_level(9_999), None);
    }

    #[test]
    fn progress_stays_in_bounds() {
        for xp in [0, 1, 249, 250, 599, 3_199, 5_000, 8_000] {
            let progress = level_progress(xp);
            assert!((0.0..=100.0).contains(&progress.percent), "xp={xp}");
            assert!(progress.remaining >= 0);
        }
    }

    #[test]
    fn progress_at_top_is_complete() {
        let progress = level_progress(7_500);
        assert_eq!(progress.current.name, "Kraken");
        assert!(progress.next.is_none());
        assert!((progress.percent - 100.0).abs() < f64::EPSILON);
        assert_eq!(progress.remaining, 0);
    }

    #[test]
    fn multiplier_tiers_are_inclusive() {
        assert!((multiplier_for(0, POOL_STREAK_TIERS) - 1.0).abs() < f64::EPSILON);
        assert!((multiplier_for(2, POOL_STREAK_TIERS) - 1.0).abs() < f64::EPSILON);
        assert!((multiplier_for(3, POOL_STREAK_TIERS) - 1.25).abs() < f64::EPSILON);
        assert!((multiplier_for(6, POOL_STREAK_TIERS) - 1.25).abs() < f64::EPSILON);
        assert!((multiplier_for(7, POOL_STREAK_TIERS) - 1.5).abs() < f64::EPSILON);
        assert!((multiplier_for(60, POOL_STREAK_TIERS) - 2.5).abs() < f64::EPSILON);
        assert!((multiplier_for(400, POOL_STREAK_TIERS) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn weight_table_tops_out_early() {
        assert!((multiplier_for(30, WEIGHT_STREAK_TIERS) - 1.5).abs() < f64::EPSILON);
    }
}
