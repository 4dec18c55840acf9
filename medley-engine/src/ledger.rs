//! The XP ledger: every XP change flows through [`award`] or [`revert`],
//! which together guarantee the daily-cap invariant
//! `pool + weight + meet <= DAILY_XP_CAP`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::athlete::{Athlete, XpCategory};
use crate::constants::{DAILY_XP_CAP, POOL_STREAK_TIERS, WEIGHT_STREAK_TIERS};
use crate::progression::{Level, level_of, multiplier_for};

/// Surfaced to the caller's notification side-channel; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    pub from: Level,
    pub to: Level,
}

/// Result of one award attempt. `awarded == 0` means the action had no
/// effect (cap reached or zero base) and is informational, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AwardOutcome {
    pub awarded: i64,
    pub level_up: Option<LevelUp>,
}

pub(crate) const fn streak_table(category: XpCategory) -> &'static [(u32, f64)] {
    match category {
        XpCategory::Pool | XpCategory::Meet => POOL_STREAK_TIERS,
        XpCategory::Weight => WEIGHT_STREAK_TIERS,
    }
}

/// Multiplier an award in `category` would receive right now.
#[must_use]
pub fn current_multiplier(athlete: &Athlete, category: XpCategory) -> f64 {
    multiplier_for(athlete.streak_days(category), streak_table(category))
}

/// Lazy daily rollover at the record level: if the daily bucket belongs to
/// another date, zero it for `today`. Called at the top of every mutating
/// operation so the staleness check lives in exactly one place.
pub fn ensure_current_day(athlete: &mut Athlete, today: NaiveDate) {
    if athlete.daily_xp.date != today {
        log::debug!(
            "rolling daily bucket for {} from {} to {today}",
            athlete.id,
            athlete.daily_xp.date
        );
        athlete.daily_xp = crate::athlete::DailyXp::fresh(today);
    }
}

/// Award `base_xp` in `category`, applying the streak multiplier and
/// clamping to the remaining daily room. Rounds half away from zero.
pub fn award(
    athlete: &mut Athlete,
    base_xp: i64,
    category: XpCategory,
    today: NaiveDate,
) -> AwardOutcome {
    ensure_current_day(athlete, today);

    let room = (DAILY_XP_CAP - athlete.daily_xp.used()).max(0);
    let multiplier = current_multiplier(athlete, category);
    let raw = (base_xp as f64 * multiplier).round() as i64;
    let awarded = raw.min(room);
    if awarded <= 0 {
        if raw > 0 {
            log::debug!("award of {raw} for {} clamped to zero by daily cap", athlete.id);
        }
        return AwardOutcome::default();
    }

    let old_xp = athlete.xp;
    athlete.xp += awarded;
    *athlete.daily_xp.bucket_mut(category) += awarded;

    let old_level = level_of(old_xp);
    let new_level = level_of(athlete.xp);
    let level_up = (new_level.threshold > old_level.threshold).then_some(LevelUp {
        from: old_level,
        to: new_level,
    });

    AwardOutcome { awarded, level_up }
}

/// Reverse an earlier award of `base_xp` in `category`, recomputing the
/// amount with the athlete's *current* streak multiplier. When the daily
/// cap clamped the original award, this subtracts more than was granted;
/// that asymmetry is intentional and the caller-facing record of it lives
/// with the tests. Lifetime XP clamps at zero; the daily bucket is only
/// touched while it still belongs to today.
pub fn revert(athlete: &mut Athlete, base_xp: i64, category: XpCategory, today: NaiveDate) -> i64 {
    ensure_current_day(athlete, today);

    let multiplier = current_multiplier(athlete, category);
    let reverted = (base_xp as f64 * multiplier).round() as i64;
    if reverted <= 0 {
        return 0;
    }

    athlete.xp = (athlete.xp - reverted).max(0);
    let bucket = athlete.daily_xp.bucket_mut(category);
    *bucket = (*bucket - reverted).max(0);
    reverted
}
