//! Centralized scoring and tuning constants for the Medley engine.
//!
//! These values define the deterministic math for progression, streak
//! multipliers, and daily award caps. Keeping them together ensures that
//! balance can only be adjusted via code changes reviewed in version
//! control, rather than through external assets.

use crate::progression::Level;

// Level ladder --------------------------------------------------------------
// Ascending by threshold; threshold 0 is the floor level.
pub const LEVELS: &[Level] = &[
    Level {
        name: "Minnow",
        threshold: 0,
    },
    Level {
        name: "Stingray",
        threshold: 250,
    },
    Level {
        name: "Barracuda",
        threshold: 600,
    },
    Level {
        name: "Marlin",
        threshold: 1_200,
    },
    Level {
        name: "Shark",
        threshold: 2_000,
    },
    Level {
        name: "Orca",
        threshold: 3_200,
    },
    Level {
        name: "Kraken",
        threshold: 5_000,
    },
];

// Streak multiplier tiers ---------------------------------------------------
// Pairs of (minimum consecutive days, multiplier); the largest threshold
// less than or equal to the streak wins.
pub const POOL_STREAK_TIERS: &[(u32, f64)] = &[
    (0, 1.0),
    (3, 1.25),
    (7, 1.5),
    (14, 1.75),
    (30, 2.0),
    (60, 2.5),
];

pub const WEIGHT_STREAK_TIERS: &[(u32, f64)] = &[(0, 1.0), (3, 1.25), (7, 1.5)];

// Daily award caps ----------------------------------------------------------
/// Maximum XP any athlete may earn per calendar day across all categories.
pub const DAILY_XP_CAP: i64 = 150;

/// Base XP granted for checking in to a session, before multipliers.
pub const PRESENT_BASE_XP: i64 = 10;

// Streak bookkeeping --------------------------------------------------------
/// A gap of more than this many days since the last streak stamp breaks
/// the streak on the next sweep or increment.
pub const STREAK_GRACE_DAYS: i64 = 1;

// Audit trail ---------------------------------------------------------------
/// Bounded capacity of the audit ring; oldest entries drop past this.
pub const AUDIT_LOG_CAP: usize = 2_000;

// Analytics windows ---------------------------------------------------------
pub(crate) const ATTRITION_WINDOW: usize = 14;
pub(crate) const TREND_WINDOW: usize = 7;
pub(crate) const CULTURE_ATTENDANCE_WINDOW: usize = 7;
pub(crate) const IMPROVEMENT_LOOKBACK_DAYS: u64 = 30;

// Attrition risk components (sum to 100 at worst) ---------------------------
pub(crate) const ATTRITION_ATTENDANCE_TIERS: &[(f64, u32)] =
    &[(0.30, 40), (0.50, 25), (0.70, 10)];
pub(crate) const ATTRITION_BROKEN_STREAK_PENALTY: u32 = 20;
pub(crate) const ATTRITION_BROKEN_STREAK_MIN_PRACTICES: u32 = 3;
pub(crate) const ATTRITION_FLAT_GROWTH_PENALTY: u32 = 20;
pub(crate) const ATTRITION_SLOW_GROWTH_PENALTY: u32 = 10;
pub(crate) const ATTRITION_SLOW_GROWTH_FLOOR: i64 = 50;
pub(crate) const ATTRITION_NO_QUEST_PENALTY: u32 = 15;
pub(crate) const ATTRITION_NO_QUEST_MIN_PRACTICES: u32 = 5;
pub(crate) const ATTRITION_NO_HELP_PENALTY: u32 = 5;
pub(crate) const ATTRITION_NO_HELP_MIN_PRACTICES: u32 = 3;

// Culture score weights (sum to 100 at best) --------------------------------
pub(crate) const CULTURE_ATTENDANCE_WEIGHT: f64 = 30.0;
pub(crate) const CULTURE_HELP_WEIGHT: f64 = 25.0;
pub(crate) const CULTURE_POSITIVE_WEIGHT: f64 = 20.0;
pub(crate) const CULTURE_QUEST_WEIGHT: f64 = 15.0;
pub(crate) const CULTURE_STREAK_WEIGHT_CAP: f64 = 10.0;
pub(crate) const CULTURE_STREAK_DIVISOR: f64 = 3.0;

// Engagement trend ----------------------------------------------------------
/// Percent delta beyond which the trend is classified as up or down.
pub(crate) const TREND_NEUTRAL_BAND_PCT: f64 = 5.0;

// Roster defaults -----------------------------------------------------------
/// Weekly session goal applied to athletes whose cohort sets no override.
pub const DEFAULT_WEEK_TARGET: u32 = 3;
