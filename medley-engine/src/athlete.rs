//! Per-athlete durable state: identity, progression, streaks, and the
//! per-day award ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_WEEK_TARGET;
use crate::quests::QuestState;

/// Award category for the daily ledger. Pool and meet awards share the
/// pool-attendance streak; weight awards use the weight-room streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum XpCategory {
    #[default]
    Pool,
    Weight,
    Meet,
}

impl XpCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::Weight => "weight",
            Self::Meet => "meet",
        }
    }
}

impl fmt::Display for XpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XpCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pool" => Ok(Self::Pool),
            "weight" => Ok(Self::Weight),
            "meet" => Ok(Self::Meet),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    #[default]
    Unspecified,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            "unspecified" => Ok(Self::Unspecified),
            _ => Err(()),
        }
    }
}

/// XP awarded today, split by category. The whole bucket resets whenever
/// `date` no longer matches the current day; `pool + weight + meet` never
/// exceeds [`crate::constants::DAILY_XP_CAP`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyXp {
    pub date: NaiveDate,
    #[serde(default)]
    pub pool: i64,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub meet: i64,
}

impl Default for DailyXp {
    fn default() -> Self {
        // The sentinel date is always stale, so the first award of a day
        // rolls the bucket over before anything accumulates.
        Self {
            date: NaiveDate::MIN,
            pool: 0,
            weight: 0,
            meet: 0,
        }
    }
}

impl DailyXp {
    #[must_use]
    pub const fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            pool: 0,
            weight: 0,
            meet: 0,
        }
    }

    /// Total XP already awarded today across all categories.
    #[must_use]
    pub const fn used(&self) -> i64 {
        self.pool + self.weight + self.meet
    }

    #[must_use]
    pub const fn get(&self, category: XpCategory) -> i64 {
        match category {
            XpCategory::Pool => self.pool,
            XpCategory::Weight => self.weight,
            XpCategory::Meet => self.meet,
        }
    }

    pub const fn bucket_mut(&mut self, category: XpCategory) -> &mut i64 {
        match category {
            XpCategory::Pool => &mut self.pool,
            XpCategory::Weight => &mut self.weight,
            XpCategory::Meet => &mut self.meet,
        }
    }
}

/// One roster member. Created once at import, then mutated in place by the
/// state machine; lifetime totals survive every session and day boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Athlete {
    /// Stable slug derived from the name at creation, never regenerated.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Gender,
    /// Roster cohort tag; sessions and snapshots are scoped to it.
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub xp: i64,
    /// Consecutive-day pool attendance counter.
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub weight_streak: u32,
    /// Gates the pool streak to at most one increment per calendar day.
    #[serde(default)]
    pub last_streak_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_weight_streak_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_practices: u32,
    #[serde(default)]
    pub week_sessions: u32,
    #[serde(default)]
    pub week_weight_sessions: u32,
    /// Cohort-specific weekly goal; not athlete-mutable.
    #[serde(default = "default_week_target")]
    pub week_target: u32,
    /// Monday of the ISO week the weekly counters belong to.
    #[serde(default)]
    pub week_anchor: Option<NaiveDate>,
    #[serde(default)]
    pub checkpoints: BTreeMap<String, bool>,
    #[serde(default)]
    pub weight_checkpoints: BTreeMap<String, bool>,
    #[serde(default)]
    pub meet_checkpoints: BTreeMap<String, bool>,
    #[serde(default)]
    pub weight_challenges: BTreeMap<String, bool>,
    #[serde(default)]
    pub quests: BTreeMap<String, QuestState>,
    #[serde(default)]
    pub daily_xp: DailyXp,
    /// Checked in for the current session slot; cleared on boundary crossing.
    #[serde(default)]
    pub present: bool,
}

fn default_week_target() -> u32 {
    DEFAULT_WEEK_TARGET
}

impl Athlete {
    #[must_use]
    pub fn new(name: &str, age: Option<u8>, gender: Gender, group: &str) -> Self {
        Self {
            id: slugify(name),
            name: name.to_string(),
            age,
            gender,
            group: group.to_string(),
            week_target: DEFAULT_WEEK_TARGET,
            ..Self::default()
        }
    }

    /// Streak days governing the multiplier for an award category.
    #[must_use]
    pub const fn streak_days(&self, category: XpCategory) -> u32 {
        match category {
            XpCategory::Pool | XpCategory::Meet => self.streak,
            XpCategory::Weight => self.weight_streak,
        }
    }

    #[must_use]
    pub const fn checkpoint_map(&self, category: XpCategory) -> &BTreeMap<String, bool> {
        match category {
            XpCategory::Pool => &self.checkpoints,
            XpCategory::Weight => &self.weight_checkpoints,
            XpCategory::Meet => &self.meet_checkpoints,
        }
    }

    pub const fn checkpoint_map_mut(&mut self, category: XpCategory) -> &mut BTreeMap<String, bool> {
        match category {
            XpCategory::Pool => &mut self.checkpoints,
            XpCategory::Weight => &mut self.weight_checkpoints,
            XpCategory::Meet => &mut self.meet_checkpoints,
        }
    }

    /// Whether any transient per-session state is set (presence or any
    /// checked checkpoint in any category).
    #[must_use]
    pub fn has_session_activity(&self) -> bool {
        self.present
            || self.checkpoints.values().any(|checked| *checked)
            || self.weight_checkpoints.values().any(|checked| *checked)
            || self.meet_checkpoints.values().any(|checked| *checked)
    }

    /// Clear presence and all checkpoint maps without touching lifetime
    /// totals. Used when a session boundary crosses.
    pub fn clear_session_state(&mut self) {
        self.present = false;
        self.checkpoints.clear();
        self.weight_checkpoints.clear();
        self.meet_checkpoints.clear();
    }

    /// One-time idempotent upgrade for records loaded from older schemas:
    /// fills derivable gaps without touching already-valid fields.
    pub fn normalize(&mut self) {
        if self.id.is_empty() {
            self.id = slugify(&self.name);
        }
        if self.xp < 0 {
            log::warn!("athlete {} had negative xp {}; clamping", self.id, self.xp);
            self.xp = 0;
        }
        if self.week_target == 0 {
            self.week_target = DEFAULT_WEEK_TARGET;
        }
    }
}

/// Derive a stable slug id from a display name: lowercase alphanumerics
/// with single dashes. Called exactly once per athlete at creation.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("athlete");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Maya O'Brien"), "maya-o-brien");
        assert_eq!(slugify("  Lee,  Jo  "), "lee-jo");
        assert_eq!(slugify("Åsa Öst"), "åsa-öst");
        assert_eq!(slugify("!!!"), "athlete");
    }

    #[test]
    fn daily_bucket_default_is_stale() {
        let bucket = DailyXp::default();
        assert_eq!(bucket.used(), 0);
        assert!(bucket.date < NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid date"));
    }

    #[test]
    fn new_athlete_gets_slug_and_week_target() {
        let athlete = Athlete::new("Maya O'Brien", Some(12), Gender::Female, "juniors");
        assert_eq!(athlete.id, "maya-o-brien");
        assert_eq!(athlete.week_target, DEFAULT_WEEK_TARGET);
        assert!(!athlete.has_session_activity());
    }

    #[test]
    fn normalize_fills_gaps_only() {
        let mut athlete = Athlete {
            name: "Jo Lee".to_string(),
            xp: -5,
            week_target: 0,
            ..Athlete::default()
        };
        athlete.normalize();
        assert_eq!(athlete.id, "jo-lee");
        assert_eq!(athlete.xp, 0);
        assert_eq!(athlete.week_target, DEFAULT_WEEK_TARGET);

        // A second pass changes nothing.
        let before = athlete.clone();
        athlete.normalize();
        assert_eq!(athlete, before);
    }

    #[test]
    fn session_activity_spans_all_maps() {
        let mut athlete = Athlete::new("A", None, Gender::Unspecified, "seniors");
        athlete
            .weight_checkpoints
            .insert("showed-up".to_string(), true);
        assert!(athlete.has_session_activity());
        athlete.clear_session_state();
        assert!(!athlete.has_session_activity());
    }
}
