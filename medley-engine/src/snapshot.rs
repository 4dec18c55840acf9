//! Daily snapshots: the only historical time series in the system.
//!
//! One snapshot is written per calendar date per scope when a session
//! boundary folds the day into history; trend and window analytics read
//! nothing else.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::athlete::Athlete;
use crate::quests::QuestState;

/// Aggregate of one cohort's (or the whole team's) day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    /// Cohort scope; `None` means the whole roster.
    #[serde(default)]
    pub group: Option<String>,
    pub roster_size: u32,
    /// Athletes with any sign of check-in that day.
    pub attendance_count: u32,
    /// XP granted on the snapshot date across all categories.
    pub total_xp_awarded: i64,
    pub pool_checkins: u32,
    pub weight_checkins: u32,
    pub meet_checkins: u32,
    /// Lifetime quest completions as of the snapshot date.
    pub quests_completed: u32,
    /// Lifetime challenge completions as of the snapshot date.
    pub challenges_completed: u32,
    /// Lifetime XP per athlete as of the snapshot date.
    pub athlete_xps: BTreeMap<String, i64>,
    /// Pool streak per athlete as of the snapshot date.
    pub athlete_streaks: BTreeMap<String, u32>,
}

/// Fold the given athletes' current state into a snapshot for `date`.
/// Daily XP is only attributed when the athlete's bucket still belongs to
/// that date; later buckets mean the day already rolled for that athlete.
pub fn capture_snapshot<'a>(
    date: NaiveDate,
    group: Option<&str>,
    athletes: impl Iterator<Item = &'a Athlete>,
) -> DailySnapshot {
    let mut snapshot = DailySnapshot {
        date,
        group: group.map(str::to_string),
        roster_size: 0,
        attendance_count: 0,
        total_xp_awarded: 0,
        pool_checkins: 0,
        weight_checkins: 0,
        meet_checkins: 0,
        quests_completed: 0,
        challenges_completed: 0,
        athlete_xps: BTreeMap::new(),
        athlete_streaks: BTreeMap::new(),
    };

    for athlete in athletes {
        snapshot.roster_size += 1;
        if athlete.has_session_activity() {
            snapshot.attendance_count += 1;
        }
        if athlete.daily_xp.date == date {
            snapshot.total_xp_awarded += athlete.daily_xp.used();
        }
        if athlete.checkpoints.values().any(|on| *on) {
            snapshot.pool_checkins += 1;
        }
        if athlete.weight_checkpoints.values().any(|on| *on) {
            snapshot.weight_checkins += 1;
        }
        if athlete.meet_checkpoints.values().any(|on| *on) {
            snapshot.meet_checkins += 1;
        }
        snapshot.quests_completed += athlete
            .quests
            .values()
            .filter(|state| **state == QuestState::Done)
            .count() as u32;
        snapshot.challenges_completed +=
            athlete.weight_challenges.values().filter(|on| **on).count() as u32;
        snapshot.athlete_xps.insert(athlete.id.clone(), athlete.xp);
        snapshot
            .athlete_streaks
            .insert(athlete.id.clone(), athlete.streak);
    }

    snapshot
}
