//! Session boundary detection and the process-start stale-data sweep.
//!
//! A session is identified by `(date, slot, cohort group)`. When the key
//! seen for a cohort changes and that cohort shows in-progress check-in,
//! the previous session is folded into a write-once daily snapshot before
//! the transient per-session state is cleared. Lifetime totals are never
//! touched here.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::Clock;
use crate::athlete::{Athlete, DailyXp};
use crate::constants::STREAK_GRACE_DAYS;
use crate::roster::Roster;
use crate::snapshot::capture_snapshot;

/// Coarse time-of-day bucket for a practice slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionSlot {
    #[default]
    Morning,
    Afternoon,
    Evening,
}

impl SessionSlot {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }

    /// Bucket for an hour of the local day.
    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            0..12 => Self::Morning,
            12..17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }
}

impl fmt::Display for SessionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionSlot {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            _ => Err(()),
        }
    }
}

/// Identity of one practice slot for one cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionKey {
    pub date: NaiveDate,
    pub slot: SessionSlot,
    pub group: String,
}

/// What happened to one cohort during a boundary tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryOutcome {
    pub group: String,
    pub snapshot_written: bool,
}

/// Detect session boundaries for every cohort on the roster, folding and
/// resetting each crossed cohort independently. Cohorts whose key is
/// unchanged are untouched.
pub fn tick_session_boundaries(roster: &mut Roster, clock: &impl Clock) -> Vec<BoundaryOutcome> {
    let today = clock.today();
    let slot = clock.slot();
    let groups: BTreeSet<String> = roster
        .athletes
        .values()
        .map(|athlete| athlete.group.clone())
        .collect();

    let mut outcomes = Vec::new();
    for group in groups {
        let current = SessionKey {
            date: today,
            slot,
            group: group.clone(),
        };
        let Some(previous) = roster.session_keys.get(&group).cloned() else {
            // First sighting of this cohort: nothing to fold yet.
            roster.session_keys.insert(group.clone(), current);
            continue;
        };
        if previous == current {
            continue;
        }

        let in_progress = roster
            .athletes
            .values()
            .any(|athlete| athlete.group == group && athlete.has_session_activity());
        let mut snapshot_written = false;
        if in_progress && !roster.has_snapshot(previous.date, Some(&group)) {
            let snapshot = capture_snapshot(
                previous.date,
                Some(&group),
                roster
                    .athletes
                    .values()
                    .filter(|athlete| athlete.group == group),
            );
            log::info!(
                "folding session {}/{}/{} into snapshot",
                previous.date,
                previous.slot,
                group
            );
            roster.push_snapshot(snapshot);
            snapshot_written = true;
        }

        for athlete in roster
            .athletes
            .values_mut()
            .filter(|athlete| athlete.group == group)
        {
            athlete.clear_session_state();
        }
        roster.session_keys.insert(group.clone(), current);
        outcomes.push(BoundaryOutcome {
            group,
            snapshot_written,
        });
    }
    outcomes
}

/// Monday of the ISO week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    let iso = date.iso_week();
    NaiveDate::from_isoywd_opt(iso.year(), iso.week(), Weekday::Mon).unwrap_or(date)
}

/// Zero the weekly session counters when the ISO week has moved on.
/// Records with no anchor keep their counters and are stamped with the
/// current week, so older documents migrate without losing data.
pub(crate) fn roll_week_if_needed(athlete: &mut Athlete, today: NaiveDate) -> bool {
    let monday = week_start(today);
    match athlete.week_anchor {
        Some(anchor) if anchor == monday => false,
        Some(_) => {
            athlete.week_sessions = 0;
            athlete.week_weight_sessions = 0;
            athlete.week_anchor = Some(monday);
            true
        }
        None => {
            athlete.week_anchor = Some(monday);
            true
        }
    }
}

/// Process-start safety net: reset every athlete whose per-day state
/// belongs to an earlier date, break streaks whose markers have gone
/// stale, and roll weekly counters. Returns how many records changed.
pub fn run_stale_sweep(roster: &mut Roster, today: NaiveDate) -> usize {
    let mut touched = 0;
    for athlete in roster.athletes.values_mut() {
        let mut changed = false;

        if athlete.daily_xp.date != today {
            if athlete.daily_xp.used() > 0 || athlete.has_session_activity() {
                changed = true;
            }
            athlete.daily_xp = DailyXp::fresh(today);
            athlete.clear_session_state();
        }

        if let Some(last) = athlete.last_streak_date
            && today.signed_duration_since(last).num_days() > STREAK_GRACE_DAYS
            && athlete.streak > 0
        {
            log::debug!("streak for {} broken after gap", athlete.id);
            athlete.streak = 0;
            changed = true;
        }
        if let Some(last) = athlete.last_weight_streak_date
            && today.signed_duration_since(last).num_days() > STREAK_GRACE_DAYS
            && athlete.weight_streak > 0
        {
            athlete.weight_streak = 0;
            changed = true;
        }

        if roll_week_if_needed(athlete, today) {
            changed = true;
        }
        if changed {
            touched += 1;
        }
    }
    if touched > 0 {
        log::info!("stale sweep touched {touched} athlete records");
    }
    touched
}
