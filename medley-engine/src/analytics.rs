//! Coach-facing derived scores: attrition risk, culture score, peak
//! weekday windows, engagement trend, and standout selections.
//!
//! Everything here is a pure read over the roster, the snapshot history,
//! and the audit trail; nothing mutates state and every function is safe
//! to recompute on every read. Sparse histories degrade to neutral
//! results, never errors.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::athlete::{Athlete, Gender};
use crate::audit::{ActionKind, AuditTrail};
use crate::catalog::Catalog;
use crate::constants::{
    ATTRITION_ATTENDANCE_TIERS, ATTRITION_BROKEN_STREAK_MIN_PRACTICES,
    ATTRITION_BROKEN_STREAK_PENALTY, ATTRITION_FLAT_GROWTH_PENALTY, ATTRITION_NO_HELP_MIN_PRACTICES,
    ATTRITION_NO_HELP_PENALTY, ATTRITION_NO_QUEST_MIN_PRACTICES, ATTRITION_NO_QUEST_PENALTY,
    ATTRITION_SLOW_GROWTH_FLOOR, ATTRITION_SLOW_GROWTH_PENALTY, ATTRITION_WINDOW,
    CULTURE_ATTENDANCE_WEIGHT, CULTURE_ATTENDANCE_WINDOW, CULTURE_HELP_WEIGHT,
    CULTURE_POSITIVE_WEIGHT, CULTURE_QUEST_WEIGHT, CULTURE_STREAK_DIVISOR,
    CULTURE_STREAK_WEIGHT_CAP, IMPROVEMENT_LOOKBACK_DAYS, TREND_NEUTRAL_BAND_PCT, TREND_WINDOW,
};
use crate::quests::QuestState;
use crate::roster::Roster;
use crate::snapshot::DailySnapshot;

/// Average awarded XP per weekday, for finding the highest-yield slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekdayYield {
    pub weekday: Weekday,
    pub average_xp: f64,
    pub samples: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngagementTrend {
    pub delta_pct: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MostImproved {
    pub athlete_id: String,
    pub gain: i64,
}

fn avg_total_xp(snapshots: &[&DailySnapshot]) -> f64 {
    if snapshots.is_empty() {
        return 0.0;
    }
    let sum: i64 = snapshots.iter().map(|s| s.total_xp_awarded).sum();
    sum as f64 / snapshots.len() as f64
}

/// Whether `athlete_id` attended on the day of `snapshots[index]`,
/// inferred from the streak advancing relative to the prior snapshot.
fn attended(snapshots: &[&DailySnapshot], index: usize, athlete_id: &str) -> bool {
    let current = snapshots[index]
        .athlete_streaks
        .get(athlete_id)
        .copied()
        .unwrap_or(0);
    match index.checked_sub(1) {
        Some(prev_index) => {
            let previous = snapshots[prev_index]
                .athlete_streaks
                .get(athlete_id)
                .copied()
                .unwrap_or(0);
            current > previous
        }
        None => current > 0,
    }
}

/// Attrition risk in [0, 100]: additive penalties for poor attendance,
/// a broken streak, flat XP growth, and missing quest/social engagement.
#[must_use]
pub fn attrition_risk(athlete: &Athlete, snapshots: &[&DailySnapshot], audit: &AuditTrail) -> u32 {
    let mut risk = 0_u32;

    let window_start = snapshots.len().saturating_sub(ATTRITION_WINDOW);
    let window = &snapshots[window_start..];
    if !window.is_empty() {
        let attended_days = (0..window.len())
            .filter(|offset| attended(snapshots, window_start + *offset, &athlete.id))
            .count();
        let rate = attended_days as f64 / window.len() as f64;
        for (ceiling, penalty) in ATTRITION_ATTENDANCE_TIERS {
            if rate < *ceiling {
                risk += penalty;
                break;
            }
        }

        if window.len() >= 2 {
            let first = window[0].athlete_xps.get(&athlete.id).copied().unwrap_or(0);
            let last = window[window.len() - 1]
                .athlete_xps
                .get(&athlete.id)
                .copied()
                .unwrap_or(0);
            let growth = last - first;
            if growth <= 0 {
                risk += ATTRITION_FLAT_GROWTH_PENALTY;
            } else if growth < ATTRITION_SLOW_GROWTH_FLOOR {
                risk += ATTRITION_SLOW_GROWTH_PENALTY;
            }
        }
    }

    if athlete.streak == 0 && athlete.total_practices > ATTRITION_BROKEN_STREAK_MIN_PRACTICES {
        risk += ATTRITION_BROKEN_STREAK_PENALTY;
    }

    let engaged = athlete
        .quests
        .values()
        .any(|state| *state != QuestState::Pending);
    if !engaged && athlete.total_practices > ATTRITION_NO_QUEST_MIN_PRACTICES {
        risk += ATTRITION_NO_QUEST_PENALTY;
    }

    if audit.count_kind_for(&athlete.id, ActionKind::HelpedTeammate) == 0
        && athlete.total_practices > ATTRITION_NO_HELP_MIN_PRACTICES
    {
        risk += ATTRITION_NO_HELP_PENALTY;
    }

    risk.min(100)
}

/// Team culture score in [0, 100]: weighted blend of recent attendance,
/// help and positivity standouts, quest engagement, and average streak.
#[must_use]
pub fn culture_score(
    roster: &Roster,
    snapshots: &[&DailySnapshot],
    audit: &AuditTrail,
    catalog: &Catalog,
) -> u32 {
    let roster_size = roster.athletes.len();
    if roster_size == 0 {
        return 0;
    }
    let roster_size_f = roster_size as f64;
    let mut score = 0.0_f64;

    let window_start = snapshots.len().saturating_sub(CULTURE_ATTENDANCE_WINDOW);
    let window = &snapshots[window_start..];
    if !window.is_empty() {
        let fraction_sum: f64 = window
            .iter()
            .map(|snapshot| {
                f64::from(snapshot.attendance_count) / f64::from(snapshot.roster_size.max(1))
            })
            .sum();
        score += CULTURE_ATTENDANCE_WEIGHT * (fraction_sum / window.len() as f64);
    }

    let help_actions = audit.of_kind(ActionKind::HelpedTeammate).count() as f64;
    score += (CULTURE_HELP_WEIGHT * help_actions / roster_size_f).min(CULTURE_HELP_WEIGHT);

    let positive_actions = audit.of_kind(ActionKind::PositiveAttitude).count() as f64;
    score +=
        (CULTURE_POSITIVE_WEIGHT * positive_actions / roster_size_f).min(CULTURE_POSITIVE_WEIGHT);

    if !catalog.quests.is_empty() {
        let engaged: usize = roster
            .athletes
            .values()
            .map(|athlete| {
                athlete
                    .quests
                    .values()
                    .filter(|state| **state != QuestState::Pending)
                    .count()
            })
            .sum();
        let denominator = roster_size_f * catalog.quests.len() as f64;
        score += (CULTURE_QUEST_WEIGHT * engaged as f64 / denominator).min(CULTURE_QUEST_WEIGHT);
    }

    let streak_sum: u64 = roster
        .athletes
        .values()
        .map(|athlete| u64::from(athlete.streak))
        .sum();
    let average_streak = streak_sum as f64 / roster_size_f;
    score += (average_streak / CULTURE_STREAK_DIVISOR).min(CULTURE_STREAK_WEIGHT_CAP);

    (score.round() as u32).min(100)
}

/// Average awarded XP grouped by weekday, highest-yield first. Operates
/// on whatever snapshots exist; calendar gaps simply contribute nothing.
#[must_use]
pub fn peak_performance_windows(snapshots: &[&DailySnapshot]) -> Vec<WeekdayYield> {
    let mut buckets: Vec<(Weekday, i64, u32)> = Vec::new();
    for snapshot in snapshots {
        let weekday = snapshot.date.weekday();
        match buckets.iter_mut().find(|(day, _, _)| *day == weekday) {
            Some((_, total, count)) => {
                *total += snapshot.total_xp_awarded;
                *count += 1;
            }
            None => buckets.push((weekday, snapshot.total_xp_awarded, 1)),
        }
    }
    let mut yields: Vec<WeekdayYield> = buckets
        .into_iter()
        .map(|(weekday, total, samples)| WeekdayYield {
            weekday,
            average_xp: total as f64 / f64::from(samples),
            samples,
        })
        .collect();
    yields.sort_by(|a, b| b.average_xp.total_cmp(&a.average_xp));
    yields
}

/// Recent-vs-prior window comparison of awarded XP. Histories too short
/// to compare classify as neutral.
#[must_use]
pub fn engagement_trend(snapshots: &[&DailySnapshot]) -> EngagementTrend {
    if snapshots.len() < 2 {
        return EngagementTrend::default();
    }
    let recent_start = snapshots.len().saturating_sub(TREND_WINDOW);
    let recent = &snapshots[recent_start..];
    let prior_start = recent_start.saturating_sub(TREND_WINDOW);
    let prior = &snapshots[prior_start..recent_start];
    if prior.is_empty() {
        return EngagementTrend::default();
    }

    let recent_avg = avg_total_xp(recent);
    let prior_avg = avg_total_xp(prior);
    if prior_avg <= 0.0 {
        return if recent_avg > 0.0 {
            EngagementTrend {
                delta_pct: 100.0,
                direction: TrendDirection::Up,
            }
        } else {
            EngagementTrend::default()
        };
    }

    let delta_pct = (recent_avg - prior_avg) / prior_avg * 100.0;
    let direction = if delta_pct > TREND_NEUTRAL_BAND_PCT {
        TrendDirection::Up
    } else if delta_pct < -TREND_NEUTRAL_BAND_PCT {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };
    EngagementTrend { delta_pct, direction }
}

/// Largest XP gain since the snapshot closest to thirty days ago.
/// Returns `None` when the history is too short to compare.
#[must_use]
pub fn most_improved(
    roster: &Roster,
    snapshots: &[&DailySnapshot],
    today: NaiveDate,
) -> Option<MostImproved> {
    if snapshots.len() < 2 || roster.athletes.is_empty() {
        return None;
    }
    let anchor = today
        .checked_sub_days(Days::new(IMPROVEMENT_LOOKBACK_DAYS))
        .unwrap_or(today);
    let baseline = snapshots.iter().min_by_key(|snapshot| {
        snapshot.date.signed_duration_since(anchor).num_days().abs()
    })?;

    roster
        .athletes
        .values()
        .map(|athlete| MostImproved {
            athlete_id: athlete.id.clone(),
            gain: athlete.xp - baseline.athlete_xps.get(&athlete.id).copied().unwrap_or(0),
        })
        .max_by_key(|candidate| candidate.gain)
}

/// Highest lifetime XP, optionally restricted to one gender bracket.
#[must_use]
pub fn mvp(roster: &Roster, gender: Option<Gender>) -> Option<&Athlete> {
    roster
        .athletes
        .values()
        .filter(|athlete| gender.is_none_or(|wanted| athlete.gender == wanted))
        .max_by_key(|athlete| athlete.xp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("valid date")
    }

    fn snapshot(date: NaiveDate, total_xp: i64) -> DailySnapshot {
        DailySnapshot {
            date,
            group: None,
            roster_size: 10,
            attendance_count: 0,
            total_xp_awarded: total_xp,
            pool_checkins: 0,
            weight_checkins: 0,
            meet_checkins: 0,
            quests_completed: 0,
            challenges_completed: 0,
            athlete_xps: BTreeMap::new(),
            athlete_streaks: BTreeMap::new(),
        }
    }

    #[test]
    fn trend_needs_two_snapshots() {
        let single = snapshot(day(1), 50);
        let refs: Vec<&DailySnapshot> = vec![&single];
        assert_eq!(engagement_trend(&[]).direction, TrendDirection::Neutral);
        assert_eq!(engagement_trend(&refs).direction, TrendDirection::Neutral);
    }

    #[test]
    fn trend_classifies_against_band() {
        let owned: Vec<DailySnapshot> = (1..=14)
            .map(|d| snapshot(day(d), if d <= 7 { 100 } else { 120 }))
            .collect();
        let refs: Vec<&DailySnapshot> = owned.iter().collect();
        let trend = engagement_trend(&refs);
        assert_eq!(trend.direction, TrendDirection::Up);
        assert!((trend.delta_pct - 20.0).abs() < 1e-9);

        let owned: Vec<DailySnapshot> = (1..=14)
            .map(|d| snapshot(day(d), if d <= 7 { 100 } else { 97 }))
            .collect();
        let refs: Vec<&DailySnapshot> = owned.iter().collect();
        assert_eq!(engagement_trend(&refs).direction, TrendDirection::Neutral);
    }

    #[test]
    fn peak_windows_sort_by_yield() {
        // 2026-03-02 is a Monday, 2026-03-04 a Wednesday.
        let owned = [
            snapshot(day(2), 50),
            snapshot(day(4), 200),
            snapshot(day(9), 70),
            snapshot(day(11), 180),
        ];
        let refs: Vec<&DailySnapshot> = owned.iter().collect();
        let yields = peak_performance_windows(&refs);
        assert_eq!(yields[0].weekday, Weekday::Wed);
        assert!((yields[0].average_xp - 190.0).abs() < 1e-9);
        assert_eq!(yields[1].weekday, Weekday::Mon);
        assert_eq!(yields[0].samples, 2);
    }

    #[test]
    fn empty_roster_scores_zero_everywhere() {
        let roster = Roster::new();
        let audit = AuditTrail::new();
        assert_eq!(culture_score(&roster, &[], &audit, Catalog::shared()), 0);
        assert!(mvp(&roster, None).is_none());
        assert!(most_improved(&roster, &[], day(2)).is_none());
    }

    #[test]
    fn mvp_respects_gender_filter() {
        let mut roster = Roster::new();
        roster.add_athlete("Ann", None, Gender::Female, "juniors");
        roster.add_athlete("Ben", None, Gender::Male, "juniors");
        if let Some(ann) = roster.athletes.get_mut("ann") {
            ann.xp = 100;
        }
        if let Some(ben) = roster.athletes.get_mut("ben") {
            ben.xp = 300;
        }
        assert_eq!(mvp(&roster, None).map(|a| a.id.as_str()), Some("ben"));
        assert_eq!(
            mvp(&roster, Some(Gender::Female)).map(|a| a.id.as_str()),
            Some("ann")
        );
    }
}
