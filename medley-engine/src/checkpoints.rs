//! Checkpoint toggles and the compound presence operation.
//!
//! These are the coach-facing mutations of a live session: flip one
//! checkpoint, or check an athlete in/out with the bulk apply/revert
//! semantics that go with it. Every applied action writes exactly one
//! audit entry.

use chrono::NaiveDate;

use crate::Clock;
use crate::athlete::{Athlete, XpCategory};
use crate::audit::{ActionKind, AuditEntry};
use crate::catalog::{Catalog, StandoutKind};
use crate::constants::{PRESENT_BASE_XP, STREAK_GRACE_DAYS};
use crate::ledger::{LevelUp, award, revert};
use crate::progression::level_of;
use crate::roster::Roster;
use crate::sessions::roll_week_if_needed;

/// Result of one checkpoint or challenge flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToggleOutcome {
    /// Whether the flag is set after the toggle.
    pub checked: bool,
    /// Signed XP applied to the athlete, after multiplier and cap.
    pub xp_delta: i64,
    pub level_up: Option<LevelUp>,
}

/// Result of a presence flip, covering the whole compound operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenceOutcome {
    pub present: bool,
    pub xp_delta: i64,
    pub level_up: Option<LevelUp>,
}

/// Increment the streak matching `category` at most once per calendar
/// day, stamping the gate date and the lifetime/weekly session counters.
/// A gap beyond the grace window restarts the streak at 1. Meet sessions
/// never drive streaks.
pub(crate) fn bump_streak(athlete: &mut Athlete, category: XpCategory, today: NaiveDate) -> bool {
    roll_week_if_needed(athlete, today);
    match category {
        XpCategory::Pool => {
            if athlete.last_streak_date == Some(today) {
                return false;
            }
            if let Some(last) = athlete.last_streak_date
                && today.signed_duration_since(last).num_days() > STREAK_GRACE_DAYS
            {
                athlete.streak = 0;
            }
            athlete.streak = athlete.streak.saturating_add(1);
            athlete.last_streak_date = Some(today);
            athlete.total_practices = athlete.total_practices.saturating_add(1);
            athlete.week_sessions = athlete.week_sessions.saturating_add(1);
            true
        }
        XpCategory::Weight => {
            if athlete.last_weight_streak_date == Some(today) {
                return false;
            }
            if let Some(last) = athlete.last_weight_streak_date
                && today.signed_duration_since(last).num_days() > STREAK_GRACE_DAYS
            {
                athlete.weight_streak = 0;
            }
            athlete.weight_streak = athlete.weight_streak.saturating_add(1);
            athlete.last_weight_streak_date = Some(today);
            athlete.week_weight_sessions = athlete.week_weight_sessions.saturating_add(1);
            true
        }
        XpCategory::Meet => false,
    }
}

/// Flip one checkpoint. Checking awards XP (and bumps the streak when the
/// checkpoint is the attendance marker); unchecking reverts at the current
/// multiplier. Unknown athlete or checkpoint ids are safe no-ops.
pub fn toggle_checkpoint(
    roster: &mut Roster,
    catalog: &Catalog,
    clock: &impl Clock,
    actor: &str,
    athlete_id: &str,
    category: XpCategory,
    checkpoint_id: &str,
) -> Option<ToggleOutcome> {
    let def = catalog.checkpoint(category, checkpoint_id)?;
    let today = clock.today();
    let athlete = roster.athletes.get_mut(athlete_id)?;
    let athlete_name = athlete.name.clone();

    let was_checked = athlete
        .checkpoint_map(category)
        .get(checkpoint_id)
        .copied()
        .unwrap_or(false);

    let (xp_delta, level_up) = if was_checked {
        (-revert(athlete, def.xp, category, today), None)
    } else {
        let result = award(athlete, def.xp, category, today);
        (result.awarded, result.level_up)
    };
    athlete
        .checkpoint_map_mut(category)
        .insert(checkpoint_id.to_string(), !was_checked);
    if !was_checked && def.streak_trigger {
        bump_streak(athlete, category, today);
    }

    let kind = match def.standout {
        Some(StandoutKind::Helped) => ActionKind::HelpedTeammate,
        Some(StandoutKind::Positive) => ActionKind::PositiveAttitude,
        None => ActionKind::Checkpoint,
    };
    let label = if was_checked {
        format!("Unchecked {} ({category})", def.name)
    } else {
        format!("Checked {} ({category}, {xp_delta:+})", def.name)
    };
    roster.audit.append(AuditEntry {
        timestamp: clock.now(),
        actor: actor.to_string(),
        athlete_id: athlete_id.to_string(),
        athlete_name,
        kind,
        label,
        xp_delta,
        category: Some(category),
        target: Some(checkpoint_id.to_string()),
    });

    Some(ToggleOutcome {
        checked: !was_checked,
        xp_delta,
        level_up,
    })
}

/// Check an athlete in or out of the current session.
///
/// Checking in awards the presence base XP, bulk-applies every `auto`
/// checkpoint of the session category, and performs the once-per-day
/// streak increment. Checking out reverses *every* checked checkpoint in
/// the category (standouts included) plus the presence base, each at the
/// current multiplier.
pub fn toggle_present(
    roster: &mut Roster,
    catalog: &Catalog,
    clock: &impl Clock,
    actor: &str,
    athlete_id: &str,
    category: XpCategory,
) -> Option<PresenceOutcome> {
    let today = clock.today();
    let athlete = roster.athletes.get_mut(athlete_id)?;
    let athlete_name = athlete.name.clone();
    let old_level = level_of(athlete.xp);
    let mut xp_delta = 0_i64;

    let now_present = !athlete.present;
    if now_present {
        athlete.present = true;
        xp_delta += award(athlete, PRESENT_BASE_XP, category, today).awarded;
        for def in catalog.checkpoint_defs(category).iter().filter(|d| d.auto) {
            let already = athlete
                .checkpoint_map(category)
                .get(&def.id)
                .copied()
                .unwrap_or(false);
            if already {
                continue;
            }
            xp_delta += award(athlete, def.xp, category, today).awarded;
            athlete
                .checkpoint_map_mut(category)
                .insert(def.id.clone(), true);
        }
        bump_streak(athlete, category, today);
    } else {
        athlete.present = false;
        let checked: Vec<String> = athlete
            .checkpoint_map(category)
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| id.clone())
            .collect();
        for id in checked {
            if let Some(def) = catalog.checkpoint(category, &id) {
                xp_delta -= revert(athlete, def.xp, category, today);
            } else {
                log::warn!("checked checkpoint {id} missing from catalog; clearing flag only");
            }
            athlete.checkpoint_map_mut(category).insert(id, false);
        }
        xp_delta -= revert(athlete, PRESENT_BASE_XP, category, today);
    }

    let new_level = level_of(athlete.xp);
    let level_up = (new_level.threshold > old_level.threshold).then_some(LevelUp {
        from: old_level,
        to: new_level,
    });

    let (kind, label) = if now_present {
        (
            ActionKind::CheckIn,
            format!("Checked in ({category}, {xp_delta:+})"),
        )
    } else {
        (
            ActionKind::CheckOut,
            format!("Marked absent ({category}, {xp_delta:+})"),
        )
    };
    roster.audit.append(AuditEntry {
        timestamp: clock.now(),
        actor: actor.to_string(),
        athlete_id: athlete_id.to_string(),
        athlete_name,
        kind,
        label,
        xp_delta,
        category: Some(category),
        target: None,
    });

    Some(PresenceOutcome {
        present: now_present,
        xp_delta,
        level_up,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedClock;
    use crate::athlete::Gender;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("valid date")
    }

    fn setup() -> (Roster, Catalog, FixedClock) {
        let mut roster = Roster::default();
        roster.insert_athlete(Athlete::new("Maya", Some(12), Gender::Female, "juniors"));
        (roster, Catalog::shared().clone(), FixedClock::on(day(2)))
    }

    #[test]
    fn checking_awards_and_unchecking_reverts() {
        let (mut roster, catalog, clock) = setup();
        let on = toggle_checkpoint(
            &mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool, "main-set",
        )
        .expect("known ids");
        assert!(on.checked);
        assert_eq!(on.xp_delta, 10);

        let off = toggle_checkpoint(
            &mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool, "main-set",
        )
        .expect("known ids");
        assert!(!off.checked);
        assert_eq!(off.xp_delta, -10);
        assert_eq!(roster.athletes["maya"].xp, 0);
        assert_eq!(roster.audit.len(), 2);
    }

    #[test]
    fn streak_trigger_fires_once_per_day() {
        let (mut roster, catalog, clock) = setup();
        toggle_checkpoint(
            &mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool, "practice-complete",
        );
        assert_eq!(roster.athletes["maya"].streak, 1);
        assert_eq!(roster.athletes["maya"].total_practices, 1);

        // Untoggle and retoggle the trigger on the same day: no second bump.
        toggle_checkpoint(
            &mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool, "practice-complete",
        );
        toggle_checkpoint(
            &mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool, "practice-complete",
        );
        assert_eq!(roster.athletes["maya"].streak, 1);
        assert_eq!(roster.athletes["maya"].total_practices, 1);
    }

    #[test]
    fn streak_continues_next_day_and_breaks_after_gap() {
        let (mut roster, catalog, _) = setup();
        for d in [2, 3, 4] {
            toggle_checkpoint(
                &mut roster,
                &catalog,
                &FixedClock::on(day(d)),
                "coach",
                "maya",
                XpCategory::Pool,
                "practice-complete",
            );
        }
        assert_eq!(roster.athletes["maya"].streak, 3);

        // Two missed days: streak restarts at 1.
        toggle_checkpoint(
            &mut roster,
            &catalog,
            &FixedClock::on(day(7)),
            "coach",
            "maya",
            XpCategory::Pool,
            "practice-complete",
        );
        assert_eq!(roster.athletes["maya"].streak, 1);
        assert_eq!(roster.athletes["maya"].total_practices, 4);
    }

    #[test]
    fn check_in_applies_auto_checkpoints_and_streak() {
        let (mut roster, catalog, clock) = setup();
        let outcome =
            toggle_present(&mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool)
                .expect("known athlete");
        assert!(outcome.present);
        // present 10 + warmup 5 + drills 5 + main-set 10 + cooldown 5 +
        // practice-complete 10, all at 1.0x.
        assert_eq!(outcome.xp_delta, 45);
        let athlete = &roster.athletes["maya"];
        assert!(athlete.checkpoints["practice-complete"]);
        assert!(!athlete.checkpoints.contains_key("helped-teammate"));
        assert_eq!(athlete.streak, 1);
        assert_eq!(roster.audit.len(), 1);
    }

    #[test]
    fn marking_absent_reverts_manual_checkpoints_too() {
        let (mut roster, catalog, clock) = setup();
        toggle_present(&mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool);
        toggle_checkpoint(
            &mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool, "helped-teammate",
        );
        assert_eq!(roster.athletes["maya"].daily_xp.pool, 60);

        let outcome =
            toggle_present(&mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool)
                .expect("known athlete");
        assert!(!outcome.present);
        assert_eq!(outcome.xp_delta, -60);
        let athlete = &roster.athletes["maya"];
        assert_eq!(athlete.daily_xp.pool, 0);
        assert_eq!(athlete.xp, 0);
        assert!(athlete.checkpoints.values().all(|on| !on));
    }

    #[test]
    fn presence_streak_bump_is_shared_with_trigger_checkpoint() {
        let (mut roster, catalog, clock) = setup();
        toggle_checkpoint(
            &mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool, "practice-complete",
        );
        // The check-in on the same day must not double-count the streak.
        toggle_present(&mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool);
        assert_eq!(roster.athletes["maya"].streak, 1);
        assert_eq!(roster.athletes["maya"].week_sessions, 1);
    }

    #[test]
    fn standout_checkpoints_audit_their_kind() {
        let (mut roster, catalog, clock) = setup();
        toggle_checkpoint(
            &mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool, "helped-teammate",
        );
        assert_eq!(
            roster.audit.count_kind_for("maya", ActionKind::HelpedTeammate),
            1
        );
        assert_eq!(roster.audit.count_kind_for("maya", ActionKind::Checkpoint), 0);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let (mut roster, catalog, clock) = setup();
        assert!(
            toggle_checkpoint(
                &mut roster, &catalog, &clock, "coach", "maya", XpCategory::Pool, "no-such",
            )
            .is_none()
        );
        assert!(
            toggle_present(&mut roster, &catalog, &clock, "coach", "nobody", XpCategory::Pool)
                .is_none()
        );
        assert!(roster.audit.is_empty());
    }

    #[test]
    fn weight_session_tracks_its_own_streak() {
        let (mut roster, catalog, clock) = setup();
        toggle_present(&mut roster, &catalog, &clock, "coach", "maya", XpCategory::Weight);
        let athlete = &roster.athletes["maya"];
        assert_eq!(athlete.weight_streak, 1);
        assert_eq!(athlete.streak, 0);
        assert_eq!(athlete.week_weight_sessions, 1);
        assert_eq!(athlete.week_sessions, 0);
        // Weight presence does not count as a pool practice.
        assert_eq!(athlete.total_practices, 0);
    }
}
