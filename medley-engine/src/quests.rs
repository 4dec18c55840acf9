//! Quest lifecycle and weight-challenge toggles.
//!
//! Quests move through `pending -> active -> submitted -> done`, with a
//! denial edge back from `submitted` to `active` and a coach override
//! straight from `active` to `done`. Only the transition into `done`
//! grants XP; everything else is XP-neutral bookkeeping.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Clock;
use crate::athlete::XpCategory;
use crate::audit::{ActionKind, AuditEntry};
use crate::catalog::Catalog;
use crate::checkpoints::ToggleOutcome;
use crate::ledger::{LevelUp, award, revert};
use crate::roster::Roster;

/// Per-athlete lifecycle state of one quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestState {
    #[default]
    Pending,
    Active,
    Submitted,
    Done,
}

impl QuestState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Submitted => "submitted",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for QuestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "submitted" => Ok(Self::Submitted),
            "done" => Ok(Self::Done),
            _ => Err(()),
        }
    }
}

// Older documents may carry state strings this build no longer knows.
// Degrade those to `pending` instead of failing the whole roster load.
impl<'de> Deserialize<'de> for QuestState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_str(&raw).unwrap_or_else(|()| {
            log::warn!("unknown quest state {raw:?}; treating as pending");
            Self::Pending
        }))
    }
}

/// Coach operations on a quest assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestAction {
    /// Put the quest on the athlete's board as `pending`.
    Assign,
    /// `pending -> active`.
    Start,
    /// `active -> submitted`.
    Submit,
    /// `submitted -> active`; the quest stays assigned for resubmission.
    Deny,
    /// `submitted -> done`, or `active -> done` as a coach override.
    /// The only XP-bearing transition.
    Approve,
}

/// Result of an applied quest transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestOutcome {
    pub state: QuestState,
    pub awarded: i64,
    pub level_up: Option<LevelUp>,
}

/// Apply one quest action. Returns `None` (a safe no-op) for unknown
/// athletes, unknown quest ids, and invalid transitions.
pub fn apply_quest_action(
    roster: &mut Roster,
    catalog: &Catalog,
    clock: &impl Clock,
    actor: &str,
    athlete_id: &str,
    quest_id: &str,
    action: QuestAction,
) -> Option<QuestOutcome> {
    let quest = catalog.quest(quest_id)?;
    let today = clock.today();
    let athlete = roster.athletes.get_mut(athlete_id)?;

    let current = athlete.quests.get(quest_id).copied();
    let next = match (action, current) {
        (QuestAction::Assign, None) => QuestState::Pending,
        (QuestAction::Start, Some(QuestState::Pending)) => QuestState::Active,
        (QuestAction::Submit, Some(QuestState::Active)) => QuestState::Submitted,
        (QuestAction::Deny, Some(QuestState::Submitted)) => QuestState::Active,
        (QuestAction::Approve, Some(QuestState::Submitted | QuestState::Active)) => {
            QuestState::Done
        }
        _ => return None,
    };

    let outcome = if next == QuestState::Done {
        let result = award(athlete, quest.xp, XpCategory::Pool, today);
        QuestOutcome {
            state: next,
            awarded: result.awarded,
            level_up: result.level_up,
        }
    } else {
        QuestOutcome {
            state: next,
            awarded: 0,
            level_up: None,
        }
    };
    athlete.quests.insert(quest_id.to_string(), next);

    let label = match action {
        QuestAction::Assign => format!("Assigned quest: {}", quest.name),
        QuestAction::Start => format!("Started quest: {}", quest.name),
        QuestAction::Submit => format!("Submitted quest: {}", quest.name),
        QuestAction::Deny => format!("Denied quest submission: {}", quest.name),
        QuestAction::Approve => format!("Completed quest: {} (+{})", quest.name, outcome.awarded),
    };
    let entry = AuditEntry {
        timestamp: clock.now(),
        actor: actor.to_string(),
        athlete_id: athlete_id.to_string(),
        athlete_name: roster
            .athletes
            .get(athlete_id)
            .map(|a| a.name.clone())
            .unwrap_or_default(),
        kind: ActionKind::Quest,
        label,
        xp_delta: outcome.awarded,
        category: (outcome.awarded != 0).then_some(XpCategory::Pool),
        target: Some(quest_id.to_string()),
    };
    roster.audit.append(entry);

    Some(outcome)
}

/// Flip a weight challenge: award on enable, revert on disable. Same
/// no-op contract as checkpoint toggles.
pub fn toggle_challenge(
    roster: &mut Roster,
    catalog: &Catalog,
    clock: &impl Clock,
    actor: &str,
    athlete_id: &str,
    challenge_id: &str,
) -> Option<ToggleOutcome> {
    let challenge = catalog.challenge(challenge_id)?;
    let today = clock.today();
    let athlete = roster.athletes.get_mut(athlete_id)?;
    let athlete_name = athlete.name.clone();

    let was_on = athlete
        .weight_challenges
        .get(challenge_id)
        .copied()
        .unwrap_or(false);

    let (xp_delta, level_up) = if was_on {
        let reverted = revert(athlete, challenge.xp, XpCategory::Weight, today);
        (-reverted, None)
    } else {
        let result = award(athlete, challenge.xp, XpCategory::Weight, today);
        (result.awarded, result.level_up)
    };
    athlete
        .weight_challenges
        .insert(challenge_id.to_string(), !was_on);

    let label = if was_on {
        format!("Cleared challenge: {}", challenge.name)
    } else {
        format!("Completed challenge: {} (+{xp_delta})", challenge.name)
    };
    roster.audit.append(AuditEntry {
        timestamp: clock.now(),
        actor: actor.to_string(),
        athlete_id: athlete_id.to_string(),
        athlete_name,
        kind: ActionKind::Challenge,
        label,
        xp_delta,
        category: Some(XpCategory::Weight),
        target: Some(challenge_id.to_string()),
    });

    Some(ToggleOutcome {
        checked: !was_on,
        xp_delta,
        level_up,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedClock;
    use crate::athlete::{Athlete, Gender};
    use chrono::NaiveDate;

    fn setup() -> (Roster, Catalog, FixedClock) {
        let mut roster = Roster::default();
        roster.insert_athlete(Athlete::new("Maya", Some(12), Gender::Female, "juniors"));
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"));
        (roster, Catalog::shared().clone(), clock)
    }

    #[test]
    fn full_lifecycle_awards_once_at_done() {
        let (mut roster, catalog, clock) = setup();
        for action in [QuestAction::Assign, QuestAction::Start, QuestAction::Submit] {
            let outcome =
                apply_quest_action(&mut roster, &catalog, &clock, "coach", "maya", "flip-turn", action)
                    .expect("valid transition");
            assert_eq!(outcome.awarded, 0);
        }
        let outcome = apply_quest_action(
            &mut roster,
            &catalog,
            &clock,
            "coach",
            "maya",
            "flip-turn",
            QuestAction::Approve,
        )
        .expect("approves");
        assert_eq!(outcome.state, QuestState::Done);
        assert_eq!(outcome.awarded, 40);
        assert_eq!(roster.athletes["maya"].xp, 40);
        assert_eq!(roster.audit.len(), 4);
    }

    #[test]
    fn deny_returns_to_active_without_xp() {
        let (mut roster, catalog, clock) = setup();
        apply_quest_action(&mut roster, &catalog, &clock, "coach", "maya", "flip-turn", QuestAction::Assign);
        apply_quest_action(&mut roster, &catalog, &clock, "coach", "maya", "flip-turn", QuestAction::Start);
        apply_quest_action(&mut roster, &catalog, &clock, "coach", "maya", "flip-turn", QuestAction::Submit);
        let outcome = apply_quest_action(
            &mut roster,
            &catalog,
            &clock,
            "coach",
            "maya",
            "flip-turn",
            QuestAction::Deny,
        )
        .expect("denies");
        assert_eq!(outcome.state, QuestState::Active);
        assert_eq!(roster.athletes["maya"].xp, 0);

        // Resubmission after denial is legal.
        let outcome = apply_quest_action(
            &mut roster,
            &catalog,
            &clock,
            "coach",
            "maya",
            "flip-turn",
            QuestAction::Submit,
        );
        assert!(outcome.is_some());
    }

    #[test]
    fn coach_override_skips_submission() {
        let (mut roster, catalog, clock) = setup();
        apply_quest_action(&mut roster, &catalog, &clock, "coach", "maya", "goal-sheet", QuestAction::Assign);
        apply_quest_action(&mut roster, &catalog, &clock, "coach", "maya", "goal-sheet", QuestAction::Start);
        let outcome = apply_quest_action(
            &mut roster,
            &catalog,
            &clock,
            "coach",
            "maya",
            "goal-sheet",
            QuestAction::Approve,
        )
        .expect("override approves from active");
        assert_eq!(outcome.state, QuestState::Done);
        assert_eq!(outcome.awarded, 20);
    }

    #[test]
    fn invalid_transitions_and_unknown_ids_are_no_ops() {
        let (mut roster, catalog, clock) = setup();
        // Approve before assignment.
        assert!(
            apply_quest_action(&mut roster, &catalog, &clock, "coach", "maya", "flip-turn", QuestAction::Approve)
                .is_none()
        );
        // Unknown quest and unknown athlete.
        assert!(
            apply_quest_action(&mut roster, &catalog, &clock, "coach", "maya", "nope", QuestAction::Assign)
                .is_none()
        );
        assert!(
            apply_quest_action(&mut roster, &catalog, &clock, "coach", "nobody", "flip-turn", QuestAction::Assign)
                .is_none()
        );
        assert!(roster.audit.is_empty());
    }

    #[test]
    fn challenge_toggle_awards_and_reverts() {
        let (mut roster, catalog, clock) = setup();
        let on = toggle_challenge(&mut roster, &catalog, &clock, "coach", "maya", "plank-club")
            .expect("toggles on");
        assert!(on.checked);
        assert_eq!(on.xp_delta, 20);
        assert_eq!(roster.athletes["maya"].daily_xp.weight, 20);

        let off = toggle_challenge(&mut roster, &catalog, &clock, "coach", "maya", "plank-club")
            .expect("toggles off");
        assert!(!off.checked);
        assert_eq!(off.xp_delta, -20);
        assert_eq!(roster.athletes["maya"].xp, 0);
    }

    #[test]
    fn unknown_quest_state_strings_deserialize_as_pending() {
        let state: QuestState = serde_json::from_str("\"abandoned\"").expect("degrades");
        assert_eq!(state, QuestState::Pending);
        let state: QuestState = serde_json::from_str("\"submitted\"").expect("parses");
        assert_eq!(state, QuestState::Submitted);
    }
}
