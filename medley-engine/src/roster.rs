//! The roster aggregate: one document holding every athlete, the audit
//! ring, the snapshot history, per-cohort session keys, and team
//! challenges. All engine operations are read-modify-write against this
//! one value; the caller persists it whole.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::athlete::{Athlete, Gender};
use crate::audit::{ActionKind, AuditEntry, AuditTrail};
use crate::constants::DAILY_XP_CAP;
use crate::ledger::ensure_current_day;
use crate::quests::QuestState;
use crate::sessions::SessionKey;
use crate::snapshot::DailySnapshot;

/// A team-wide goal shown on the board. Informational: progress is
/// coach-maintained and the reward is never distributed automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamChallenge {
    pub id: String,
    pub name: String,
    pub target: u32,
    #[serde(default)]
    pub current: u32,
    pub reward_xp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Roster {
    #[serde(default)]
    pub athletes: BTreeMap<String, Athlete>,
    #[serde(default)]
    pub audit: AuditTrail,
    #[serde(default)]
    pub snapshots: Vec<DailySnapshot>,
    /// Most recently seen session key per cohort group.
    #[serde(default)]
    pub session_keys: BTreeMap<String, SessionKey>,
    #[serde(default)]
    pub team_challenges: Vec<TeamChallenge>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a roster document from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a roster.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut roster: Self = serde_json::from_str(json)?;
        roster.normalize();
        Ok(roster)
    }

    /// Serialize the whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Add a new athlete, deriving the slug id from the name once and
    /// suffixing on collision. Returns the assigned id.
    pub fn add_athlete(
        &mut self,
        name: &str,
        age: Option<u8>,
        gender: Gender,
        group: &str,
    ) -> String {
        let mut athlete = Athlete::new(name, age, gender, group);
        if self.athletes.contains_key(&athlete.id) {
            let base = athlete.id.clone();
            let mut n = 2_u32;
            while self.athletes.contains_key(&format!("{base}-{n}")) {
                n += 1;
            }
            athlete.id = format!("{base}-{n}");
        }
        let id = athlete.id.clone();
        self.athletes.insert(id.clone(), athlete);
        id
    }

    /// Insert a pre-built record under its own id (roster import).
    pub fn insert_athlete(&mut self, athlete: Athlete) {
        self.athletes.insert(athlete.id.clone(), athlete);
    }

    /// Explicit coach removal; the only way an athlete leaves the roster.
    pub fn remove_athlete(&mut self, athlete_id: &str) -> Option<Athlete> {
        self.athletes.remove(athlete_id)
    }

    /// One-time idempotent upgrade pass for documents from older schemas:
    /// per-record normalization plus re-keying any entry whose map key
    /// drifted from its record id.
    pub fn normalize(&mut self) {
        for athlete in self.athletes.values_mut() {
            athlete.normalize();
        }
        let drifted: Vec<String> = self
            .athletes
            .iter()
            .filter(|(key, athlete)| **key != athlete.id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in drifted {
            if let Some(athlete) = self.athletes.remove(&key) {
                log::warn!("re-keying athlete {key:?} under id {:?}", athlete.id);
                self.athletes.insert(athlete.id.clone(), athlete);
            }
        }
    }

    /// Whether a snapshot already exists for this date and scope.
    #[must_use]
    pub fn has_snapshot(&self, date: NaiveDate, group: Option<&str>) -> bool {
        self.snapshots
            .iter()
            .any(|snapshot| snapshot.date == date && snapshot.group.as_deref() == group)
    }

    /// Append a snapshot, keeping the history ordered by date.
    pub fn push_snapshot(&mut self, snapshot: DailySnapshot) {
        self.snapshots.push(snapshot);
        self.snapshots.sort_by_key(|snapshot| snapshot.date);
    }

    /// Snapshot history for one scope, oldest first.
    #[must_use]
    pub fn snapshots_for(&self, group: Option<&str>) -> Vec<&DailySnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.group.as_deref() == group)
            .collect()
    }

    /// Update a team challenge's progress, clamped to its target.
    /// Returns the stored value, or `None` for an unknown id.
    pub fn set_team_challenge_progress(&mut self, id: &str, current: u32) -> Option<u32> {
        let challenge = self
            .team_challenges
            .iter_mut()
            .find(|challenge| challenge.id == id)?;
        challenge.current = current.min(challenge.target);
        Some(challenge.current)
    }

    /// Undo the single most recent audit entry. The reversal applies the
    /// entry's recorded `xp_delta` (never a recompute of award logic),
    /// clamps lifetime XP at zero, only touches today's daily bucket when
    /// the entry was written today, and restores the toggled flag where
    /// the entry names one. Returns the removed entry.
    pub fn undo_last(&mut self, today: NaiveDate) -> Option<AuditEntry> {
        let entry = self.audit.pop_latest()?;
        let Some(athlete) = self.athletes.get_mut(&entry.athlete_id) else {
            log::warn!("undo target {} no longer on roster", entry.athlete_id);
            return Some(entry);
        };

        ensure_current_day(athlete, today);
        athlete.xp = (athlete.xp - entry.xp_delta).max(0);

        if let Some(category) = entry.category
            && entry.timestamp.date_naive() == today
        {
            let room = (DAILY_XP_CAP - athlete.daily_xp.used()).max(0);
            let bucket = athlete.daily_xp.bucket_mut(category);
            if entry.xp_delta >= 0 {
                *bucket = (*bucket - entry.xp_delta).max(0);
            } else {
                // Undoing a reversal gives the day back, within the cap.
                *bucket += (-entry.xp_delta).min(room);
            }
        }

        match entry.kind {
            ActionKind::Checkpoint | ActionKind::HelpedTeammate | ActionKind::PositiveAttitude => {
                if let (Some(target), Some(category)) = (&entry.target, entry.category) {
                    athlete
                        .checkpoint_map_mut(category)
                        .insert(target.clone(), entry.xp_delta < 0);
                }
            }
            ActionKind::Challenge => {
                if let Some(target) = &entry.target {
                    athlete
                        .weight_challenges
                        .insert(target.clone(), entry.xp_delta < 0);
                }
            }
            ActionKind::Quest => {
                // Only completion entries carry XP; undoing one reopens
                // the quest for approval.
                if entry.xp_delta > 0
                    && let Some(target) = &entry.target
                {
                    athlete.quests.insert(target.clone(), QuestState::Active);
                }
            }
            ActionKind::CheckIn => {
                athlete.present = false;
                if let Some(category) = entry.category {
                    let ids: Vec<String> =
                        athlete.checkpoint_map(category).keys().cloned().collect();
                    for id in ids {
                        athlete.checkpoint_map_mut(category).insert(id, false);
                    }
                }
            }
            ActionKind::CheckOut => {
                athlete.present = true;
            }
        }

        Some(entry)
    }
}
