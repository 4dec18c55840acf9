//! Append-only audit trail of every XP-affecting coach action.
//!
//! The trail is a bounded ring: entries past the capacity drop silently
//! from the old end, so consumers must never assume unbounded history.
//! Entries carry a closed action kind so analytics can count behaviors
//! without matching on display labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::athlete::XpCategory;
use crate::constants::AUDIT_LOG_CAP;

/// What a coach action was, independent of its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    CheckIn,
    CheckOut,
    Checkpoint,
    Challenge,
    Quest,
    HelpedTeammate,
    PositiveAttitude,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "check-in",
            Self::CheckOut => "check-out",
            Self::Checkpoint => "checkpoint",
            Self::Challenge => "challenge",
            Self::Quest => "quest",
            Self::HelpedTeammate => "helped-teammate",
            Self::PositiveAttitude => "positive-attitude",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub athlete_id: String,
    pub athlete_name: String,
    pub kind: ActionKind,
    /// Free-text description shown in the activity feed.
    pub label: String,
    /// Signed; negative for reversals.
    pub xp_delta: i64,
    /// Daily-ledger category the delta landed in, when one did.
    #[serde(default)]
    pub category: Option<XpCategory>,
    /// Catalog id of the toggled checkpoint/challenge/quest, when the
    /// action flipped one. Lets single-step undo restore the flag.
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AuditTrail {
    entries: VecDeque<AuditEntry>,
}

impl AuditTrail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, dropping the oldest past the ring capacity.
    pub fn append(&mut self, entry: AuditEntry) {
        if self.entries.len() >= AUDIT_LOG_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Remove and return the most recent entry.
    pub fn pop_latest(&mut self) -> Option<AuditEntry> {
        self.entries.pop_back()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&AuditEntry> {
        self.entries.back()
    }

    /// Most recent `n` entries, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().rev().take(n)
    }

    /// All surviving entries for one athlete, oldest first.
    pub fn for_athlete<'a>(&'a self, athlete_id: &'a str) -> impl Iterator<Item = &'a AuditEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.athlete_id == athlete_id)
    }

    /// All surviving entries of one kind, oldest first.
    pub fn of_kind(&self, kind: ActionKind) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    /// Count of surviving entries of `kind` attributed to `athlete_id`.
    #[must_use]
    pub fn count_kind_for(&self, athlete_id: &str, kind: ActionKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind && entry.athlete_id == athlete_id)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(athlete: &str, kind: ActionKind, delta: i64) -> AuditEntry {
        AuditEntry {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 17, 0, 0).unwrap(),
            actor: "coach-dana".to_string(),
            athlete_id: athlete.to_string(),
            athlete_name: athlete.to_string(),
            kind,
            label: format!("{kind} for {athlete}"),
            xp_delta: delta,
            category: Some(XpCategory::Pool),
            target: None,
        }
    }

    #[test]
    fn ring_drops_oldest_past_cap() {
        let mut trail = AuditTrail::new();
        for i in 0..(AUDIT_LOG_CAP + 5) {
            trail.append(entry(&format!("a{i}"), ActionKind::Checkpoint, 5));
        }
        assert_eq!(trail.len(), AUDIT_LOG_CAP);
        // The first five appended entries are gone.
        assert!(trail.for_athlete("a0").next().is_none());
        assert!(trail.for_athlete("a4").next().is_none());
        assert!(trail.for_athlete("a5").next().is_some());
    }

    #[test]
    fn recent_is_newest_first() {
        let mut trail = AuditTrail::new();
        trail.append(entry("a", ActionKind::CheckIn, 10));
        trail.append(entry("b", ActionKind::Checkpoint, 5));
        trail.append(entry("c", ActionKind::Quest, 40));
        let ids: Vec<_> = trail.recent(2).map(|e| e.athlete_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn kind_counting_ignores_labels() {
        let mut trail = AuditTrail::new();
        let mut helped = entry("maya", ActionKind::HelpedTeammate, 15);
        helped.label = "completely unrelated wording".to_string();
        trail.append(helped);
        trail.append(entry("maya", ActionKind::Checkpoint, 5));
        assert_eq!(trail.count_kind_for("maya", ActionKind::HelpedTeammate), 1);
        assert_eq!(trail.count_kind_for("jo", ActionKind::HelpedTeammate), 0);
    }
}
