//! Immutable catalogs of checkpoints, quests, and weight challenges.
//!
//! Definitions ship as an embedded JSON asset and never change at runtime;
//! per-athlete state only ever references them by id. Unknown ids are the
//! caller's signal to ignore an action, never an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use thiserror::Error;

use crate::athlete::XpCategory;

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/catalog.json");

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Errors raised when catalog data violates the invariants the toggle
/// and streak logic rely on.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate {kind} id {id:?}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("{category} checkpoints declare {count} streak triggers; at most one is allowed")]
    MultipleStreakTriggers { category: XpCategory, count: usize },
    #[error("{kind} {id:?} has non-positive base XP {xp}")]
    NonPositiveXp {
        kind: &'static str,
        id: String,
        xp: i64,
    },
}

/// Standout behaviors a coach can award individually; these feed the
/// culture and attrition analytics through their audit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandoutKind {
    /// Helped a teammate during the session.
    Helped,
    /// Showed notable positive attitude.
    Positive,
}

/// A checkpoint a coach can toggle for an athlete during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Base XP before streak multipliers and the daily cap.
    pub xp: i64,
    /// Bulk-applied automatically on check-in.
    #[serde(default)]
    pub auto: bool,
    /// The designated attendance marker that drives streak increments.
    #[serde(default)]
    pub streak_trigger: bool,
    #[serde(default)]
    pub standout: Option<StandoutKind>,
}

/// A quest an athlete works through the pending/active/submitted/done
/// lifecycle; XP is granted only on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub xp: i64,
}

/// A two-state weight-room challenge, toggled like a checkpoint but kept
/// in its own map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub xp: i64,
}

/// Container for every catalog, keyed by award category where relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Catalog {
    #[serde(default)]
    pub checkpoints: Vec<CheckpointDef>,
    #[serde(default)]
    pub weight_checkpoints: Vec<CheckpointDef>,
    #[serde(default)]
    pub meet_checkpoints: Vec<CheckpointDef>,
    #[serde(default)]
    pub quests: Vec<QuestDef>,
    #[serde(default)]
    pub weight_challenges: Vec<ChallengeDef>,
}

impl Catalog {
    /// Empty catalog (useful for tests that drive toggles directly).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load catalog data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid catalogs
    /// or if the parsed definitions violate a catalog invariant.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the invariants the rest of the engine assumes: unique ids
    /// per list, positive base XP, and at most one streak trigger per
    /// checkpoint category.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for category in [XpCategory::Pool, XpCategory::Weight, XpCategory::Meet] {
            let mut seen = BTreeSet::new();
            let mut triggers = 0_usize;
            for def in self.checkpoint_defs(category) {
                if !seen.insert(def.id.as_str()) {
                    return Err(CatalogError::DuplicateId {
                        kind: "checkpoint",
                        id: def.id.clone(),
                    });
                }
                if def.xp <= 0 {
                    return Err(CatalogError::NonPositiveXp {
                        kind: "checkpoint",
                        id: def.id.clone(),
                        xp: def.xp,
                    });
                }
                if def.streak_trigger {
                    triggers += 1;
                }
            }
            if triggers > 1 {
                return Err(CatalogError::MultipleStreakTriggers { category, count: triggers });
            }
        }

        let mut seen = BTreeSet::new();
        for quest in &self.quests {
            if !seen.insert(quest.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "quest",
                    id: quest.id.clone(),
                });
            }
            if quest.xp <= 0 {
                return Err(CatalogError::NonPositiveXp {
                    kind: "quest",
                    id: quest.id.clone(),
                    xp: quest.xp,
                });
            }
        }

        let mut seen = BTreeSet::new();
        for challenge in &self.weight_challenges {
            if !seen.insert(challenge.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "challenge",
                    id: challenge.id.clone(),
                });
            }
            if challenge.xp <= 0 {
                return Err(CatalogError::NonPositiveXp {
                    kind: "challenge",
                    id: challenge.id.clone(),
                    xp: challenge.xp,
                });
            }
        }
        Ok(())
    }

    /// Parse the embedded default asset.
    #[must_use]
    pub fn load_from_static() -> Self {
        match Self::from_json(DEFAULT_CATALOG_DATA) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::warn!("embedded catalog asset is invalid: {err}");
                Self::default()
            }
        }
    }

    /// Process-wide shared catalog, parsed once.
    #[must_use]
    pub fn shared() -> &'static Self {
        CATALOG.get_or_init(Self::load_from_static)
    }

    #[must_use]
    pub fn checkpoint_defs(&self, category: XpCategory) -> &[CheckpointDef] {
        match category {
            XpCategory::Pool => &self.checkpoints,
            XpCategory::Weight => &self.weight_checkpoints,
            XpCategory::Meet => &self.meet_checkpoints,
        }
    }

    #[must_use]
    pub fn checkpoint(&self, category: XpCategory, id: &str) -> Option<&CheckpointDef> {
        self.checkpoint_defs(category)
            .iter()
            .find(|def| def.id == id)
    }

    #[must_use]
    pub fn quest(&self, id: &str) -> Option<&QuestDef> {
        self.quests.iter().find(|def| def.id == id)
    }

    #[must_use]
    pub fn challenge(&self, id: &str) -> Option<&ChallengeDef> {
        self.weight_challenges.iter().find(|def| def.id == id)
    }
}
