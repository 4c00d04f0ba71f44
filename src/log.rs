//! The append-only combat log.

use crate::combatant::CombatantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntryId(pub Uuid);

impl LogEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LogEntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Category tag for a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Attack,
    Ability,
    Movement,
    Condition,
    System,
}

/// One line of the combat log. Entries are immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    pub id: LogEntryId,
    pub round: u32,
    /// `None` for entries emitted by the engine itself.
    pub actor: Option<CombatantId>,
    pub actor_name: String,
    pub action: String,
    pub result: String,
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
}

impl CombatLogEntry {
    pub fn new(
        round: u32,
        actor: Option<CombatantId>,
        actor_name: impl Into<String>,
        action: impl Into<String>,
        result: impl Into<String>,
        kind: LogKind,
    ) -> Self {
        Self {
            id: LogEntryId::new(),
            round,
            actor,
            actor_name: actor_name.into(),
            action: action.into(),
            result: result.into(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// An entry announced by the engine rather than a combatant.
    pub fn system(round: u32, action: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(round, None, "System", action, result, LogKind::System)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_entries_have_no_actor() {
        let entry = CombatLogEntry::system(1, "Combat started!", "Initiative order: Hero: 18");
        assert_eq!(entry.kind, LogKind::System);
        assert!(entry.actor.is_none());
        assert_eq!(entry.actor_name, "System");
        assert_eq!(entry.round, 1);
    }

    #[test]
    fn entries_get_distinct_ids() {
        let a = CombatLogEntry::system(1, "a", "b");
        let b = CombatLogEntry::system(1, "a", "b");
        assert_ne!(a.id, b.id);
    }
}
