//! The tactical-decision seam.
//!
//! Enemy turns ask an external collaborator (in production, the narrative
//! model gateway) what the enemy should do. The engine depends only on the
//! [`Tactician`] trait; any failure falls back to a basic attack so combat
//! always makes progress.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a decision could not be obtained.
#[derive(Debug, Error)]
pub enum TacticianError {
    /// The collaborator could not be reached or timed out.
    #[error("tactician unavailable: {0}")]
    Unavailable(String),
    /// The collaborator answered with something unparseable.
    #[error("malformed tactician response: {0}")]
    Malformed(String),
}

/// Coarse behavioral tag derived from the enemy's HP fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperament {
    Aggressive,
    Desperate,
}

/// The situation handed to the collaborator for one enemy turn.
#[derive(Debug, Clone, Serialize)]
pub struct TacticalPrompt {
    pub enemy_name: String,
    pub enemy_hp: i32,
    pub enemy_max_hp: i32,
    pub enemy_temperament: Temperament,
    /// One line per opposing combatant, e.g. `"Hero (HP: 9/12)"`.
    pub player_positions: Vec<String>,
}

/// Action kinds the collaborator may pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TacticalAction {
    Attack,
    Defend,
    Ability,
    Move,
    Flee,
}

/// A parsed decision.
///
/// Derives lowercase serde names so hosts can feed the gateway's JSON
/// straight through; an unknown action string fails deserialization, which
/// the resolver treats the same as no decision at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacticalDecision {
    pub action: TacticalAction,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub ability: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TacticalDecision {
    /// The fallback used when the collaborator fails.
    pub fn basic_attack(target: impl Into<String>) -> Self {
        Self {
            action: TacticalAction::Attack,
            target: Some(target.into()),
            ability: None,
            description: None,
        }
    }

    /// Parse a decision from the gateway's raw JSON reply.
    pub fn from_json(raw: &str) -> Result<Self, TacticianError> {
        serde_json::from_str(raw).map_err(|e| TacticianError::Malformed(e.to_string()))
    }
}

/// Supplier of enemy-turn decisions.
#[async_trait]
pub trait Tactician: Send + Sync {
    /// Decide the current enemy's action. `history` carries the tail of
    /// the combat log as conversational context.
    async fn decide(
        &self,
        prompt: &TacticalPrompt,
        history: &[String],
    ) -> Result<TacticalDecision, TacticianError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_parses_gateway_json() {
        let decision: TacticalDecision =
            serde_json::from_str(r#"{"action": "flee", "target": "Hero"}"#).unwrap();
        assert_eq!(decision.action, TacticalAction::Flee);
        assert_eq!(decision.target.as_deref(), Some("Hero"));
        assert!(decision.ability.is_none());
        assert!(decision.description.is_none());
    }

    #[test]
    fn unknown_action_fails_to_parse() {
        let result = serde_json::from_str::<TacticalDecision>(r#"{"action": "moonwalk"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn from_json_maps_garbage_to_malformed() {
        let result = TacticalDecision::from_json("the goblin ponders its next move");
        assert!(matches!(result, Err(TacticianError::Malformed(_))));
    }

    #[test]
    fn fallback_is_a_plain_attack() {
        let decision = TacticalDecision::basic_attack("Hero");
        assert_eq!(decision.action, TacticalAction::Attack);
        assert_eq!(decision.target.as_deref(), Some("Hero"));
    }
}
