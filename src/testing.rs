//! Deterministic test doubles.
//!
//! Mirrors the production seams: scripted die rolls instead of entropy, a
//! scripted tactician instead of the model gateway, and a recording HUD.
//! Compiled into the crate so integration tests and downstream hosts can
//! script full encounters without touching the network.

use crate::bestiary::PlayerSnapshot;
use crate::combatant::AttributeScores;
use crate::dice::{Dice, DieRoller};
use crate::encounter::CombatHud;
use crate::log::CombatLogEntry;
use crate::tactician::{TacticalDecision, TacticalPrompt, Tactician, TacticianError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Die roller that replays a fixed sequence of results.
pub struct ScriptedRolls {
    queue: VecDeque<u32>,
}

impl ScriptedRolls {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            queue: rolls.into_iter().collect(),
        }
    }
}

impl DieRoller for ScriptedRolls {
    fn roll(&mut self, sides: u32) -> u32 {
        let roll = self.queue.pop_front().expect("scripted rolls exhausted");
        assert!(
            (1..=sides).contains(&roll),
            "scripted roll {roll} out of range for d{sides}"
        );
        roll
    }
}

/// Dice engine that rolls the given sequence.
pub fn scripted_dice(rolls: impl IntoIterator<Item = u32>) -> Dice {
    Dice::with_roller(Box::new(ScriptedRolls::new(rolls)))
}

/// Tactician that hands out queued decisions (or errors) in order.
///
/// Once the queue runs dry it reports itself unavailable, which exercises
/// the resolver's fallback path.
pub struct ScriptedTactician {
    decisions: Mutex<VecDeque<Result<TacticalDecision, TacticianError>>>,
}

impl ScriptedTactician {
    pub fn new(
        decisions: impl IntoIterator<Item = Result<TacticalDecision, TacticianError>>,
    ) -> Self {
        Self {
            decisions: Mutex::new(decisions.into_iter().collect()),
        }
    }

    pub fn with_decisions(decisions: impl IntoIterator<Item = TacticalDecision>) -> Self {
        Self::new(decisions.into_iter().map(Ok))
    }
}

#[async_trait]
impl Tactician for ScriptedTactician {
    async fn decide(
        &self,
        _prompt: &TacticalPrompt,
        _history: &[String],
    ) -> Result<TacticalDecision, TacticianError> {
        self.decisions
            .lock()
            .expect("scripted tactician lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(TacticianError::Unavailable(
                    "no more scripted decisions".to_string(),
                ))
            })
    }
}

/// Tactician that always fails.
pub struct FailingTactician;

#[async_trait]
impl Tactician for FailingTactician {
    async fn decide(
        &self,
        _prompt: &TacticalPrompt,
        _history: &[String],
    ) -> Result<TacticalDecision, TacticianError> {
        Err(TacticianError::Unavailable("gateway offline".to_string()))
    }
}

/// One notification captured by [`RecordingHud`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HudEvent {
    PlayerDamaged { damage: i32, new_hp: i32 },
    LogLen(usize),
    CombatEnded { victory: bool, xp_awarded: u32 },
}

/// HUD that records every notification for later assertions.
///
/// Clone it before boxing so the test keeps a handle on the shared event
/// list.
#[derive(Clone, Default)]
pub struct RecordingHud {
    events: Arc<Mutex<Vec<HudEvent>>>,
}

impl RecordingHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HudEvent> {
        self.events.lock().expect("hud lock").clone()
    }
}

impl CombatHud for RecordingHud {
    fn player_damaged(&mut self, damage: i32, new_hp: i32) {
        self.events
            .lock()
            .expect("hud lock")
            .push(HudEvent::PlayerDamaged { damage, new_hp });
    }

    fn log_updated(&mut self, log: &[CombatLogEntry]) {
        self.events
            .lock()
            .expect("hud lock")
            .push(HudEvent::LogLen(log.len()));
    }

    fn combat_ended(&mut self, victory: bool, xp_awarded: u32) {
        self.events
            .lock()
            .expect("hud lock")
            .push(HudEvent::CombatEnded {
                victory,
                xp_awarded,
            });
    }
}

/// A level 3 warrior snapshot for quick scenarios.
pub fn sample_hero() -> PlayerSnapshot {
    PlayerSnapshot {
        name: "Test Hero".to_string(),
        class: "Warrior".to_string(),
        level: 3,
        hp_current: 12,
        hp_max: 12,
        attributes: AttributeScores::new(16, 14, 14, 10, 12, 8),
    }
}
