//! Combat state: initiative order, turn advancement, phase transitions.

use crate::combatant::{Combatant, CombatantId, Role};
use crate::log::CombatLogEntry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lifecycle stage of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatPhase {
    Initiative,
    Combat,
    Victory,
    Defeat,
}

/// The single source of truth for an in-progress battle.
///
/// The turn order is fixed when combat starts and never reordered;
/// combatants that drop out stay in the roster and are skipped, not
/// removed, so "current combatant" is a matter of walking the order past
/// inactive entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    pub is_active: bool,
    /// Starts at 1; goes up each time the turn pointer wraps around.
    pub round: u32,
    pub current_turn_index: usize,
    pub combatants: Vec<Combatant>,
    pub turn_order: Vec<CombatantId>,
    pub log: Vec<CombatLogEntry>,
    pub phase: CombatPhase,
}

impl CombatState {
    pub fn new() -> Self {
        Self {
            is_active: false,
            round: 0,
            current_turn_index: 0,
            combatants: Vec::new(),
            turn_order: Vec::new(),
            log: Vec::new(),
            phase: CombatPhase::Initiative,
        }
    }

    /// Fix the roster (already sorted by initiative) and open the combat
    /// phase.
    pub(crate) fn begin(&mut self, combatants: Vec<Combatant>) {
        self.turn_order = combatants.iter().map(|c| c.id).collect();
        self.combatants = combatants;
        self.round = 1;
        self.current_turn_index = 0;
        self.log.clear();
        self.phase = CombatPhase::Combat;
        self.is_active = true;
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    pub fn player(&self) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.role == Role::Player)
    }

    /// Combatant whose turn it is, or `None` once combat is over.
    pub fn current_combatant(&self) -> Option<&Combatant> {
        if !self.is_active || self.turn_order.is_empty() {
            return None;
        }
        self.combatant(self.turn_order[self.current_turn_index])
    }

    pub fn is_player_turn(&self) -> bool {
        self.current_combatant()
            .map(|c| c.role == Role::Player)
            .unwrap_or(false)
    }

    fn active_enemy_count(&self) -> usize {
        self.combatants
            .iter()
            .filter(|c| c.role == Role::Enemy && c.is_active)
            .count()
    }

    /// Advance to the next active combatant.
    ///
    /// Terminal conditions are evaluated first: no active enemies ends in
    /// victory, a downed (or missing) player in defeat. Otherwise the turn
    /// pointer walks the fixed order circularly, skipping inactive entries,
    /// bounded by one full circuit. A wrap-around bumps the round counter
    /// and logs a system entry.
    pub fn next_turn(&mut self) {
        assert!(
            !self.turn_order.is_empty(),
            "next_turn called before combat was started"
        );

        if self.active_enemy_count() == 0 {
            self.phase = CombatPhase::Victory;
            self.is_active = false;
            debug!(round = self.round, "combat won");
            return;
        }
        if !self.player().map(|p| p.is_active).unwrap_or(false) {
            self.phase = CombatPhase::Defeat;
            self.is_active = false;
            debug!(round = self.round, "combat lost");
            return;
        }

        let len = self.turn_order.len();
        let old_index = self.current_turn_index;
        let mut next_index = (old_index + 1) % len;
        // The terminal checks above guarantee at least one active entry, so
        // one circuit always finds it.
        for _ in 0..len {
            let id = self.turn_order[next_index];
            if self.combatant(id).map(|c| c.is_active).unwrap_or(false) {
                break;
            }
            next_index = (next_index + 1) % len;
        }

        self.current_turn_index = next_index;
        if next_index <= old_index {
            self.round += 1;
            let round = self.round;
            self.push_log(CombatLogEntry::system(
                round,
                format!("Round {round}"),
                "A new round of combat begins!",
            ));
        }
    }

    /// Reset to the pre-combat state, reporting whether the battle was won.
    pub(crate) fn finish(&mut self) -> bool {
        let victory = self.phase == CombatPhase::Victory;
        *self = CombatState::new();
        victory
    }

    pub(crate) fn push_log(&mut self, entry: CombatLogEntry) {
        self.log.push(entry);
    }
}

impl Default for CombatState {
    fn default() -> Self {
        Self::new()
    }
}
