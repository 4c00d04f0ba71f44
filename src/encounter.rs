//! The encounter facade: one owned value through which every combat
//! mutation flows.
//!
//! The host is responsible for sequencing: player actions on the player's
//! turn, [`Encounter::execute_enemy_turn`] on an enemy's, and
//! [`Encounter::next_turn`] after each action has been applied. Every
//! mutating operation takes `&mut self`, so exclusive ownership is what
//! keeps concurrent hosts from interleaving partial updates.

use crate::bestiary::{player_combatant, spawn_enemy, xp_reward, PlayerSnapshot};
use crate::combat::CombatState;
use crate::combatant::{Attack, Combatant, CombatantId, Role};
use crate::dice::{AttackOutcome, Dice, DiceError, DiceSpec};
use crate::inventory::{AttributeBuff, GearBonuses};
use crate::log::{CombatLogEntry, LogKind};
use crate::tactician::{TacticalAction, TacticalDecision, TacticalPrompt, Tactician, Temperament};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Enemies may only flee below this fraction of their maximum HP.
const FLEE_THRESHOLD: f32 = 0.2;
/// Below this HP fraction an enemy is reported as desperate.
const DESPERATE_THRESHOLD: f32 = 0.3;
/// How many trailing log lines the tactician sees.
const HISTORY_TAIL: usize = 5;

/// Errors surfaced by encounter operations.
#[derive(Debug, Error)]
pub enum CombatError {
    #[error("unknown enemy template: {0}")]
    UnknownTemplate(String),
    #[error("combat is already active")]
    AlreadyActive,
    #[error(transparent)]
    Dice(#[from] DiceError),
}

/// Observer for HUD-facing combat events. All methods default to no-ops.
pub trait CombatHud: Send {
    /// The player took damage.
    fn player_damaged(&mut self, damage: i32, new_hp: i32) {
        let _ = (damage, new_hp);
    }

    /// The combat log grew; `log` is the full ordered history.
    fn log_updated(&mut self, log: &[CombatLogEntry]) {
        let _ = log;
    }

    /// Combat is over.
    fn combat_ended(&mut self, victory: bool, xp_awarded: u32) {
        let _ = (victory, xp_awarded);
    }
}

/// Terminal outcome reported by [`Encounter::end_combat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOutcome {
    pub victory: bool,
    pub xp_awarded: u32,
}

/// What an enemy ended up doing on its turn.
#[derive(Debug, Clone)]
pub enum EnemyTurnReport {
    Attacked(AttackOutcome),
    Defended,
    Fled,
}

/// Handle for hosts that drive the encounter from more than one task.
/// Exclusive access through the mutex serializes every mutation.
pub type SharedEncounter = Arc<tokio::sync::Mutex<Encounter>>;

/// A battle in progress, plus the dice and overlay state it needs.
pub struct Encounter {
    state: CombatState,
    dice: Dice,
    gear: GearBonuses,
    buff: AttributeBuff,
    hud: Option<Box<dyn CombatHud>>,
}

impl Encounter {
    pub fn new() -> Self {
        Self::with_dice(Dice::new())
    }

    /// Encounter with a custom dice engine (scripted rolls in tests).
    pub fn with_dice(dice: Dice) -> Self {
        Self {
            state: CombatState::new(),
            dice,
            gear: GearBonuses::default(),
            buff: AttributeBuff::default(),
            hud: None,
        }
    }

    pub fn with_hud(mut self, hud: Box<dyn CombatHud>) -> Self {
        self.hud = Some(hud);
        self
    }

    /// Replace the equipment overlay (derived by the host inventory).
    pub fn set_gear(&mut self, gear: GearBonuses) {
        self.gear = gear;
    }

    /// Apply a potion buff, replacing any previous one.
    pub fn apply_buff(&mut self, buff: AttributeBuff) {
        self.buff = buff;
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn log(&self) -> &[CombatLogEntry] {
        &self.state.log
    }

    pub fn buff(&self) -> &AttributeBuff {
        &self.buff
    }

    pub fn current_combatant(&self) -> Option<&Combatant> {
        self.state.current_combatant()
    }

    pub fn is_player_turn(&self) -> bool {
        self.state.is_player_turn()
    }

    /// Build the roster, roll initiative, and open the combat phase.
    ///
    /// Every template id is validated before any state changes, so a typo
    /// in the enemy list rejects the whole start rather than shrinking the
    /// encounter.
    pub fn start_combat(
        &mut self,
        snapshot: &PlayerSnapshot,
        enemy_templates: &[&str],
    ) -> Result<(), CombatError> {
        if self.state.is_active {
            return Err(CombatError::AlreadyActive);
        }

        let mut combatants = vec![player_combatant(snapshot)];
        for template_id in enemy_templates {
            combatants.push(spawn_enemy(template_id)?);
        }

        for combatant in &mut combatants {
            combatant.initiative = self.dice.initiative(combatant.dex_modifier());
        }
        // Stable sort: tied initiatives keep their roster order.
        combatants.sort_by_key(|c| std::cmp::Reverse(c.initiative));

        let summary = combatants
            .iter()
            .map(|c| format!("{}: {}", c.name, c.initiative))
            .collect::<Vec<_>>()
            .join(", ");
        self.state.begin(combatants);
        self.push_log(CombatLogEntry::system(
            1,
            "Combat started!",
            format!("Initiative order: {summary}"),
        ));
        debug!(order = %summary, "combat started");
        Ok(())
    }

    /// Attack an enemy with one of the player's attacks.
    ///
    /// Returns `Ok(None)` without touching any state when the target is
    /// missing or already out of the fight, or when there is no active
    /// player to act.
    pub fn player_attack(
        &mut self,
        target_id: CombatantId,
        attack: &Attack,
    ) -> Result<Option<AttackOutcome>, CombatError> {
        let Some(player) = self.state.player().filter(|p| p.is_active) else {
            return Ok(None);
        };
        let (player_id, player_name) = (player.id, player.name.clone());
        let Some(target) = self.state.combatant(target_id).filter(|t| t.is_active) else {
            return Ok(None);
        };
        let (target_name, target_ac) = (target.name.clone(), target.armor_class);

        let damage_dice = DiceSpec::parse(&attack.damage_dice)?;
        let attack_bonus = attack.attack_bonus + self.gear.attack_bonus + self.buff.attack_bonus();
        let damage_bonus = attack.damage_bonus + self.gear.damage_bonus;

        let outcome = self
            .dice
            .attack_roll(attack_bonus, target_ac, &damage_dice, damage_bonus);
        if outcome.hit {
            self.apply_damage(target_id, outcome.total_damage);
        }

        let entry = CombatLogEntry::new(
            self.state.round,
            Some(player_id),
            player_name,
            format!("uses {} against {}", attack.name, target_name),
            describe_outcome(&outcome, target_ac),
            LogKind::Attack,
        );
        self.push_log(entry);

        self.buff.decay();
        Ok(Some(outcome))
    }

    /// Take a defensive stance.
    ///
    /// The +2 AC is announced in the log but not applied to attack
    /// resolution.
    // TODO: track the defensive stance as a one-turn condition so the +2
    // actually raises the AC of incoming attacks until the player's next
    // turn.
    pub fn player_defend(&mut self) {
        let Some(player) = self.state.player().filter(|p| p.is_active) else {
            return;
        };
        let (player_id, player_name) = (player.id, player.name.clone());
        let entry = CombatLogEntry::new(
            self.state.round,
            Some(player_id),
            player_name,
            "takes a defensive stance",
            "Defensive posture. +2 AC until next turn.",
            LogKind::Ability,
        );
        self.push_log(entry);
        self.buff.decay();
    }

    /// Run the current enemy's turn, asking the tactician what to do.
    ///
    /// Any collaborator failure, or a decision the rules reject, degrades
    /// to a basic attack against the player so the turn always resolves.
    /// Returns `Ok(None)` when the current combatant is not an active
    /// enemy, or when no active player remains.
    pub async fn execute_enemy_turn(
        &mut self,
        tactician: &dyn Tactician,
    ) -> Result<Option<EnemyTurnReport>, CombatError> {
        let Some(enemy) = self
            .state
            .current_combatant()
            .filter(|c| c.role == Role::Enemy && c.is_active)
        else {
            return Ok(None);
        };
        let enemy_id = enemy.id;
        let enemy_name = enemy.name.clone();
        let (enemy_hp, enemy_max_hp) = (enemy.hp, enemy.max_hp);
        let enemy_fraction = enemy.hp_fraction();
        let first_attack = enemy.attacks.first().cloned();

        let Some(player) = self.state.player().filter(|p| p.is_active) else {
            return Ok(None);
        };
        let player_id = player.id;
        let player_name = player.name.clone();
        let player_ac = player.armor_class;
        let player_line = format!("{} (HP: {}/{})", player.name, player.hp, player.max_hp);

        let prompt = TacticalPrompt {
            enemy_name: enemy_name.clone(),
            enemy_hp,
            enemy_max_hp,
            enemy_temperament: if enemy_fraction < DESPERATE_THRESHOLD {
                Temperament::Desperate
            } else {
                Temperament::Aggressive
            },
            player_positions: vec![player_line],
        };
        let tail_start = self.state.log.len().saturating_sub(HISTORY_TAIL);
        let history: Vec<String> = self.state.log[tail_start..]
            .iter()
            .map(|e| format!("{} {}: {}", e.actor_name, e.action, e.result))
            .collect();

        let decision = match tactician.decide(&prompt, &history).await {
            Ok(decision) => decision,
            Err(error) => {
                warn!(%error, enemy = %enemy_name, "tactician failed, falling back to basic attack");
                TacticalDecision::basic_attack(player_name.clone())
            }
        };

        let round = self.state.round;
        match decision.action {
            TacticalAction::Flee if enemy_fraction < FLEE_THRESHOLD => {
                if let Some(enemy) = self.state.combatant_mut(enemy_id) {
                    enemy.is_active = false;
                }
                let result = decision
                    .description
                    .unwrap_or_else(|| "The enemy flees from the fight!".to_string());
                self.push_log(CombatLogEntry::new(
                    round,
                    Some(enemy_id),
                    enemy_name,
                    "tries to flee",
                    result,
                    LogKind::Movement,
                ));
                Ok(Some(EnemyTurnReport::Fled))
            }
            TacticalAction::Defend => {
                let result = decision
                    .description
                    .unwrap_or_else(|| "Defensive posture. +2 AC until next turn.".to_string());
                self.push_log(CombatLogEntry::new(
                    round,
                    Some(enemy_id),
                    enemy_name,
                    "takes a defensive stance",
                    result,
                    LogKind::Ability,
                ));
                Ok(Some(EnemyTurnReport::Defended))
            }
            _ => {
                // Attack, ability, move, or a flee the rules disallow:
                // swing with the first attack.
                let Some(attack) = first_attack else {
                    return Ok(None);
                };
                let damage_dice = DiceSpec::parse(&attack.damage_dice)?;
                // The player's armor overlay raises the AC to beat.
                let effective_ac = player_ac + self.gear.armor_bonus;
                let outcome = self.dice.attack_roll(
                    attack.attack_bonus,
                    effective_ac,
                    &damage_dice,
                    attack.damage_bonus,
                );
                if outcome.hit {
                    self.apply_damage(player_id, outcome.total_damage);
                }
                self.push_log(CombatLogEntry::new(
                    round,
                    Some(enemy_id),
                    enemy_name,
                    format!("uses {} against {}", attack.name, player_name),
                    describe_outcome(&outcome, effective_ac),
                    LogKind::Attack,
                ));
                Ok(Some(EnemyTurnReport::Attacked(outcome)))
            }
        }
    }

    /// Advance the turn pointer (see [`CombatState::next_turn`]).
    pub fn next_turn(&mut self) {
        let before = self.state.log.len();
        self.state.next_turn();
        if self.state.log.len() != before {
            self.notify_log();
        }
    }

    /// Tear the encounter down and report the outcome.
    ///
    /// Experience counts only enemies actually brought to zero; one that
    /// fled awards nothing.
    pub fn end_combat(&mut self) -> CombatOutcome {
        let xp_awarded = self
            .state
            .combatants
            .iter()
            .filter(|c| c.role == Role::Enemy && c.hp == 0)
            .map(|c| xp_reward(c.max_hp))
            .sum();
        let victory = self.state.finish();
        self.buff = AttributeBuff::default();
        if let Some(hud) = &mut self.hud {
            hud.combat_ended(victory, xp_awarded);
        }
        CombatOutcome {
            victory,
            xp_awarded,
        }
    }

    /// Centralized damage application: HP floors at zero, zero knocks the
    /// target out, and player damage is pushed to the HUD.
    fn apply_damage(&mut self, target_id: CombatantId, amount: i32) {
        let Some(target) = self.state.combatant_mut(target_id) else {
            return;
        };
        let new_hp = target.apply_damage(amount);
        let is_player = target.role == Role::Player;
        debug!(combatant = %target.name, amount, new_hp, "damage applied");
        if is_player {
            if let Some(hud) = &mut self.hud {
                hud.player_damaged(amount, new_hp);
            }
        }
    }

    fn push_log(&mut self, entry: CombatLogEntry) {
        self.state.push_log(entry);
        self.notify_log();
    }

    fn notify_log(&mut self) {
        if let Some(hud) = &mut self.hud {
            hud.log_updated(&self.state.log);
        }
    }
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_outcome(outcome: &AttackOutcome, target_ac: i32) -> String {
    if outcome.fumble {
        "Critical miss! The attack goes nowhere.".to_string()
    } else if outcome.critical {
        format!(
            "CRITICAL! {} vs AC {}. Deals {} damage!",
            outcome.attack_roll, target_ac, outcome.total_damage
        )
    } else if outcome.hit {
        format!(
            "Hit! {} vs AC {}. Deals {} damage.",
            outcome.attack_roll, target_ac, outcome.total_damage
        )
    } else {
        format!("Miss! {} vs AC {}.", outcome.attack_roll, target_ac)
    }
}
