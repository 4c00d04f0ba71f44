//! Turn-based combat engine for an AI-narrated RPG client.
//!
//! The engine owns everything from the initiative roll to the
//! victory-or-defeat report: dice-based attack resolution, the combatant
//! roster, a fixed turn order traversed while fighters drop out, and an
//! append-only combat log. The narrative side of the game stays outside:
//! enemy turns ask a [`Tactician`] for a suggestion (falling back to a
//! basic attack when none arrives), and HUD updates flow through
//! [`CombatHud`].
//!
//! # Quick start
//!
//! ```
//! use skirmish::{AttributeScores, Encounter, PlayerSnapshot};
//!
//! let mut encounter = Encounter::new();
//! let hero = PlayerSnapshot {
//!     name: "Thorin".to_string(),
//!     class: "Warrior".to_string(),
//!     level: 3,
//!     hp_current: 24,
//!     hp_max: 24,
//!     attributes: AttributeScores::new(16, 14, 14, 10, 12, 8),
//! };
//! encounter.start_combat(&hero, &["goblin"])?;
//!
//! let attack = encounter.state().player().unwrap().attacks[0].clone();
//! let target = encounter
//!     .state()
//!     .combatants
//!     .iter()
//!     .find(|c| c.is_enemy())
//!     .unwrap()
//!     .id;
//! let outcome = encounter.player_attack(target, &attack)?;
//! assert!(outcome.is_some());
//! encounter.next_turn();
//! # Ok::<(), skirmish::CombatError>(())
//! ```
//!
//! Mutating operations take `&mut self`; exclusive ownership is what keeps
//! concurrent hosts from interleaving partial updates. Hosts that drive an
//! encounter from several tasks wrap it in a [`SharedEncounter`].

pub mod bestiary;
pub mod combat;
pub mod combatant;
pub mod dice;
pub mod encounter;
pub mod inventory;
pub mod log;
pub mod tactician;
pub mod testing;

pub use bestiary::{
    enemy_template, player_combatant, proficiency_bonus, spawn_enemy, template_ids, xp_reward,
    EnemyTemplate, PlayerSnapshot,
};
pub use combat::{CombatPhase, CombatState};
pub use combatant::{
    AbilityDef, AbilityEffect, AbilityUses, ActiveCondition, Attack, Attribute, AttributeScores,
    Combatant, CombatantId, ConditionDuration, DamageType, EffectKind, RangeClass, Recharge, Role,
};
pub use dice::{
    attribute_modifier, AttackOutcome, Dice, DiceError, DiceRoll, DiceSpec, DieRoller, RngRoller,
};
pub use encounter::{
    CombatError, CombatHud, CombatOutcome, Encounter, EnemyTurnReport, SharedEncounter,
};
pub use inventory::{AttributeBuff, EquippedGear, GearBonuses, Item, ItemKind, Rarity};
pub use log::{CombatLogEntry, LogEntryId, LogKind};
pub use tactician::{
    TacticalAction, TacticalDecision, TacticalPrompt, Tactician, TacticianError, Temperament,
};
