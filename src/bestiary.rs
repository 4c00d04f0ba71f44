//! Enemy archetypes and character-sheet conversion.
//!
//! Enemies are cloned from a static template table and given a fresh id;
//! the player combatant is derived from a character-sheet snapshot handed
//! over by the host at combat start.

use crate::combatant::{
    AbilityDef, Attack, Attribute, AttributeScores, Combatant, CombatantId, DamageType, EffectKind,
    RangeClass, Role,
};
use crate::encounter::CombatError;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Character-sheet projection the host passes into `start_combat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    /// Free-form class name; unrecognized classes fall back to an unarmed
    /// attack.
    pub class: String,
    pub level: u8,
    pub hp_current: i32,
    pub hp_max: i32,
    pub attributes: AttributeScores,
}

/// Proficiency bonus by level band.
pub fn proficiency_bonus(level: u8) -> i32 {
    match level {
        1..=4 => 2,
        5..=8 => 3,
        9..=12 => 4,
        13..=16 => 5,
        17..=20 => 6,
        _ => 2,
    }
}

/// Experience awarded for defeating an enemy with the given maximum HP.
pub fn xp_reward(max_hp: i32) -> u32 {
    max_hp.max(0) as u32 * 5
}

/// Archetype definition an enemy is cloned from.
#[derive(Debug, Clone)]
pub struct EnemyTemplate {
    pub name: String,
    pub hp: i32,
    pub armor_class: i32,
    pub attributes: AttributeScores,
    pub attacks: Vec<Attack>,
    pub abilities: Vec<AbilityDef>,
}

impl EnemyTemplate {
    fn new(name: &str, hp: i32, armor_class: i32, attributes: AttributeScores) -> Self {
        Self {
            name: name.to_string(),
            hp,
            armor_class,
            attributes,
            attacks: Vec::new(),
            abilities: Vec::new(),
        }
    }

    fn with_attack(mut self, attack: Attack) -> Self {
        self.attacks.push(attack);
        self
    }

    fn with_ability(mut self, ability: AbilityDef) -> Self {
        self.abilities.push(ability);
        self
    }

    /// Clone the archetype into a live combatant with a fresh id.
    pub fn instantiate(&self) -> Combatant {
        Combatant {
            id: CombatantId::new(),
            name: self.name.clone(),
            role: Role::Enemy,
            hp: self.hp,
            max_hp: self.hp,
            armor_class: self.armor_class,
            initiative: 0,
            attributes: self.attributes.clone(),
            attacks: self.attacks.clone(),
            abilities: self.abilities.clone(),
            conditions: Vec::new(),
            is_active: true,
        }
    }
}

lazy_static! {
    /// Enemy archetype registry, keyed by template id.
    static ref ENEMY_TEMPLATES: HashMap<&'static str, EnemyTemplate> = {
        let mut registry = HashMap::new();

        registry.insert(
            "goblin",
            EnemyTemplate::new("Goblin", 7, 13, AttributeScores::new(8, 14, 10, 10, 8, 8))
                .with_attack(Attack::new(
                    "Scimitar", 4, "1d6", 2,
                    DamageType::Slashing, RangeClass::Melee,
                ))
                .with_attack(Attack::new(
                    "Shortbow", 4, "1d6", 2,
                    DamageType::Piercing, RangeClass::Ranged,
                )),
        );

        registry.insert(
            "wolf",
            EnemyTemplate::new("Wolf", 11, 13, AttributeScores::new(12, 15, 12, 3, 12, 6))
                .with_attack(
                    Attack::new("Bite", 4, "2d4", 2, DamageType::Piercing, RangeClass::Melee)
                        .with_description(
                            "On a hit the target must pass a DC 11 Strength check or be \
                             knocked prone.",
                        ),
                )
                .with_ability(AbilityDef::passive(
                    "Pack Tactics",
                    "Advantage on attack rolls while an ally is adjacent to the target.",
                    EffectKind::Buff,
                )),
        );

        registry.insert(
            "bandit",
            EnemyTemplate::new("Bandit", 11, 12, AttributeScores::new(11, 12, 12, 10, 10, 10))
                .with_attack(Attack::new(
                    "Shortsword", 3, "1d6", 1,
                    DamageType::Piercing, RangeClass::Melee,
                ))
                .with_attack(Attack::new(
                    "Light Crossbow", 3, "1d8", 1,
                    DamageType::Piercing, RangeClass::Ranged,
                )),
        );

        registry.insert(
            "skeleton",
            EnemyTemplate::new("Skeleton", 13, 13, AttributeScores::new(10, 14, 15, 6, 8, 5))
                .with_attack(Attack::new(
                    "Shortsword", 4, "1d6", 2,
                    DamageType::Piercing, RangeClass::Melee,
                ))
                .with_attack(Attack::new(
                    "Shortbow", 4, "1d6", 2,
                    DamageType::Piercing, RangeClass::Ranged,
                )),
        );

        registry.insert(
            "orc",
            EnemyTemplate::new("Orc", 15, 13, AttributeScores::new(16, 12, 16, 7, 11, 10))
                .with_attack(Attack::new(
                    "Greataxe", 5, "1d12", 3,
                    DamageType::Slashing, RangeClass::Melee,
                ))
                .with_attack(Attack::new(
                    "Javelin", 5, "1d6", 3,
                    DamageType::Piercing, RangeClass::Ranged,
                ))
                .with_ability(AbilityDef::passive(
                    "Aggressive Rush",
                    "Can move up to its speed toward a hostile enemy as a bonus action.",
                    EffectKind::Special,
                )),
        );

        registry
    };
}

/// Look up an enemy archetype by template id.
pub fn enemy_template(template_id: &str) -> Option<&'static EnemyTemplate> {
    ENEMY_TEMPLATES.get(template_id)
}

/// Registered template ids, sorted for stable display.
pub fn template_ids() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = ENEMY_TEMPLATES.keys().copied().collect();
    ids.sort_unstable();
    ids
}

/// Instantiate an enemy from the registry.
///
/// Unknown ids are an error so a bad encounter setup fails before any
/// state changes.
pub fn spawn_enemy(template_id: &str) -> Result<Combatant, CombatError> {
    enemy_template(template_id)
        .map(EnemyTemplate::instantiate)
        .ok_or_else(|| CombatError::UnknownTemplate(template_id.to_string()))
}

/// Build the player's combatant from a character-sheet snapshot.
///
/// The weapon is picked by class; gear bonuses are layered on by the
/// inventory overlay at resolution time, never baked in here.
pub fn player_combatant(snapshot: &PlayerSnapshot) -> Combatant {
    let pb = proficiency_bonus(snapshot.level);
    let str_mod = snapshot.attributes.modifier(Attribute::Strength);
    let dex_mod = snapshot.attributes.modifier(Attribute::Dexterity);
    let int_mod = snapshot.attributes.modifier(Attribute::Intelligence);

    let mut attacks = Vec::new();
    match snapshot.class.to_lowercase().as_str() {
        "warrior" | "paladin" => {
            attacks.push(Attack::new(
                "Longsword",
                str_mod + pb,
                "1d8",
                str_mod,
                DamageType::Slashing,
                RangeClass::Melee,
            ));
        }
        "rogue" => {
            attacks.push(Attack::new(
                "Dagger",
                dex_mod + pb,
                "1d4",
                dex_mod,
                DamageType::Piercing,
                RangeClass::Melee,
            ));
            attacks.push(Attack::new(
                "Shortbow",
                dex_mod + pb,
                "1d6",
                dex_mod,
                DamageType::Piercing,
                RangeClass::Ranged,
            ));
        }
        "mage" => {
            // Spell attacks do not add the attribute modifier to damage.
            attacks.push(Attack::new(
                "Fire Bolt",
                int_mod + pb,
                "1d10",
                0,
                DamageType::Fire,
                RangeClass::Ranged,
            ));
        }
        _ => {}
    }

    if attacks.is_empty() {
        attacks.push(Attack::new(
            "Unarmed Strike",
            str_mod + pb,
            "1d4",
            str_mod,
            DamageType::Bludgeoning,
            RangeClass::Melee,
        ));
    }

    Combatant {
        id: CombatantId::new(),
        name: snapshot.name.clone(),
        role: Role::Player,
        hp: snapshot.hp_current,
        max_hp: snapshot.hp_max,
        armor_class: 10 + dex_mod,
        initiative: 0,
        attributes: snapshot.attributes.clone(),
        attacks,
        abilities: Vec::new(),
        conditions: Vec::new(),
        is_active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_hero;

    #[test]
    fn spawned_enemies_get_fresh_ids() {
        let first = spawn_enemy("goblin").unwrap();
        let second = spawn_enemy("goblin").unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.name, "Goblin");
        assert_eq!(first.hp, 7);
        assert_eq!(first.max_hp, 7);
        assert!(first.is_active);
        assert_eq!(first.role, Role::Enemy);
    }

    #[test]
    fn unknown_template_is_an_error() {
        let result = spawn_enemy("dragon");
        assert!(matches!(result, Err(CombatError::UnknownTemplate(ref id)) if id == "dragon"));
    }

    #[test]
    fn registry_covers_the_core_archetypes() {
        assert_eq!(
            template_ids(),
            vec!["bandit", "goblin", "orc", "skeleton", "wolf"]
        );
    }

    #[test]
    fn warrior_gets_strength_melee_weapon() {
        let combatant = player_combatant(&sample_hero());
        // STR 16 (+3), level 3 (proficiency +2).
        assert_eq!(combatant.attacks.len(), 1);
        let attack = &combatant.attacks[0];
        assert_eq!(attack.name, "Longsword");
        assert_eq!(attack.attack_bonus, 5);
        assert_eq!(attack.damage_dice, "1d8");
        assert_eq!(attack.damage_bonus, 3);
        // AC is 10 + DEX modifier; gear is layered on later.
        assert_eq!(combatant.armor_class, 12);
        assert_eq!(combatant.role, Role::Player);
    }

    #[test]
    fn rogue_gets_melee_and_ranged_options() {
        let mut snapshot = sample_hero();
        snapshot.class = "Rogue".to_string();
        let combatant = player_combatant(&snapshot);
        assert_eq!(combatant.attacks.len(), 2);
        assert_eq!(combatant.attacks[0].name, "Dagger");
        assert_eq!(combatant.attacks[1].name, "Shortbow");
        // DEX 14 (+2) + proficiency (+2).
        assert_eq!(combatant.attacks[0].attack_bonus, 4);
    }

    #[test]
    fn mage_firebolt_has_no_damage_bonus() {
        let mut snapshot = sample_hero();
        snapshot.class = "mage".to_string();
        let combatant = player_combatant(&snapshot);
        assert_eq!(combatant.attacks[0].name, "Fire Bolt");
        assert_eq!(combatant.attacks[0].damage_bonus, 0);
    }

    #[test]
    fn unrecognized_class_fights_unarmed() {
        let mut snapshot = sample_hero();
        snapshot.class = "Beekeeper".to_string();
        let combatant = player_combatant(&snapshot);
        assert_eq!(combatant.attacks.len(), 1);
        assert_eq!(combatant.attacks[0].name, "Unarmed Strike");
        assert_eq!(combatant.attacks[0].damage_dice, "1d4");
    }

    #[test]
    fn proficiency_scales_by_level_band() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(12), 4);
        assert_eq!(proficiency_bonus(17), 6);
    }

    #[test]
    fn xp_is_five_per_max_hp() {
        assert_eq!(xp_reward(7), 35);
        assert_eq!(xp_reward(15), 75);
        assert_eq!(xp_reward(-3), 0);
    }
}
