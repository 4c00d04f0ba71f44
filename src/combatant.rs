//! Fighters and the stat blocks they carry through an encounter.

use crate::dice::attribute_modifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a combatant within an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side a combatant fights on.
///
/// Behavior differences (who drives the turn, valid targets) dispatch on
/// this tag rather than on separate types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Enemy,
    Ally,
}

/// The six base attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Attribute {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Attribute::Strength => "STR",
            Attribute::Dexterity => "DEX",
            Attribute::Constitution => "CON",
            Attribute::Intelligence => "INT",
            Attribute::Wisdom => "WIS",
            Attribute::Charisma => "CHA",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Attribute score container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AttributeScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, attribute: Attribute) -> u8 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Constitution => self.constitution,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Charisma => self.charisma,
        }
    }

    /// Modifier for an attribute: floor((score - 10) / 2).
    pub fn modifier(&self, attribute: Attribute) -> i32 {
        attribute_modifier(self.get(attribute) as i32)
    }
}

impl Default for AttributeScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

/// Damage flavor. Tag only; no resistance mechanics hang off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Slashing,
    Piercing,
    Bludgeoning,
    Fire,
    Cold,
    Lightning,
    Poison,
    Magic,
}

/// Whether an attack is delivered up close or at range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeClass {
    Melee,
    Ranged,
}

/// An action definition.
///
/// Immutable once attached to a combatant for the duration of combat;
/// temporary bonuses are applied additively at resolution time, never by
/// mutating the attack itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attack {
    pub name: String,
    pub attack_bonus: i32,
    /// Dice notation like `"1d8"`, parsed at resolution time.
    pub damage_dice: String,
    pub damage_bonus: i32,
    pub damage_type: DamageType,
    pub range: RangeClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Attack {
    pub fn new(
        name: impl Into<String>,
        attack_bonus: i32,
        damage_dice: impl Into<String>,
        damage_bonus: i32,
        damage_type: DamageType,
        range: RangeClass,
    ) -> Self {
        Self {
            name: name.into(),
            attack_bonus,
            damage_dice: damage_dice.into(),
            damage_bonus,
            damage_type,
            range,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Use tracking for an ability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityUses {
    Unlimited,
    Limited {
        current: u32,
        maximum: u32,
        recharge: Recharge,
    },
}

impl AbilityUses {
    pub fn available(&self) -> bool {
        match self {
            AbilityUses::Unlimited => true,
            AbilityUses::Limited { current, .. } => *current > 0,
        }
    }

    /// Consume one use. Returns false when none remain.
    pub fn spend(&mut self) -> bool {
        match self {
            AbilityUses::Unlimited => true,
            AbilityUses::Limited { current, .. } => {
                if *current > 0 {
                    *current -= 1;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// When a limited-use ability comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recharge {
    ShortRest,
    LongRest,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Damage,
    Heal,
    Buff,
    Debuff,
    Special,
}

/// What an ability does when used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityEffect {
    pub kind: EffectKind,
    /// Dice notation or a fixed value, when the effect rolls for anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ActiveCondition>,
    /// Rounds the effect lasts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// A special ability attached to a combatant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityDef {
    pub name: String,
    pub description: String,
    pub uses: AbilityUses,
    pub effect: AbilityEffect,
}

impl AbilityDef {
    /// A passive ability with unlimited uses and no rolled effect.
    pub fn passive(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: EffectKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            uses: AbilityUses::Unlimited,
            effect: AbilityEffect {
                kind,
                value: None,
                condition: None,
                duration: None,
            },
        }
    }
}

/// How long a condition persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionDuration {
    Permanent,
    Rounds(u32),
}

/// A named status effect on a combatant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveCondition {
    pub name: String,
    pub duration: ConditionDuration,
    pub effect: String,
}

/// One fighter in an encounter: the player, an enemy, or an ally.
///
/// Created at combat start, mutated in place by the action resolver, never
/// removed mid-combat. An inactive combatant stays in the roster but is
/// skipped for turns and is not a valid target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub role: Role,
    pub hp: i32,
    pub max_hp: i32,
    pub armor_class: i32,
    /// Rolled once when the roster is assembled.
    pub initiative: i32,
    pub attributes: AttributeScores,
    pub attacks: Vec<Attack>,
    pub abilities: Vec<AbilityDef>,
    pub conditions: Vec<ActiveCondition>,
    pub is_active: bool,
}

impl Combatant {
    pub fn is_player(&self) -> bool {
        self.role == Role::Player
    }

    pub fn is_enemy(&self) -> bool {
        self.role == Role::Enemy
    }

    /// Current HP as a fraction of maximum, clamped to `[0, 1]`.
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            0.0
        } else {
            (self.hp as f32 / self.max_hp as f32).clamp(0.0, 1.0)
        }
    }

    pub fn dex_modifier(&self) -> i32 {
        self.attributes.modifier(Attribute::Dexterity)
    }

    /// Apply damage: HP floors at zero, and reaching zero knocks the
    /// combatant out of the fight. Returns the new HP.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        self.hp = (self.hp - amount).max(0);
        if self.hp == 0 {
            self.is_active = false;
        }
        self.hp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(hp: i32) -> Combatant {
        Combatant {
            id: CombatantId::new(),
            name: "Dummy".to_string(),
            role: Role::Enemy,
            hp,
            max_hp: hp,
            armor_class: 10,
            initiative: 0,
            attributes: AttributeScores::default(),
            attacks: Vec::new(),
            abilities: Vec::new(),
            conditions: Vec::new(),
            is_active: true,
        }
    }

    #[test]
    fn damage_clamps_at_zero_and_deactivates() {
        let mut target = dummy(7);
        assert_eq!(target.apply_damage(3), 4);
        assert!(target.is_active);
        assert_eq!(target.apply_damage(10), 0);
        assert!(!target.is_active);
    }

    #[test]
    fn hp_fraction_tracks_damage() {
        let mut target = dummy(10);
        target.apply_damage(7);
        assert!((target.hp_fraction() - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn limited_uses_run_out() {
        let mut uses = AbilityUses::Limited {
            current: 1,
            maximum: 1,
            recharge: Recharge::LongRest,
        };
        assert!(uses.spend());
        assert!(!uses.available());
        assert!(!uses.spend());
    }

    #[test]
    fn scores_expose_modifiers() {
        let scores = AttributeScores::new(16, 14, 14, 10, 12, 8);
        assert_eq!(scores.modifier(Attribute::Strength), 3);
        assert_eq!(scores.modifier(Attribute::Dexterity), 2);
        assert_eq!(scores.modifier(Attribute::Charisma), -1);
    }
}
