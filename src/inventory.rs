//! Equipment-derived combat bonuses and timed potion buffs.
//!
//! The inventory itself lives in the host application; combat only sees
//! the derived overlay it folds into rolls.

use serde::{Deserialize, Serialize};

/// Broad item categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Weapon,
    Armor,
    Potion,
    Accessory,
    Consumable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// An item as the host inventory system describes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    pub rarity: Rarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_dice: Option<String>,
    #[serde(default)]
    pub damage_bonus: i32,
    #[serde(default)]
    pub armor_bonus: i32,
    #[serde(default)]
    pub hp_restore: i32,
    #[serde(default)]
    pub temp_strength: i32,
    #[serde(default)]
    pub temp_dexterity: i32,
    #[serde(default)]
    pub temp_constitution: i32,
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub weight: f32,
}

/// The three equipment slots combat cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquippedGear {
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
    pub accessory: Option<Item>,
}

/// Flat bonuses derived from equipped gear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearBonuses {
    pub attack_bonus: i32,
    pub damage_bonus: i32,
    /// Dice of the equipped weapon; unarmed when nothing is equipped.
    pub damage_dice: String,
    pub armor_bonus: i32,
}

impl Default for GearBonuses {
    fn default() -> Self {
        Self {
            attack_bonus: 0,
            damage_bonus: 0,
            damage_dice: "1d4".to_string(),
            armor_bonus: 0,
        }
    }
}

impl GearBonuses {
    /// Fold the equipped weapon, armor and accessory into flat bonuses.
    pub fn from_equipped(gear: &EquippedGear) -> Self {
        let mut bonuses = Self::default();

        if let Some(weapon) = &gear.weapon {
            if let Some(dice) = &weapon.damage_dice {
                bonuses.damage_dice = dice.clone();
            }
            bonuses.damage_bonus += weapon.damage_bonus;
        }
        if let Some(armor) = &gear.armor {
            bonuses.armor_bonus += armor.armor_bonus;
        }
        if let Some(accessory) = &gear.accessory {
            bonuses.armor_bonus += accessory.armor_bonus;
            bonuses.damage_bonus += accessory.damage_bonus;
        }

        bonuses
    }
}

/// Temporary attribute boost from a potion.
///
/// Ticks down once per resolved player action and clears completely when
/// the counter empties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeBuff {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub turns_remaining: u32,
}

impl AttributeBuff {
    pub fn new(strength: i32, dexterity: i32, constitution: i32, turns: u32) -> Self {
        Self {
            strength,
            dexterity,
            constitution,
            turns_remaining: turns,
        }
    }

    pub fn is_active(&self) -> bool {
        self.turns_remaining > 0
    }

    /// Half the strength boost, floored, feeds the attack bonus while the
    /// buff is active.
    pub fn attack_bonus(&self) -> i32 {
        if self.is_active() {
            self.strength.div_euclid(2)
        } else {
            0
        }
    }

    /// Burn one turn; zero everything once the counter empties.
    pub fn decay(&mut self) {
        if self.turns_remaining <= 1 {
            *self = Self::default();
        } else {
            self.turns_remaining -= 1;
        }
    }
}
