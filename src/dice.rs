//! Dice rolling and attack resolution.
//!
//! Attack resolution is d20-based: roll plus bonus against armor class.
//! A natural 20 hits regardless of the total and doubles the damage dice;
//! a natural 1 misses regardless of the bonus.
//!
//! All randomness flows through the [`DieRoller`] seam so encounters can be
//! replayed deterministically in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("dice count must be at least 1")]
    InvalidDiceCount,
    #[error("die size must be at least 1")]
    InvalidDieSize,
}

/// A parsed dice expression: `NdM`, `NdM+K` or `NdM-K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSpec {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl DiceSpec {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Parse strict `NdM`, `NdM+K` or `NdM-K` notation.
    ///
    /// The whole trimmed string must match; the `dM` shorthand and trailing
    /// text are rejected.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let s = notation.trim();
        let invalid = || DiceError::InvalidNotation(notation.to_string());

        let d_pos = s.find(|c| c == 'd' || c == 'D').ok_or_else(invalid)?;
        let count_str = &s[..d_pos];
        let rest = &s[d_pos + 1..];

        let (sides_str, modifier) = match rest.find(|c| c == '+' || c == '-') {
            Some(sign_pos) => {
                let digits = &rest[sign_pos + 1..];
                if !all_digits(digits) {
                    return Err(invalid());
                }
                let value: i32 = digits.parse().map_err(|_| invalid())?;
                let signed = if rest.as_bytes()[sign_pos] == b'-' {
                    -value
                } else {
                    value
                };
                (&rest[..sign_pos], signed)
            }
            None => (rest, 0),
        };

        if !all_digits(count_str) || !all_digits(sides_str) {
            return Err(invalid());
        }
        let count: u32 = count_str.parse().map_err(|_| invalid())?;
        let sides: u32 = sides_str.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(DiceError::InvalidDiceCount);
        }
        if sides == 0 {
            return Err(DiceError::InvalidDieSize);
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }
}

impl FromStr for DiceSpec {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceSpec::parse(s)
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier.cmp(&0) {
            std::cmp::Ordering::Greater => write!(f, "+{}", self.modifier),
            std::cmp::Ordering::Less => write!(f, "{}", self.modifier),
            std::cmp::Ordering::Equal => Ok(()),
        }
    }
}

/// The record of one resolved dice expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceRoll {
    pub notation: String,
    /// Individual die results, in roll order.
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
}

impl DiceRoll {
    /// Raw result of the first die, before any modifier. For single-d20
    /// rolls this is what critical and fumble checks look at.
    pub fn natural(&self) -> u32 {
        self.rolls.first().copied().unwrap_or(0)
    }
}

impl fmt::Display for DiceRoll {
    /// Formats as `[3 + 4] + 2 = 9` for log and result strings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rolls = self
            .rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(" + ");
        write!(f, "[{rolls}]")?;
        match self.modifier.cmp(&0) {
            std::cmp::Ordering::Greater => write!(f, " + {}", self.modifier)?,
            std::cmp::Ordering::Less => write!(f, " - {}", self.modifier.abs())?,
            std::cmp::Ordering::Equal => {}
        }
        write!(f, " = {}", self.total)
    }
}

/// Full result of an attack roll against an armor class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub attack_roll: DiceRoll,
    pub hit: bool,
    pub critical: bool,
    pub fumble: bool,
    /// Absent on a miss. On a critical the extra dice are appended.
    pub damage_roll: Option<DiceRoll>,
    /// Zero on a miss, never below 1 on a hit.
    pub total_damage: i32,
}

/// Standard attribute modifier: floor((score - 10) / 2).
pub fn attribute_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Source of individual die results.
pub trait DieRoller: Send {
    /// Return a uniformly distributed value in `[1, sides]`.
    fn roll(&mut self, sides: u32) -> u32;
}

/// [`DieRoller`] backed by any [`rand::Rng`].
pub struct RngRoller<R: Rng + Send>(pub R);

impl<R: Rng + Send> DieRoller for RngRoller<R> {
    fn roll(&mut self, sides: u32) -> u32 {
        self.0.gen_range(1..=sides)
    }
}

/// The dice engine. Owns its random source so the whole combat layer can be
/// driven from a scripted sequence in tests.
pub struct Dice {
    roller: Box<dyn DieRoller>,
}

impl Dice {
    /// Engine seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_roller(Box::new(RngRoller(StdRng::from_entropy())))
    }

    pub fn with_roller(roller: Box<dyn DieRoller>) -> Self {
        Self { roller }
    }

    /// Roll a single die. `sides` must be at least 1.
    pub fn roll_die(&mut self, sides: u32) -> u32 {
        assert!(sides >= 1, "die must have at least one side");
        self.roller.roll(sides)
    }

    /// Roll a notation string like `"2d6+3"`.
    pub fn roll(&mut self, notation: &str) -> Result<DiceRoll, DiceError> {
        Ok(self.roll_spec(&DiceSpec::parse(notation)?))
    }

    /// Roll an already-parsed expression.
    pub fn roll_spec(&mut self, spec: &DiceSpec) -> DiceRoll {
        let rolls: Vec<u32> = (0..spec.count).map(|_| self.roll_die(spec.sides)).collect();
        let total = rolls.iter().map(|&r| r as i32).sum::<i32>() + spec.modifier;
        DiceRoll {
            notation: spec.to_string(),
            rolls,
            modifier: spec.modifier,
            total,
        }
    }

    /// One d20 plus a flat modifier.
    pub fn d20(&mut self, modifier: i32) -> DiceRoll {
        let roll = self.roll_die(20);
        let notation = if modifier >= 0 {
            format!("1d20+{modifier}")
        } else {
            format!("1d20{modifier}")
        };
        DiceRoll {
            notation,
            rolls: vec![roll],
            modifier,
            total: roll as i32 + modifier,
        }
    }

    /// Initiative is a straight d20 + DEX modifier.
    pub fn initiative(&mut self, dex_modifier: i32) -> i32 {
        self.d20(dex_modifier).total
    }

    /// Resolve an attack against an armor class.
    ///
    /// On a critical the damage dice are rolled a second independent time
    /// and added; the flat modifier is counted once. Damage on any hit is
    /// floored at 1.
    pub fn attack_roll(
        &mut self,
        attack_bonus: i32,
        target_ac: i32,
        damage_dice: &DiceSpec,
        damage_bonus: i32,
    ) -> AttackOutcome {
        let attack_roll = self.d20(attack_bonus);
        let natural = attack_roll.natural();

        let critical = natural == 20;
        let fumble = natural == 1;
        let hit = critical || (!fumble && attack_roll.total >= target_ac);

        let mut damage_roll = None;
        let mut total_damage = 0;

        if hit {
            let mut roll = self.roll_spec(damage_dice);
            total_damage = roll.total + damage_bonus;

            if critical {
                let extra = self.roll_spec(damage_dice);
                let extra_dice: i32 = extra.rolls.iter().map(|&r| r as i32).sum();
                total_damage += extra_dice;
                roll.rolls.extend(extra.rolls);
                roll.total += extra_dice;
            }

            total_damage = total_damage.max(1);
            damage_roll = Some(roll);
        }

        AttackOutcome {
            attack_roll,
            hit,
            critical,
            fumble,
            damage_roll,
            total_damage,
        }
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scripted_dice;

    #[test]
    fn parse_simple() {
        let spec = DiceSpec::parse("1d20").unwrap();
        assert_eq!(spec, DiceSpec::new(1, 20, 0));
    }

    #[test]
    fn parse_with_modifier() {
        assert_eq!(DiceSpec::parse("2d6+3").unwrap(), DiceSpec::new(2, 6, 3));
        assert_eq!(DiceSpec::parse("1d8-1").unwrap(), DiceSpec::new(1, 8, -1));
        assert_eq!(DiceSpec::parse(" 1D12+0 ").unwrap(), DiceSpec::new(1, 12, 0));
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["bad", "", "d20", "2d", "2d6+", "2d6+3junk", "x2d6", "2d6 3"] {
            assert!(
                matches!(DiceSpec::parse(bad), Err(DiceError::InvalidNotation(_))),
                "expected {bad:?} to be rejected"
            );
        }
        assert_eq!(DiceSpec::parse("0d6"), Err(DiceError::InvalidDiceCount));
        assert_eq!(DiceSpec::parse("1d0"), Err(DiceError::InvalidDieSize));
    }

    #[test]
    fn modifiers_floor_below_ten() {
        assert_eq!(attribute_modifier(1), -5);
        assert_eq!(attribute_modifier(7), -2);
        assert_eq!(attribute_modifier(8), -1);
        assert_eq!(attribute_modifier(9), -1);
        assert_eq!(attribute_modifier(10), 0);
        assert_eq!(attribute_modifier(16), 3);
        assert_eq!(attribute_modifier(18), 4);
    }

    #[test]
    fn roll_stays_in_range() {
        let mut dice = Dice::new();
        for _ in 0..100 {
            let result = dice.roll("1d20").unwrap();
            assert!(result.total >= 1 && result.total <= 20);
        }
        for _ in 0..100 {
            let result = dice.roll("2d6+3").unwrap();
            assert!(result.total >= 5 && result.total <= 15);
        }
    }

    #[test]
    fn d20_exposes_natural_roll() {
        let mut dice = scripted_dice([7]);
        let roll = dice.d20(5);
        assert_eq!(roll.natural(), 7);
        assert_eq!(roll.total, 12);
    }

    #[test]
    fn initiative_is_d20_plus_modifier() {
        let mut dice = scripted_dice([7]);
        assert_eq!(dice.initiative(2), 9);
    }

    #[test]
    fn natural_twenty_always_hits_and_crits() {
        let mut dice = scripted_dice([20, 3, 4]);
        let outcome = dice.attack_roll(0, 30, &DiceSpec::new(1, 8, 0), 2);
        assert!(outcome.hit);
        assert!(outcome.critical);
        assert!(!outcome.fumble);
        // Two independent damage dice, flat bonus once.
        assert_eq!(outcome.total_damage, 3 + 4 + 2);
        assert_eq!(outcome.damage_roll.unwrap().rolls, vec![3, 4]);
    }

    #[test]
    fn natural_one_always_misses() {
        let mut dice = scripted_dice([1]);
        let outcome = dice.attack_roll(50, 5, &DiceSpec::new(1, 8, 0), 2);
        assert!(!outcome.hit);
        assert!(outcome.fumble);
        assert!(outcome.damage_roll.is_none());
        assert_eq!(outcome.total_damage, 0);
    }

    #[test]
    fn critical_counts_embedded_modifier_once() {
        let mut dice = scripted_dice([20, 2, 3, 4, 5]);
        let outcome = dice.attack_roll(0, 10, &DiceSpec::new(2, 6, 3), 0);
        assert_eq!(outcome.total_damage, (2 + 3 + 3) + (4 + 5));
    }

    #[test]
    fn hit_damage_is_at_least_one() {
        let mut dice = scripted_dice([15, 1]);
        let outcome = dice.attack_roll(5, 10, &DiceSpec::new(1, 4, 0), -10);
        assert!(outcome.hit);
        assert_eq!(outcome.total_damage, 1);
    }

    #[test]
    fn miss_rolls_no_damage() {
        let mut dice = scripted_dice([5]);
        let outcome = dice.attack_roll(0, 15, &DiceSpec::new(1, 8, 0), 0);
        assert!(!outcome.hit);
        assert!(!outcome.fumble);
        assert!(outcome.damage_roll.is_none());
    }

    #[test]
    fn roll_display_format() {
        let mut dice = scripted_dice([3, 4]);
        let roll = dice.roll("2d6+2").unwrap();
        assert_eq!(roll.to_string(), "[3 + 4] + 2 = 9");

        let mut dice = scripted_dice([5]);
        let roll = dice.roll("1d8-1").unwrap();
        assert_eq!(roll.to_string(), "[5] - 1 = 4");
    }
}
