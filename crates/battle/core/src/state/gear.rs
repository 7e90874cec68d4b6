//! Weapons, artifacts, passive abilities and resistances.

use crate::stats::{AttackType, DamageCategory};

/// One entry of a participant's attack list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attack {
    pub name: String,
    pub attack_type: AttackType,
    /// Weapon dice in `NdM[+K]` notation.
    pub damage_dice: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weapon_bonus: i32,
    #[cfg_attr(feature = "serde", serde(default = "physical"))]
    pub damage_type: String,
}

#[cfg(feature = "serde")]
fn physical() -> String {
    "physical".to_string()
}

impl Attack {
    pub fn new(name: &str, attack_type: AttackType, damage_dice: &str) -> Self {
        Self {
            name: name.to_string(),
            attack_type,
            damage_dice: damage_dice.to_string(),
            weapon_bonus: 0,
            damage_type: "physical".to_string(),
        }
    }

    pub fn with_bonus(mut self, weapon_bonus: i32) -> Self {
        self.weapon_bonus = weapon_bonus;
        self
    }
}

/// Stat modifier granted by an equipped artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArtifactModifier {
    pub name: String,
    pub stat: String,
    pub value: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_percentage: bool,
}

impl ArtifactModifier {
    pub fn new(name: &str, stat: &str, value: i32, is_percentage: bool) -> Self {
        Self {
            name: name.to_string(),
            stat: stat.to_string(),
            value,
            is_percentage,
        }
    }
}

/// Passive or racial ability.
///
/// `effect` is a free-form tag. Tags read by the engine:
/// - `ally_low_hp_damage`: percent damage bonus while any ally is at or below
///   `threshold` percent HP
/// - any damage tag (`melee_damage`, `physical_damage`, ...): static bonus
/// - `elemental_rider`: extra `dice` damage of `damage_type` on every hit
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PassiveAbility {
    pub name: String,
    pub effect: String,
    pub value: i32,
    pub is_percentage: bool,
    pub threshold: Option<u32>,
    pub damage_type: Option<String>,
    pub dice: Option<String>,
}

impl PassiveAbility {
    pub fn new(name: &str, effect: &str, value: i32, is_percentage: bool) -> Self {
        Self {
            name: name.to_string(),
            effect: effect.to_string(),
            value,
            is_percentage,
            ..Self::default()
        }
    }

    pub fn ally_low_hp(name: &str, percent: i32, threshold: Option<u32>) -> Self {
        Self {
            threshold,
            ..Self::new(name, "ally_low_hp_damage", percent, true)
        }
    }

    pub fn elemental_rider(name: &str, damage_type: &str, dice: &str) -> Self {
        Self {
            damage_type: Some(damage_type.to_string()),
            dice: Some(dice.to_string()),
            ..Self::new(name, "elemental_rider", 0, false)
        }
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.effect.eq_ignore_ascii_case(tag)
    }
}

/// Percent damage reduction per damage category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Resistances {
    pub physical: u32,
    pub spell: u32,
}

impl Resistances {
    pub fn new(physical: u32, spell: u32) -> Self {
        Self { physical, spell }
    }

    pub fn percent(&self, category: DamageCategory) -> u32 {
        match category {
            DamageCategory::Physical => self.physical,
            DamageCategory::Spell => self.spell,
        }
    }
}
