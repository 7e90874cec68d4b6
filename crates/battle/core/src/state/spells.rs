//! Spellcasting data: known spells and slot pools.

use std::collections::BTreeMap;

use super::effects::{DotDamage, EffectEntry, EffectKind};
use super::participant::Ability;

/// Which participants a spell lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SpellTargeting {
    /// First explicit target id.
    Single,
    /// Every explicit target id.
    Area,
    /// Every active opponent of the caster.
    Enemies,
    /// Every active ally of the caster, caster included.
    Allies,
    /// Every active participant.
    All,
}

/// Outcome of a successful saving throw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SaveEffect {
    Half,
    Negate,
}

/// Per-target gate applied before the spell lands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellCheck {
    /// Always lands.
    #[default]
    Automatic,
    /// Target rolls `d20 + ability modifier` against the caster's save DC.
    Save { ability: Ability, on_success: SaveEffect },
    /// Caster rolls `d20 + spell attack bonus` against the target's AC.
    AttackRoll,
}

/// What the spell does to each target that is not negated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellEffect {
    Damage {
        dice: String,
        damage_type: String,
    },
    Heal {
        dice: String,
    },
    Condition {
        name: String,
        kind: EffectKind,
        duration: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        entries: Vec<EffectEntry>,
        #[cfg_attr(feature = "serde", serde(default))]
        dot: Option<DotDamage>,
    },
}

/// A spell the participant can cast.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnownSpell {
    pub id: String,
    pub name: String,
    /// Slot level consumed; 0 is a cantrip and consumes nothing.
    pub level: u8,
    pub targeting: SpellTargeting,
    #[cfg_attr(feature = "serde", serde(default))]
    pub check: SpellCheck,
    pub effect: SpellEffect,
    /// Adds the casting ability modifier to the rolled amount.
    #[cfg_attr(feature = "serde", serde(default))]
    pub add_modifier: bool,
    /// Follow-up spell cast for free when an upgrade skill fires.
    #[cfg_attr(feature = "serde", serde(default))]
    pub upgrade: Option<String>,
}

impl KnownSpell {
    pub fn new(id: &str, name: &str, level: u8, targeting: SpellTargeting, effect: SpellEffect) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level,
            targeting,
            check: SpellCheck::Automatic,
            effect,
            add_modifier: false,
            upgrade: None,
        }
    }

    pub fn with_check(mut self, check: SpellCheck) -> Self {
        self.check = check;
        self
    }

    pub fn with_modifier(mut self) -> Self {
        self.add_modifier = true;
        self
    }

    pub fn with_upgrade(mut self, spell_id: &str) -> Self {
        self.upgrade = Some(spell_id.to_string());
        self
    }
}

/// Slots available at one spell level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotPool {
    pub max: u32,
    pub current: u32,
}

impl SlotPool {
    pub fn full(max: u32) -> Self {
        Self { max, current: max }
    }
}

/// Spellcasting block of a participant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Spellcasting {
    pub known: Vec<KnownSpell>,
    /// Slot pools keyed by spell level (1..=9).
    pub slots: BTreeMap<u8, SlotPool>,
    pub ability: Ability,
    pub save_dc: i32,
    pub attack_bonus: i32,
}

impl Default for Spellcasting {
    fn default() -> Self {
        Self {
            known: Vec::new(),
            slots: BTreeMap::new(),
            ability: Ability::Int,
            save_dc: 10,
            attack_bonus: 0,
        }
    }
}

impl Spellcasting {
    pub fn spell(&self, id: &str) -> Option<&KnownSpell> {
        self.known.iter().find(|spell| spell.id == id)
    }

    pub fn remaining(&self, level: u8) -> u32 {
        self.slots.get(&level).map_or(0, |pool| pool.current)
    }

    /// Consumes one slot. Returns false when none remain.
    pub fn consume_slot(&mut self, level: u8) -> bool {
        match self.slots.get_mut(&level) {
            Some(pool) if pool.current > 0 => {
                pool.current -= 1;
                true
            }
            _ => false,
        }
    }

    /// Restores one slot up to the pool maximum. Returns false when full.
    pub fn restore_slot(&mut self, level: u8) -> bool {
        match self.slots.get_mut(&level) {
            Some(pool) if pool.current < pool.max => {
                pool.current += 1;
                true
            }
            _ => false,
        }
    }
}
