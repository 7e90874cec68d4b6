//! Participant snapshot.
//!
//! A participant is a character or a generic unit entered into a battle. The
//! engine never mutates a participant in place outside of a resolution step:
//! every step clones the snapshots it touches and returns the new versions.

use std::collections::BTreeMap;

use bitflags::bitflags;

use super::ParticipantId;
use super::effects::ActiveEffect;
use super::gear::{ArtifactModifier, Attack, PassiveAbility, Resistances};
use super::skills::ActiveSkill;
use super::spells::Spellcasting;
use crate::config::BattleConfig;

/// One of the six ability scores.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Str,
        Ability::Dex,
        Ability::Con,
        Ability::Int,
        Ability::Wis,
        Ability::Cha,
    ];

    /// Upper-case label used in breakdown lines (`STR`, `DEX`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Ability::Str => "STR",
            Ability::Dex => "DEX",
            Ability::Con => "CON",
            Ability::Int => "INT",
            Ability::Wis => "WIS",
            Ability::Cha => "CHA",
        }
    }
}

/// Raw ability scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityScores {
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub cha: i32,
}

impl AbilityScores {
    pub fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            str,
            dex,
            con,
            int,
            wis,
            cha,
        }
    }

    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Str => self.str,
            Ability::Dex => self.dex,
            Ability::Con => self.con,
            Ability::Int => self.int,
            Ability::Wis => self.wis,
            Ability::Cha => self.cha,
        }
    }

    /// `floor((score - 10) / 2)`.
    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.score(ability) - 10).div_euclid(2)
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

/// Battle side. Fixed for the lifetime of a participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    Ally,
    Enemy,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Ally => Side::Enemy,
            Side::Enemy => Side::Ally,
        }
    }
}

/// Whether the participant comes from a player character or a generic unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SourceKind {
    Character,
    #[default]
    Unit,
}

/// Life status derived from HP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LifeStatus {
    #[default]
    Active,
    Unconscious,
    Dead,
}

bitflags! {
    /// Per-turn action economy.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ActionFlags: u8 {
        const ACTION_USED       = 1 << 0;
        const BONUS_ACTION_USED = 1 << 1;
        const REACTION_USED     = 1 << 2;
        const EXTRA_TURN        = 1 << 3;
    }
}

/// Where the participant came from outside the battle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Identity {
    pub source_id: String,
    pub source_kind: SourceKind,
    /// Player or game master controlling the participant.
    pub controller: Option<String>,
    /// Instance number when several copies of one unit are entered.
    pub instance: Option<u32>,
}

/// Battle-scoped snapshot of a character or unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub identity: Identity,
    side: Side,

    // ===== abilities =====
    #[cfg_attr(feature = "serde", serde(default))]
    pub abilities: AbilityScores,
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub level: u32,
    #[cfg_attr(feature = "serde", serde(default = "two"))]
    pub proficiency: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub race: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initiative: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub base_initiative: i32,

    // ===== combat stats =====
    pub max_hp: u32,
    pub current_hp: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub temp_hp: u32,
    pub armor_class: i32,
    #[cfg_attr(feature = "serde", serde(default = "thirty"))]
    pub speed: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub morale: i8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: LifeStatus,
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub min_targets: u32,
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub max_targets: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resistances: Resistances,

    #[cfg_attr(feature = "serde", serde(default))]
    pub spellcasting: Spellcasting,

    // ===== battle data =====
    #[cfg_attr(feature = "serde", serde(default))]
    pub attacks: Vec<Attack>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<ActiveEffect>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub passives: Vec<PassiveAbility>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub racial: Vec<PassiveAbility>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub skills: Vec<ActiveSkill>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub artifacts: Vec<ArtifactModifier>,
    /// Times each skill fired this battle. Only ever incremented.
    #[cfg_attr(feature = "serde", serde(default))]
    usage: BTreeMap<String, u32>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: ActionFlags,
}

#[cfg(feature = "serde")]
fn one() -> u32 {
    1
}

#[cfg(feature = "serde")]
fn two() -> i32 {
    2
}

#[cfg(feature = "serde")]
fn thirty() -> u32 {
    30
}

impl Participant {
    pub fn new(id: ParticipantId, name: &str, side: Side) -> Self {
        Self {
            id,
            name: name.to_string(),
            identity: Identity::default(),
            side,
            abilities: AbilityScores::default(),
            level: 1,
            proficiency: 2,
            race: String::new(),
            initiative: 0,
            base_initiative: 0,
            max_hp: 1,
            current_hp: 1,
            temp_hp: 0,
            armor_class: 10,
            speed: 30,
            morale: 0,
            status: LifeStatus::Active,
            min_targets: 1,
            max_targets: 1,
            resistances: Resistances::default(),
            spellcasting: Spellcasting::default(),
            attacks: Vec::new(),
            effects: Vec::new(),
            passives: Vec::new(),
            racial: Vec::new(),
            skills: Vec::new(),
            artifacts: Vec::new(),
            usage: BTreeMap::new(),
            flags: ActionFlags::empty(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_active(&self) -> bool {
        self.status == LifeStatus::Active
    }

    pub fn is_opponent_of(&self, other: &Participant) -> bool {
        self.side != other.side
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.abilities.modifier(ability)
    }

    /// True when `current_hp / max_hp * 100 <= threshold`.
    pub fn has_low_hp(&self, threshold: u32) -> bool {
        if self.max_hp == 0 {
            return false;
        }
        u64::from(self.current_hp) * 100 <= u64::from(threshold) * u64::from(self.max_hp)
    }

    /// Current HP as a whole percentage of max HP.
    pub fn hp_percent(&self) -> i64 {
        if self.max_hp == 0 {
            return 0;
        }
        i64::from(self.current_hp) * 100 / i64::from(self.max_hp)
    }

    pub fn usage(&self, skill_id: &str) -> u32 {
        self.usage.get(skill_id).copied().unwrap_or(0)
    }

    pub fn record_usage(&mut self, skill_id: &str) -> u32 {
        let count = self.usage.entry(skill_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn skill(&self, skill_id: &str) -> Option<&ActiveSkill> {
        self.skills.iter().find(|skill| skill.id == skill_id)
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.effects
            .iter()
            .any(|effect| effect.name.eq_ignore_ascii_case(name))
    }

    /// Clears the per-turn action economy.
    pub fn reset_turn_flags(&mut self) {
        self.flags = ActionFlags::empty();
    }

    /// Sets morale, clamped into the allowed range.
    pub fn set_morale(&mut self, value: i32) {
        self.morale = BattleConfig::clamp_morale(value);
    }

    // ===== builders =====

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_level(mut self, level: u32, proficiency: i32) -> Self {
        self.level = level;
        self.proficiency = proficiency;
        self
    }

    pub fn with_race(mut self, race: &str) -> Self {
        self.race = race.to_string();
        self
    }

    pub fn with_initiative(mut self, initiative: i32, base_initiative: i32) -> Self {
        self.initiative = initiative;
        self.base_initiative = base_initiative;
        self
    }

    /// Sets max HP and fills current HP.
    pub fn with_hp(mut self, max_hp: u32) -> Self {
        self.max_hp = max_hp;
        self.current_hp = max_hp;
        self
    }

    pub fn with_current_hp(mut self, current_hp: u32) -> Self {
        self.current_hp = current_hp.min(self.max_hp);
        self
    }

    pub fn with_temp_hp(mut self, temp_hp: u32) -> Self {
        self.temp_hp = temp_hp;
        self
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = armor_class;
        self
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_morale(mut self, morale: i32) -> Self {
        self.set_morale(morale);
        self
    }

    pub fn with_targets(mut self, min_targets: u32, max_targets: u32) -> Self {
        self.min_targets = min_targets;
        self.max_targets = max_targets.max(min_targets);
        self
    }

    pub fn with_resistances(mut self, resistances: Resistances) -> Self {
        self.resistances = resistances;
        self
    }

    pub fn with_spellcasting(mut self, spellcasting: Spellcasting) -> Self {
        self.spellcasting = spellcasting;
        self
    }

    pub fn with_attack(mut self, attack: Attack) -> Self {
        self.attacks.push(attack);
        self
    }

    pub fn with_effect(mut self, effect: ActiveEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_passive(mut self, passive: PassiveAbility) -> Self {
        self.passives.push(passive);
        self
    }

    pub fn with_racial(mut self, racial: PassiveAbility) -> Self {
        self.racial.push(racial);
        self
    }

    pub fn with_skill(mut self, skill: ActiveSkill) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn with_artifact(mut self, artifact: ArtifactModifier) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Copy of a template under a new id and side, with battle data reset.
    pub fn spawn(&self, id: ParticipantId, side: Side, instance: Option<u32>) -> Self {
        let mut spawned = self.clone();
        spawned.id = id;
        spawned.side = side;
        spawned.identity.instance = instance;
        spawned.current_hp = spawned.max_hp;
        spawned.temp_hp = 0;
        spawned.status = LifeStatus::Active;
        spawned.effects.clear();
        spawned.usage.clear();
        spawned.flags = ActionFlags::empty();
        spawned
    }
}
