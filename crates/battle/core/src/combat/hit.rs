//! Attack rolls.

use crate::config::BattleConfig;
use crate::state::{Attack, HitOutcome, Participant, ParticipantId};
use crate::stats::{AttackType, bonus_attack, has_flag, normalize_tag};

use super::damage::attack_ability;

/// Inputs of one attack roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HitInput {
    pub d20: u32,
    /// Second d20, used only when the attacker has advantage.
    pub advantage_d20: Option<u32>,
    pub advantage: bool,
    pub attack_bonus: i32,
    pub target_ac: i32,
    /// A guaranteed-hit effect turns a miss into a hit. Natural 1 still fails.
    pub guaranteed: bool,
}

/// Result of [`resolve_hit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitRoll {
    /// The d20 that counts.
    pub natural: u32,
    pub used_advantage: bool,
    pub total: i32,
    pub outcome: HitOutcome,
}

/// Natural 20 is a critical hit, natural 1 a critical fail, otherwise the
/// attack hits iff `natural + bonus >= target AC`.
pub fn resolve_hit(input: &HitInput) -> HitRoll {
    let (natural, used_advantage) = match input.advantage_d20 {
        Some(second) if input.advantage => (input.d20.max(second), true),
        _ => (input.d20, false),
    };
    let total = natural as i32 + input.attack_bonus;
    let outcome = match natural {
        20 => HitOutcome::CriticalHit,
        1 => HitOutcome::CriticalFail,
        _ if total >= input.target_ac || input.guaranteed => HitOutcome::Hit,
        _ => HitOutcome::Miss,
    };
    HitRoll {
        natural,
        used_advantage,
        total,
        outcome,
    }
}

/// True if the attacker rolls with advantage: a configured race making a
/// ranged attack, or an active `advantage` effect.
pub fn has_advantage(attacker: &Participant, attack_type: AttackType, config: &BattleConfig) -> bool {
    (attack_type == AttackType::Ranged && config.has_ranged_advantage(&attacker.race))
        || has_flag(attacker, "advantage")
}

/// Weapon bonus, ability modifier, proficiency, effect and artifact bonuses,
/// plus any mark the attacker placed on the target.
pub fn attack_bonus(attacker: &Participant, weapon: &Attack, target: Option<&Participant>) -> i32 {
    let ability = attack_ability(attacker, weapon.attack_type);
    weapon.weapon_bonus
        + attacker.modifier(ability)
        + attacker.proficiency
        + bonus_attack(attacker)
        + target.map_or(0, |target| mark_bonus(target, attacker.id))
}

/// Bonus granted by `marked` entries whose source is `attacker`.
pub fn mark_bonus(target: &Participant, attacker: ParticipantId) -> i32 {
    target
        .effects
        .iter()
        .filter(|effect| effect.source == Some(attacker))
        .flat_map(|effect| effect.effects.iter())
        .filter(|entry| normalize_tag(&entry.stat) == "marked")
        .map(|entry| entry.value)
        .sum()
}
