//! Damage computation with an ordered, reproducible breakdown.
//!
//! ```text
//! base_with_stat = max(0, base + hero_level + hero_dice + stat_mod)
//! percent_bonus  = floor(base_with_stat × Σpercent / 100)
//! total          = base_with_stat + percent_bonus + Σflat
//! ```
//!
//! Every term yields one breakdown line; zero terms yield none. The same
//! inputs always produce the same lines in the same order.

use tracing::trace;

use crate::config::BattleConfig;
use crate::state::{Ability, Participant};
use crate::stats::{
    AttackType, BonusStack, format_flat, has_any_ally_low_hp, matches_attack_type,
    non_empty, normalize_tag,
};

/// Ability whose modifier drives attacks and damage of `attack_type`.
pub fn attack_ability(participant: &Participant, attack_type: AttackType) -> Ability {
    match attack_type {
        AttackType::Melee => Ability::Str,
        AttackType::Ranged => Ability::Dex,
        AttackType::Spell => participant.spellcasting.ability,
    }
}

/// Raw inputs of one damage computation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageInput {
    /// Dice total (faces plus the notation's modifier).
    pub base: i64,
    pub hero_level_bonus: i64,
    pub hero_dice: i64,
    /// Ability and modifier added to the base, if any.
    pub stat: Option<(Ability, i32)>,
}

/// Result of [`compute_damage`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DamageRoll {
    pub base_with_stat: i64,
    pub total_percent: i64,
    pub percent_bonus: i64,
    pub total_flat: i64,
    pub total: i64,
    pub breakdown: Vec<String>,
}

/// Percent and flat damage bonuses that apply without any trigger:
/// static skills, active effects, artifacts, passives and racial traits,
/// plus the ally-low-HP passive while an ally is at or below its threshold.
pub fn static_bonuses(
    attacker: &Participant,
    roster: &[Participant],
    config: &BattleConfig,
    attack_type: AttackType,
) -> BonusStack {
    let mut stack = BonusStack::new();

    for skill in attacker.skills.iter().filter(|skill| skill.is_static()) {
        for effect in &skill.effects {
            if !matches_attack_type(&effect.stat, attack_type) {
                continue;
            }
            let label = format!("Skill {}", skill.name);
            let value = effect.value.number();
            if effect.is_percent() {
                stack.add_percent(label, value);
            } else {
                stack.add_flat(label, value);
            }
        }
    }

    for effect in &attacker.effects {
        for entry in effect
            .effects
            .iter()
            .filter(|entry| matches_attack_type(&entry.stat, attack_type))
        {
            let label = format!("Effect {}", effect.name);
            if entry.is_percentage {
                stack.add_percent(label, entry.value);
            } else {
                stack.add_flat(label, entry.value);
            }
        }
    }

    for artifact in attacker
        .artifacts
        .iter()
        .filter(|artifact| matches_attack_type(&artifact.stat, attack_type))
    {
        let label = format!("Artifact {}", artifact.name);
        if artifact.is_percentage {
            stack.add_percent(label, artifact.value);
        } else {
            stack.add_flat(label, artifact.value);
        }
    }

    let passives = attacker
        .passives
        .iter()
        .map(|passive| ("Passive", passive))
        .chain(attacker.racial.iter().map(|racial| ("Racial", racial)));
    for (kind, passive) in passives {
        let label = format!("{kind} {}", passive.name);
        if normalize_tag(&passive.effect) == "ally_low_hp_damage" {
            let threshold = passive.threshold.unwrap_or(config.low_hp_threshold);
            if has_any_ally_low_hp(roster, attacker, threshold) {
                stack.add_percent(label, passive.value);
            }
            continue;
        }
        if !matches_attack_type(&passive.effect, attack_type) {
            continue;
        }
        if passive.is_percentage {
            stack.add_percent(label, passive.value);
        } else {
            stack.add_flat(label, passive.value);
        }
    }
    stack
}

/// Applies `bonuses` to the input and produces the breakdown.
pub fn compute_damage(input: &DamageInput, bonuses: &BonusStack) -> DamageRoll {
    let stat_mod = input.stat.map_or(0, |(_, modifier)| i64::from(modifier));
    let base_with_stat = (input.base + input.hero_level_bonus + input.hero_dice + stat_mod).max(0);
    let applied = bonuses.apply(base_with_stat);

    let mut lines = vec![format!("Base damage: {}", input.base)];
    lines.push(format_flat("Hero level bonus", input.hero_level_bonus));
    lines.push(format_flat("Hero dice", input.hero_dice));
    if let Some((ability, modifier)) = input.stat {
        lines.push(format_flat(&format!("{} modifier", ability.label()), i64::from(modifier)));
    }
    lines.extend(bonuses.lines());
    lines.push(match applied.percent_bonus {
        0 => String::new(),
        bonus => format!("Percent bonus ({}%): +{bonus}", applied.total_percent),
    });
    lines.push(format!("Total damage: {}", applied.total));
    let breakdown = non_empty(lines);
    trace!(total = applied.total, lines = breakdown.len(), "damage composed");

    DamageRoll {
        base_with_stat,
        total_percent: applied.total_percent,
        percent_bonus: applied.percent_bonus,
        total_flat: applied.total_flat,
        total: applied.total,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        ActiveEffect, ActiveSkill, ArtifactModifier, EffectEntry, EffectKind, PassiveAbility,
        ParticipantId, Side, SkillEffect,
    };

    fn hero() -> Participant {
        Participant::new(ParticipantId(1), "Hero", Side::Ally).with_hp(30)
    }

    #[test]
    fn basic_damage_lines() {
        let input = DamageInput {
            base: 5,
            stat: Some((Ability::Str, 2)),
            ..DamageInput::default()
        };
        let roll = compute_damage(&input, &BonusStack::new());
        assert_eq!(roll.total, 7);
        assert_eq!(
            roll.breakdown,
            vec![
                "Base damage: 5".to_string(),
                "STR modifier: +2".to_string(),
                "Total damage: 7".to_string(),
            ]
        );
    }

    #[test]
    fn percent_stacking_adds_floored_bonus() {
        let mut bonuses = BonusStack::new();
        bonuses.add_percent("Skill Rage", 25);
        bonuses.add_percent("Effect Bless", 10);
        let input = DamageInput {
            base: 12,
            ..DamageInput::default()
        };
        let roll = compute_damage(&input, &bonuses);
        assert_eq!(roll.percent_bonus, 4);
        assert_eq!(roll.total, 16);
        assert_eq!(bonuses.lines().len(), 2);
        assert!(roll.breakdown.contains(&"Percent bonus (35%): +4".to_string()));
    }

    #[test]
    fn negative_base_is_floored_at_zero() {
        let input = DamageInput {
            base: 1,
            stat: Some((Ability::Str, -3)),
            ..DamageInput::default()
        };
        assert_eq!(compute_damage(&input, &BonusStack::new()).total, 0);
    }

    #[test]
    fn breakdown_is_reproducible() {
        let mut bonuses = BonusStack::new();
        bonuses.add_flat("Artifact Ring", 2);
        let input = DamageInput {
            base: 6,
            hero_level_bonus: 1,
            stat: Some((Ability::Dex, 3)),
            ..DamageInput::default()
        };
        assert_eq!(compute_damage(&input, &bonuses), compute_damage(&input, &bonuses));
    }

    #[test]
    fn static_sources_filtered_by_attack_type() {
        let attacker = hero()
            .with_skill(ActiveSkill::new("might", "Might").with_effect(SkillEffect::percent("melee_damage", 10)))
            .with_effect(
                ActiveEffect::new("Arcane Focus", EffectKind::Buff, 2)
                    .with_entry(EffectEntry::flat("spell_damage", 3)),
            )
            .with_artifact(ArtifactModifier::new("Ring", "damage", 1, false));
        let roster = vec![attacker.clone()];
        let config = BattleConfig::default();
        let melee = static_bonuses(&attacker, &roster, &config, AttackType::Melee);
        assert_eq!((melee.total_percent(), melee.total_flat()), (10, 1));
        let spell = static_bonuses(&attacker, &roster, &config, AttackType::Spell);
        assert_eq!((spell.total_percent(), spell.total_flat()), (0, 4));
    }

    #[test]
    fn ally_low_hp_passive_needs_a_wounded_ally() {
        let attacker = hero().with_passive(PassiveAbility::ally_low_hp("Protector", 20, None));
        let healthy = Participant::new(ParticipantId(2), "Friend", Side::Ally).with_hp(20);
        let config = BattleConfig::default();
        let roster = vec![attacker.clone(), healthy.clone()];
        assert!(static_bonuses(&attacker, &roster, &config, AttackType::Melee).is_empty());
        let roster = vec![attacker.clone(), healthy.with_current_hp(3)];
        let stack = static_bonuses(&attacker, &roster, &config, AttackType::Melee);
        assert_eq!(stack.lines(), vec!["Passive Protector: +20%".to_string()]);
    }
}
