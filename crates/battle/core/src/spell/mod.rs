//! Spell resolution.
//!
//! 1. look up the spell, resolve its targets
//! 2. consume a slot at the spell level (cantrips are free)
//! 3. `beforeSpellCast` hooks collect [`enhance::Enhancements`]
//! 4. per target: saving throw or attack roll, then damage, healing or a
//!    condition
//! 5. upgraded follow-up spell, then `afterSpellCast` hooks
pub mod enhance;

use std::collections::BTreeMap;

use tracing::debug;

use crate::combat::damage::{DamageInput, compute_damage, static_bonuses};
use crate::combat::{resist, vitals};
use crate::dice::{DiceExpr, average_of};
use crate::scene::Scene;
use crate::state::{
    ActionDetails, ActiveEffect, CheckOutcome, EffectEntry, KnownSpell, Participant, ParticipantId,
    SaveEffect, SpellCheck, SpellDetails, SpellEffect, SpellTargetOutcome, SpellTargeting,
};
use crate::stats::{AttackType, DamageCategory, bonus_attack, effective_ac, normalize_tag, saturating_u32};
use crate::triggers;

pub use enhance::Enhancements;

/// Caller-supplied rolls for one cast.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpellRolls {
    /// Effect dice faces, shared by every target.
    pub amount: Vec<u32>,
    /// d20 per target: the target's saving throw, or the caster's attack roll.
    /// Missing entries count as 0.
    pub checks: BTreeMap<ParticipantId, u32>,
    /// Faces of the upgraded follow-up spell, if one is cast.
    pub follow_up: Vec<u32>,
}

impl SpellRolls {
    pub fn check(&self, target: ParticipantId) -> u32 {
        self.checks.get(&target).copied().unwrap_or(0)
    }
}

/// Everything the engine needs to build the log entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpellResolution {
    pub details: ActionDetails,
    pub targets: Vec<ParticipantId>,
    pub result: String,
    pub success: bool,
}

impl SpellResolution {
    fn failed(reason: &str) -> Self {
        Self {
            result: reason.to_string(),
            ..Self::default()
        }
    }
}

/// Consumes one `extra_cast` charge of `caster`. Returns false without one.
pub fn consume_extra_cast(caster: &mut Participant) -> bool {
    for effect in caster.effects.iter_mut() {
        if let Some(entry) = effect
            .effects
            .iter_mut()
            .find(|entry| normalize_tag(&entry.stat) == "extra_cast" && entry.value > 0)
        {
            entry.value -= 1;
            return true;
        }
    }
    false
}

/// True if `caster` holds an unused `extra_cast` charge.
pub fn has_extra_cast(caster: &Participant) -> bool {
    caster
        .effects
        .iter()
        .flat_map(|effect| effect.effects.iter())
        .any(|entry| normalize_tag(&entry.stat) == "extra_cast" && entry.value > 0)
}

/// Participants a spell lands on.
pub fn resolve_targets(scene: &Scene<'_>, caster: ParticipantId, spell: &KnownSpell, explicit: &[ParticipantId]) -> Vec<ParticipantId> {
    let Some(side) = scene.get(caster).map(Participant::side) else {
        return Vec::new();
    };
    let active = |pred: &dyn Fn(&Participant) -> bool| -> Vec<ParticipantId> {
        scene
            .roster()
            .iter()
            .filter(|p| p.is_active() && pred(p))
            .map(|p| p.id)
            .collect()
    };
    match spell.targeting {
        SpellTargeting::Single => explicit
            .iter()
            .copied()
            .find(|id| scene.is_active(*id))
            .into_iter()
            .collect(),
        SpellTargeting::Area => {
            let mut ids: Vec<ParticipantId> =
                explicit.iter().copied().filter(|id| scene.is_active(*id)).collect();
            ids.dedup();
            ids
        }
        SpellTargeting::Enemies => active(&|p| p.side() != side),
        SpellTargeting::Allies => active(&|p| p.side() == side),
        SpellTargeting::All => active(&|_| true),
    }
}

/// Casts `spell_id` of `caster`.
///
/// Unknown spells, missing slots and spells without a valid target resolve
/// as unsuccessful outcomes without consuming anything.
pub fn resolve_spell(
    scene: &mut Scene<'_>,
    caster_id: ParticipantId,
    spell_id: &str,
    explicit: &[ParticipantId],
    rolls: &SpellRolls,
) -> SpellResolution {
    let Some(caster) = scene.get(caster_id).cloned() else {
        return SpellResolution::failed("unknown caster");
    };
    let Some(spell) = caster.spellcasting.spell(spell_id).cloned() else {
        return SpellResolution::failed("unknown spell");
    };
    if spell.level > 0 && caster.spellcasting.remaining(spell.level) == 0 {
        return SpellResolution::failed("no spell slots");
    }
    let mut targets = resolve_targets(scene, caster_id, &spell, explicit);
    if targets.is_empty() {
        return SpellResolution::failed("no valid target");
    }

    let slot_consumed = spell.level > 0
        && scene
            .get_mut(caster_id)
            .is_some_and(|caster| caster.spellcasting.consume_slot(spell.level));
    scene.say(format!("{} casts {}", caster.name, spell.name));

    let out = triggers::before_spell_cast(scene, caster_id, &targets);
    let Some(caster) = scene.get(caster_id).cloned() else {
        return SpellResolution::failed("unknown caster");
    };
    let enhancements = Enhancements::collect(&caster, out);

    if enhancements.redirect && spell.targeting == SpellTargeting::Single {
        if let Some(redirected) = enhance::redirect_target(scene, caster_id, &spell) {
            if targets.first() != Some(&redirected) {
                let name = scene.name_of(redirected);
                scene.say(format!("{} is redirected to {name}", spell.name));
                targets = vec![redirected];
            }
        }
    }

    let mut details = ActionDetails::default();
    let mut outcomes = Vec::new();
    cast_on(
        scene,
        &caster,
        &spell,
        &targets,
        &rolls.amount,
        rolls,
        &enhancements,
        &mut outcomes,
        &mut details.breakdown,
    );

    let mut follow_up = None;
    if enhancements.upgrade {
        if let Some(upgraded) = enhance::follow_up(&caster, &spell) {
            let next_targets = resolve_targets(scene, caster_id, &upgraded, &targets);
            if !next_targets.is_empty() {
                scene.say(format!("{} surges into {}", spell.name, upgraded.name));
                cast_on(
                    scene,
                    &caster,
                    &upgraded,
                    &next_targets,
                    &rolls.follow_up,
                    rolls,
                    &enhancements,
                    &mut outcomes,
                    &mut details.breakdown,
                );
                follow_up = Some(upgraded.id.clone());
            }
        }
    }

    triggers::after_spell_cast(scene, caster_id, &targets);

    details.spell = Some(SpellDetails {
        spell_id: spell.id.clone(),
        level: spell.level,
        slot_consumed,
        targets: outcomes,
        follow_up,
    });
    SpellResolution {
        details,
        targets,
        result: spell.name.clone(),
        success: true,
    }
}

#[allow(clippy::too_many_arguments)]
fn cast_on(
    scene: &mut Scene<'_>,
    caster: &Participant,
    spell: &KnownSpell,
    targets: &[ParticipantId],
    faces: &[u32],
    rolls: &SpellRolls,
    enhancements: &Enhancements,
    outcomes: &mut Vec<SpellTargetOutcome>,
    breakdown: &mut Vec<String>,
) {
    let ability = caster.spellcasting.ability;
    let modifier = spell.add_modifier.then(|| (ability, caster.modifier(ability)));

    match &spell.effect {
        SpellEffect::Damage { dice, damage_type } => {
            let input = DamageInput {
                base: DiceExpr::parse(dice).total(faces),
                stat: modifier,
                ..DamageInput::default()
            };
            let mut bonuses = static_bonuses(caster, scene.roster(), scene.config(), AttackType::Spell);
            bonuses.extend(enhancements.damage.clone());
            let roll = compute_damage(&input, &bonuses);
            breakdown.extend(roll.breakdown.iter().cloned());
            let total = roll.total.max(i64::from(enhancements.min_damage));

            for &id in targets {
                let check = run_check(scene, caster, spell, id, rolls);
                let amount = match check {
                    CheckOutcome::SaveNegated | CheckOutcome::Missed => 0,
                    CheckOutcome::SaveHalved => total / 2,
                    _ => total,
                };
                let mut dealt = 0;
                if amount > 0 {
                    if let Some(target) = scene.get(id).cloned() {
                        let resisted = resist(amount, &target, DamageCategory::Spell, enhancements.ignore_resistance);
                        let line = resisted.line();
                        if !line.is_empty() {
                            breakdown.push(format!("{}: {line}", target.name));
                        }
                        dealt += vitals::inflict(scene, Some(caster.id), id, saturating_u32(resisted.final_damage)).dealt;
                        for rider in &enhancements.riders {
                            let Some(current) = scene.get(id).cloned() else {
                                continue;
                            };
                            let resisted = resist(
                                average_of(&rider.dice),
                                &current,
                                DamageCategory::of_damage_type(&rider.damage_type),
                                enhancements.ignore_resistance,
                            );
                            if resisted.final_damage > 0 {
                                let wound = vitals::inflict(scene, Some(caster.id), id, saturating_u32(resisted.final_damage));
                                dealt += wound.dealt;
                                breakdown.push(format!("{}: +{} {}", rider.label, wound.dealt, rider.damage_type));
                            }
                        }
                    }
                }
                let name = scene.name_of(id);
                scene.say(format!("{} deals {dealt} {damage_type} damage to {name} ({check})", spell.name));
                outcomes.push(SpellTargetOutcome {
                    target: id,
                    check,
                    amount: dealt,
                });
            }
        }
        SpellEffect::Heal { dice } => {
            let base = DiceExpr::parse(dice).total(faces);
            let stat_mod = modifier.map_or(0, |(_, m)| i64::from(m));
            let applied = enhancements.healing.apply((base + stat_mod).max(0));
            breakdown.push(format!("Base healing: {base}"));
            if let Some((ability, m)) = modifier {
                if m != 0 {
                    breakdown.push(format!("{} modifier: {}", ability.label(), crate::stats::signed(i64::from(m))));
                }
            }
            breakdown.extend(enhancements.healing.lines());
            breakdown.push(format!("Total healing: {}", applied.total));

            for &id in targets {
                let check = run_check(scene, caster, spell, id, rolls);
                let amount = match check {
                    CheckOutcome::SaveNegated | CheckOutcome::Missed => 0,
                    CheckOutcome::SaveHalved => applied.total / 2,
                    _ => applied.total,
                };
                let healed = match scene.get_mut(id) {
                    Some(target) => vitals::heal(target, saturating_u32(amount)),
                    None => 0,
                };
                let name = scene.name_of(id);
                scene.say(format!("{} restores {healed} HP to {name}", spell.name));
                outcomes.push(SpellTargetOutcome {
                    target: id,
                    check,
                    amount: healed,
                });
            }
        }
        SpellEffect::Condition {
            name,
            kind,
            duration,
            entries,
            dot,
        } => {
            for &id in targets {
                let check = run_check(scene, caster, spell, id, rolls);
                let lands = !matches!(check, CheckOutcome::SaveNegated | CheckOutcome::Missed);
                if lands {
                    let mut effect = ActiveEffect::new(name, *kind, *duration).with_source(caster.id);
                    let halved = check == CheckOutcome::SaveHalved;
                    for entry in entries {
                        let value = if halved { entry.value / 2 } else { entry.value };
                        effect = effect.with_entry(EffectEntry { value, ..entry.clone() });
                    }
                    if let Some(dot) = dot {
                        let per_round = if halved { dot.damage_per_round / 2 } else { dot.damage_per_round };
                        effect = effect.with_dot(per_round, &dot.damage_type);
                    }
                    scene.add_effect(id, effect);
                    let target = scene.name_of(id);
                    scene.say(format!("{target} is affected by {name} for {duration} rounds"));
                } else {
                    let target = scene.name_of(id);
                    scene.say(format!("{target} resists {name}"));
                }
                outcomes.push(SpellTargetOutcome {
                    target: id,
                    check,
                    amount: 0,
                });
            }
        }
    }
}

/// Saving throw or attack roll of one target.
fn run_check(scene: &Scene<'_>, caster: &Participant, spell: &KnownSpell, target: ParticipantId, rolls: &SpellRolls) -> CheckOutcome {
    let Some(defender) = scene.get(target) else {
        return CheckOutcome::Missed;
    };
    let d20 = rolls.check(target);
    let outcome = match spell.check {
        SpellCheck::Automatic => CheckOutcome::Automatic,
        SpellCheck::Save { ability, on_success } => {
            let total = d20 as i32 + defender.modifier(ability);
            match (total >= caster.spellcasting.save_dc, on_success) {
                (false, _) => CheckOutcome::SaveFailed,
                (true, SaveEffect::Half) => CheckOutcome::SaveHalved,
                (true, SaveEffect::Negate) => CheckOutcome::SaveNegated,
            }
        }
        SpellCheck::AttackRoll => {
            let total = d20 as i32 + caster.spellcasting.attack_bonus + bonus_attack(caster);
            match d20 {
                20 => CheckOutcome::Hit,
                0 | 1 => CheckOutcome::Missed,
                _ if total >= effective_ac(defender) => CheckOutcome::Hit,
                _ => CheckOutcome::Missed,
            }
        }
    };
    debug!(spell = %spell.id, defender = %target, d20, %outcome, "spell check");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::env::{BattleEnv, FixedRng};
    use crate::state::{
        Ability, AbilityScores, ActiveSkill, EffectKind, Hook, Side, SkillEffect, SkillTrigger,
        SlotPool, Spellcasting,
    };
    use crate::stats::effective_speed;

    fn firebolt() -> KnownSpell {
        KnownSpell::new(
            "firebolt",
            "Firebolt",
            1,
            SpellTargeting::Single,
            SpellEffect::Damage {
                dice: "2d6".to_string(),
                damage_type: "fire".to_string(),
            },
        )
    }

    fn mage(spells: Vec<KnownSpell>, slots: u32) -> Participant {
        let mut book = Spellcasting {
            known: spells,
            save_dc: 13,
            attack_bonus: 5,
            ..Spellcasting::default()
        };
        book.slots.insert(1, SlotPool::full(slots));
        Participant::new(ParticipantId(1), "Mage", Side::Ally)
            .with_hp(20)
            .with_abilities(AbilityScores::new(10, 10, 10, 16, 10, 10))
            .with_spellcasting(book)
    }

    fn foes() -> Vec<Participant> {
        vec![
            Participant::new(ParticipantId(2), "Goblin", Side::Enemy).with_hp(20),
            Participant::new(ParticipantId(3), "Wolf", Side::Enemy)
                .with_hp(6)
                .with_abilities(AbilityScores::new(10, 14, 10, 10, 10, 10)),
        ]
    }

    fn cast(roster: &[Participant], spell: &str, targets: &[u32], rolls: SpellRolls) -> (SpellResolution, Vec<Participant>) {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut scene = Scene::new(roster, env, 1, 0, ParticipantId(1), 4);
        let targets: Vec<ParticipantId> = targets.iter().map(|&id| ParticipantId(id)).collect();
        let resolution = resolve_spell(&mut scene, ParticipantId(1), spell, &targets, &rolls);
        (resolution, scene.roster().to_vec())
    }

    fn faces(amount: Vec<u32>) -> SpellRolls {
        SpellRolls {
            amount,
            ..SpellRolls::default()
        }
    }

    #[test]
    fn slot_is_consumed_and_damage_lands() {
        let mut roster = vec![mage(vec![firebolt().with_modifier()], 1)];
        roster.extend(foes());
        let (resolution, roster) = cast(&roster, "firebolt", &[2], faces(vec![3, 4]));
        assert!(resolution.success);
        let spell = resolution.details.spell.clone();
        assert_eq!(spell.as_ref().map(|s| s.slot_consumed), Some(true));
        // 7 + INT 3
        assert_eq!(roster[1].current_hp, 10);
        assert_eq!(roster[0].spellcasting.remaining(1), 0);
    }

    #[test]
    fn no_slots_is_a_distinct_failure() {
        let mut roster = vec![mage(vec![firebolt()], 0)];
        roster.extend(foes());
        let (resolution, after) = cast(&roster, "firebolt", &[2], faces(vec![3, 4]));
        assert!(!resolution.success);
        assert_eq!(resolution.result, "no spell slots");
        assert_eq!(after, roster);
        let (unknown, _) = cast(&roster, "meteor", &[2], SpellRolls::default());
        assert_eq!(unknown.result, "unknown spell");
    }

    #[test]
    fn saves_halve_or_negate() {
        let burst = KnownSpell::new(
            "burst",
            "Burst",
            0,
            SpellTargeting::Enemies,
            SpellEffect::Damage {
                dice: "2d6".to_string(),
                damage_type: "thunder".to_string(),
            },
        )
        .with_check(SpellCheck::Save {
            ability: Ability::Dex,
            on_success: SaveEffect::Half,
        });
        let mut roster = vec![mage(vec![burst], 0)];
        roster.extend(foes());
        let mut rolls = faces(vec![5, 5]);
        rolls.checks.insert(ParticipantId(2), 4);
        rolls.checks.insert(ParticipantId(3), 11);
        let (resolution, after) = cast(&roster, "burst", &[], rolls);
        let checks: Vec<CheckOutcome> = resolution
            .details
            .spell
            .map(|s| s.targets.iter().map(|t| t.check).collect())
            .unwrap_or_default();
        assert_eq!(checks, vec![CheckOutcome::SaveFailed, CheckOutcome::SaveHalved]);
        assert_eq!(after[1].current_hp, 10);
        assert_eq!(after[2].current_hp, 1);
    }

    #[test]
    fn condition_spell_applies_effect() {
        let slow = KnownSpell::new(
            "slow",
            "Slow",
            0,
            SpellTargeting::Single,
            SpellEffect::Condition {
                name: "Slowed".to_string(),
                kind: EffectKind::Condition,
                duration: 2,
                entries: vec![EffectEntry::percent("speed", -50)],
                dot: None,
            },
        )
        .with_check(SpellCheck::AttackRoll);
        let mut roster = vec![mage(vec![slow], 0)];
        roster.extend(foes());
        let mut rolls = SpellRolls::default();
        rolls.checks.insert(ParticipantId(2), 6);
        let (_, after) = cast(&roster, "slow", &[2], rolls);
        assert_eq!(effective_speed(&after[1]), 15);
        let (_, missed) = cast(&roster, "slow", &[2], SpellRolls::default());
        assert!(missed[1].effects.is_empty());
    }

    #[test]
    fn redirect_and_upgrade_enhancements() {
        let finisher = ActiveSkill::new("hunt", "Hunter's Focus")
            .with_effect(SkillEffect::flag("redirect_target"))
            .with_effect(SkillEffect::flag("upgrade_spell"))
            .with_trigger(SkillTrigger::simple(Hook::BeforeSpellCast));
        let nova = KnownSpell::new(
            "nova",
            "Nova",
            3,
            SpellTargeting::Enemies,
            SpellEffect::Damage {
                dice: "1d4".to_string(),
                damage_type: "radiant".to_string(),
            },
        );
        let mut roster = vec![
            mage(vec![firebolt().with_upgrade("nova"), nova], 2).with_skill(finisher),
        ];
        roster.extend(foes());
        let rolls = SpellRolls {
            amount: vec![1, 1],
            follow_up: vec![2],
            ..SpellRolls::default()
        };
        let (resolution, after) = cast(&roster, "firebolt", &[2], rolls);
        assert_eq!(resolution.targets, vec![ParticipantId(3)]);
        let spell = resolution.details.spell.clone();
        assert_eq!(spell.and_then(|s| s.follow_up), Some("nova".to_string()));
        // follow-up is free: only the firebolt slot is gone
        assert_eq!(after[0].spellcasting.remaining(1), 1);
        assert_eq!(after[1].current_hp, 18);
        assert_eq!(after[2].current_hp, 2);
    }

    #[test]
    fn extra_cast_charges_are_consumed() {
        let mut caster = mage(Vec::new(), 0).with_effect(
            ActiveEffect::new("Quickened", EffectKind::Buff, 1).with_entry(EffectEntry::flat("extra_cast", 1)),
        );
        assert!(has_extra_cast(&caster));
        assert!(consume_extra_cast(&mut caster));
        assert!(!consume_extra_cast(&mut caster));
    }
}
