//! Skills used as a bonus action.
//!
//! Bonus skills carry their own effect families (redirection, summons,
//! marks, morale swings, slot restoration, field damage, revive, cleanse).
//! Any other tag falls through to the generic dispatcher.

use tracing::debug;

use super::dispatch::{dispatch_effect, resolve_value};
use super::usage::{UsageGate, check_usage};
use super::{HookContext, TriggerFlags, TriggerOutput};
use crate::combat::{resistance, vitals};
use crate::config::BattleConfig;
use crate::env::OracleError;
use crate::ledger;
use crate::scene::Scene;
use crate::state::{
    ActionFlags, ActiveEffect, ActiveSkill, EffectEntry, EffectKind, Hook, LifeStatus,
    ParticipantId, SkillEffect, SkillTrigger,
};
use crate::stats::{DamageCategory, normalize_tag, saturating_i32, saturating_u32, signed};

/// Result of a bonus action request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BonusActionOutcome {
    pub success: bool,
    /// Short result text for the log entry.
    pub result: String,
    pub output: TriggerOutput,
}

impl BonusActionOutcome {
    fn failed(reason: &str) -> Self {
        Self {
            success: false,
            result: reason.to_string(),
            output: TriggerOutput::default(),
        }
    }
}

/// Uses `skill_id` of `owner` as a bonus action against `targets`.
///
/// Unknown skills, skills without a `bonusAction` trigger, a spent bonus
/// action and usage blocks resolve as unsuccessful outcomes without side
/// effects. So does an effect that finds nothing to act on (no one to
/// revive, no slot to restore, no summon template): the whole skill is
/// rolled back, usage and the bonus action included.
pub fn use_bonus_action(
    scene: &mut Scene<'_>,
    owner: ParticipantId,
    skill_id: &str,
    targets: &[ParticipantId],
) -> BonusActionOutcome {
    let Some(participant) = scene.get(owner).cloned() else {
        return BonusActionOutcome::failed("unknown participant");
    };
    if participant.flags.contains(ActionFlags::BONUS_ACTION_USED) {
        return BonusActionOutcome::failed("bonus action already used");
    }
    let Some(skill) = participant.skill(skill_id).cloned() else {
        return BonusActionOutcome::failed("unknown skill");
    };
    let Some(trigger) = skill.triggers.iter().find(|trigger| {
        matches!(trigger, SkillTrigger::Simple { trigger: Hook::BonusAction, .. })
    }) else {
        return BonusActionOutcome::failed("skill is not a bonus action");
    };

    match check_usage(&participant, &skill.id, trigger.modifiers(), scene.cursor()) {
        UsageGate::Allowed => {}
        UsageGate::OncePerBattle => return BonusActionOutcome::failed("already used this battle"),
        UsageGate::TwicePerBattle => return BonusActionOutcome::failed("already used twice this battle"),
        UsageGate::Chance => return BonusActionOutcome::failed("skill did not trigger"),
    }

    let checkpoint = scene.checkpoint();
    if let Some(participant) = scene.get_mut(owner) {
        participant.record_usage(&skill.id);
        participant.flags.insert(ActionFlags::BONUS_ACTION_USED);
    }
    scene.say(format!("{} uses {}", participant.name, skill.name));

    let ctx = HookContext::new(Hook::BonusAction, owner).against_all(targets);
    let mut outcome = BonusActionOutcome {
        success: true,
        result: skill.name.clone(),
        output: TriggerOutput::default(),
    };
    outcome.output.fired.push(skill.name.clone());

    for effect in &skill.effects {
        if let Err(reason) = apply_bonus_effect(scene, &ctx, &skill, effect, &mut outcome.output) {
            debug!(participant = %owner, skill = %skill.id, %reason, "bonus action rolled back");
            scene.rollback(checkpoint);
            scene.say(format!("{} fails: {reason}", skill.name));
            return BonusActionOutcome::failed(&reason);
        }
    }
    outcome
}

fn apply_bonus_effect(
    scene: &mut Scene<'_>,
    ctx: &HookContext,
    skill: &ActiveSkill,
    effect: &SkillEffect,
    out: &mut TriggerOutput,
) -> Result<(), String> {
    let amount = resolve_value(scene, ctx.owner, skill, effect);
    let duration = effect
        .duration
        .unwrap_or(BattleConfig::DEFAULT_EFFECT_DURATION);
    let tag = normalize_tag(&effect.stat);

    match tag.as_str() {
        "redirect_damage" => {
            for id in explicit_or(ctx, || Vec::new()) {
                let bond = ActiveEffect::new(&skill.name, EffectKind::Buff, duration)
                    .with_entry(EffectEntry::percent("redirect_damage", saturating_i32(amount)))
                    .with_source(ctx.owner);
                scene.add_effect(id, bond);
                let owner = scene.name_of(ctx.owner);
                let ward = scene.name_of(id);
                scene.say(format!("{owner} will take {amount}% of the damage dealt to {ward}"));
            }
        }
        "summon" | "summon_tier" => summon(scene, ctx, amount)?,
        "mark" | "mark_targets" => {
            for id in explicit_or(ctx, || Vec::new()) {
                let mark = ActiveEffect::new("Marked", EffectKind::Debuff, duration)
                    .with_entry(EffectEntry::flat("marked", saturating_i32(amount)))
                    .with_source(ctx.owner);
                scene.add_effect(id, mark);
                let name = scene.name_of(id);
                scene.say(format!("{name} is marked ({} to hit)", signed(amount)));
            }
        }
        "extra_cast" | "extra_casts" => {
            let casts = ActiveEffect::new(&skill.name, EffectKind::Buff, duration)
                .with_entry(EffectEntry::flat("extra_cast", saturating_i32(amount.max(1))));
            scene.add_effect(ctx.owner, casts);
        }
        "morale_self" => swing_morale(scene, &[ctx.owner], amount),
        "morale_ally" | "morale_allies" => {
            let allies = explicit_or(ctx, || side_ids(scene, ctx.owner, true));
            swing_morale(scene, &allies, amount);
        }
        "morale_enemy" | "morale_enemies" => {
            let enemies = explicit_or(ctx, || side_ids(scene, ctx.owner, false));
            swing_morale(scene, &enemies, -amount.abs());
        }
        "restore_spell_slot" | "spell_slot" => restore_slot(scene, ctx.owner, amount)?,
        "field_damage" => field_damage(scene, ctx, skill, amount, out),
        "revive" => {
            let mut revived = 0;
            for id in explicit_or(ctx, || Vec::new()) {
                let Some(target) = scene.get_mut(id) else {
                    continue;
                };
                if target.is_active() {
                    continue;
                }
                let hp = if effect.is_percent() {
                    i64::from(target.max_hp) * amount / 100
                } else {
                    amount
                };
                target.current_hp = saturating_u32(hp.max(1)).min(target.max_hp.max(1));
                target.status = LifeStatus::Active;
                let (name, hp) = (target.name.clone(), target.current_hp);
                revived += 1;
                scene.say(format!("{name} is revived with {hp} HP"));
            }
            if revived == 0 {
                return Err("no one to revive".to_string());
            }
        }
        "clear_negative" | "clear_negative_effects" | "cleanse" => {
            for id in explicit_or(ctx, || vec![ctx.owner]) {
                let Some(target) = scene.get_mut(id) else {
                    continue;
                };
                let removed = ledger::clear_negative_effects(target);
                let name = target.name.clone();
                if !removed.is_empty() {
                    scene.say(format!("{name} is cleansed of {}", removed.join(", ")));
                }
            }
        }
        _ => {
            dispatch_effect(scene, ctx, skill, effect, out);
        }
    }
    Ok(())
}

fn explicit_or(ctx: &HookContext, fallback: impl FnOnce() -> Vec<ParticipantId>) -> Vec<ParticipantId> {
    if ctx.counterparts.is_empty() {
        fallback()
    } else {
        ctx.counterparts.clone()
    }
}

/// Active participants on the owner's side (`same`) or the other side.
fn side_ids(scene: &Scene<'_>, owner: ParticipantId, same: bool) -> Vec<ParticipantId> {
    let Some(side) = scene.get(owner).map(|p| p.side()) else {
        return Vec::new();
    };
    scene
        .roster()
        .iter()
        .filter(|p| p.is_active() && p.id != owner && (p.side() == side) == same)
        .map(|p| p.id)
        .collect()
}

fn swing_morale(scene: &mut Scene<'_>, ids: &[ParticipantId], delta: i64) {
    for &id in ids {
        let Some(target) = scene.get_mut(id) else {
            continue;
        };
        target.set_morale(i32::from(target.morale).saturating_add(saturating_i32(delta)));
        let (name, morale) = (target.name.clone(), target.morale);
        scene.say(format!("{name}'s morale is now {morale}"));
    }
}

fn summon(scene: &mut Scene<'_>, ctx: &HookContext, tier: i64) -> Result<(), String> {
    let tier = saturating_u32(tier);
    let summons = scene.env().summons().map_err(|err| err.to_string())?;
    let template = summons
        .template(tier)
        .ok_or_else(|| OracleError::SummonTierNotFound(tier).to_string())?;
    let Some(side) = scene.get(ctx.owner).map(|p| p.side()) else {
        return Err("unknown participant".to_string());
    };
    let instance = scene
        .roster()
        .iter()
        .filter(|p| p.identity.source_id == template.identity.source_id)
        .count() as u32
        + 1;
    let spawned = template.spawn(template.id, side, Some(instance));
    let name = spawned.name.clone();
    let id = scene.summon(spawned);
    debug!(summon = %id, tier, "summon queued");
    scene.say(format!("{name} is summoned and joins next round"));
    Ok(())
}

fn restore_slot(scene: &mut Scene<'_>, owner: ParticipantId, level: i64) -> Result<(), String> {
    let Some(caster) = scene.get_mut(owner) else {
        return Err("unknown participant".to_string());
    };
    let level = if (1..=i64::from(BattleConfig::MAX_SPELL_LEVEL)).contains(&level) {
        Some(level as u8)
    } else {
        caster
            .spellcasting
            .slots
            .iter()
            .find(|(_, pool)| pool.current < pool.max)
            .map(|(level, _)| *level)
    };
    match level {
        Some(level) if caster.spellcasting.restore_slot(level) => {
            let name = caster.name.clone();
            scene.say(format!("{name} recovers a level {level} spell slot"));
            Ok(())
        }
        _ => Err("no spell slot to restore".to_string()),
    }
}

fn field_damage(scene: &mut Scene<'_>, ctx: &HookContext, skill: &ActiveSkill, amount: i64, out: &mut TriggerOutput) {
    let targets = explicit_or(ctx, || side_ids(scene, ctx.owner, false));
    let ignore = out.has(TriggerFlags::IGNORE_RESISTANCE);
    for id in targets {
        let Some(target) = scene.get(id) else {
            continue;
        };
        if !target.is_active() {
            continue;
        }
        let resisted = resistance::resist(amount.max(0), target, DamageCategory::Spell, ignore);
        let name = target.name.clone();
        let wound = vitals::inflict(scene, Some(ctx.owner), id, saturating_u32(resisted.final_damage));
        scene.say(format!("{}: {} takes {} damage", skill.name, name, wound.dealt));
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{BattleEnv, FixedRng};
    use crate::state::{Participant, Side, TriggerModifiers};

    const CLERIC: ParticipantId = ParticipantId(1);
    const SQUIRE: ParticipantId = ParticipantId(2);
    const BANDIT: ParticipantId = ParticipantId(3);

    fn bonus_skill(id: &str, effects: Vec<SkillEffect>) -> ActiveSkill {
        let mut skill = ActiveSkill::new(id, id).with_trigger(
            SkillTrigger::simple(Hook::BonusAction).with_modifiers(TriggerModifiers::once()),
        );
        skill.effects = effects;
        skill
    }

    fn roster(skill: ActiveSkill, squire_down: bool) -> Vec<Participant> {
        let mut squire = Participant::new(SQUIRE, "Squire", Side::Ally).with_hp(20);
        if squire_down {
            squire.current_hp = 0;
            squire.status = LifeStatus::Unconscious;
        }
        vec![
            Participant::new(CLERIC, "Cleric", Side::Ally).with_hp(20).with_skill(skill),
            squire,
            Participant::new(BANDIT, "Bandit", Side::Enemy).with_hp(20),
        ]
    }

    fn run(roster: &[Participant], skill_id: &str, targets: &[ParticipantId]) -> (BonusActionOutcome, Vec<Participant>, Vec<String>) {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut scene = Scene::new(roster, env, 1, 0, CLERIC, 4);
        let outcome = use_bonus_action(&mut scene, CLERIC, skill_id, targets);
        let after = scene.roster().to_vec();
        let narration = scene.into_parts().narration;
        (outcome, after, narration)
    }

    #[test]
    fn revive_brings_back_a_downed_ally() {
        let skill = bonus_skill("revive", vec![SkillEffect::flat("revive", 5)]);
        let (outcome, after, _) = run(&roster(skill, true), "revive", &[SQUIRE]);
        assert!(outcome.success);
        assert_eq!((after[1].current_hp, after[1].status), (5, LifeStatus::Active));
        assert_eq!(after[0].usage("revive"), 1);
        assert!(after[0].flags.contains(ActionFlags::BONUS_ACTION_USED));
    }

    #[test]
    fn nothing_to_revive_keeps_the_charge() {
        let skill = bonus_skill("revive", vec![SkillEffect::flat("revive", 5)]);
        let (outcome, after, narration) = run(&roster(skill, false), "revive", &[SQUIRE]);
        assert!(!outcome.success);
        assert_eq!(outcome.result, "no one to revive");
        assert_eq!(after[0].usage("revive"), 0);
        assert!(!after[0].flags.contains(ActionFlags::BONUS_ACTION_USED));
        assert_eq!(narration, vec!["revive fails: no one to revive".to_string()]);
    }

    #[test]
    fn failing_effect_undoes_earlier_effects() {
        let skill = bonus_skill(
            "hunter",
            vec![
                SkillEffect::flat("mark", 2),
                SkillEffect::flat("restore_spell_slot", 1),
            ],
        );
        let (outcome, after, _) = run(&roster(skill, false), "hunter", &[BANDIT]);
        assert_eq!(outcome.result, "no spell slot to restore");
        assert!(!after[2].has_effect("Marked"));
        assert_eq!(after[0].usage("hunter"), 0);
    }

    #[test]
    fn summon_without_a_catalog_fails_cleanly() {
        let skill = bonus_skill("call", vec![SkillEffect::flat("summon", 1)]);
        let (outcome, after, _) = run(&roster(skill, false), "call", &[]);
        assert!(!outcome.success);
        assert_eq!(outcome.result, OracleError::SummonsNotAvailable.to_string());
        assert_eq!(after[0].usage("call"), 0);
    }

    #[test]
    fn once_per_battle_blocks_the_second_use() {
        let skill = bonus_skill("revive", vec![SkillEffect::flat("revive", 5)]);
        let mut cleric_used = roster(skill, true);
        cleric_used[0].record_usage("revive");
        let (outcome, after, _) = run(&cleric_used, "revive", &[SQUIRE]);
        assert_eq!(outcome.result, "already used this battle");
        assert_eq!(after[1].current_hp, 0);
    }
}
