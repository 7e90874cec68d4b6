//! Effect payload execution, keyed by stat tag.
//!
//! Tags are free-form data. Every family the engine understands is matched
//! here; anything else is logged verbatim and narrated, never rejected.

use tracing::debug;

use super::{HookContext, Rider, TriggerFlags, TriggerOutput};
use crate::combat::vitals;
use crate::config::BattleConfig;
use crate::dice::average_of;
use crate::formula::{FormulaVars, evaluate};
use crate::scene::Scene;
use crate::state::{
    ActionFlags, ActiveEffect, ActiveSkill, EffectEntry, EffectKind, EffectTarget, Hook,
    ParticipantId, SkillEffect, SkillEffectKind,
};
use crate::stats::{matches_attack_type, normalize_tag, saturating_i32, saturating_u32, signed};

/// Numeric value of an effect for `owner`.
///
/// Formulas are evaluated against the owner, dice use their average, flags
/// count as 1 and stacks multiply by the number of times the skill fired.
pub fn resolve_value(scene: &Scene<'_>, owner: ParticipantId, skill: &ActiveSkill, effect: &SkillEffect) -> i64 {
    let Some(participant) = scene.get(owner) else {
        return 0;
    };
    match &effect.kind {
        SkillEffectKind::Formula => {
            let vars = FormulaVars::of(participant);
            match effect.value.text() {
                Some(text) => evaluate(text, &vars),
                None => i64::from(effect.value.number()),
            }
        }
        SkillEffectKind::Dice => match effect.value.text() {
            Some(text) => average_of(text),
            None => i64::from(effect.value.number()),
        },
        SkillEffectKind::Flag | SkillEffectKind::Ignore => match effect.value.number() {
            0 => 1,
            value => i64::from(value),
        },
        SkillEffectKind::Stack => {
            i64::from(effect.value.number()) * i64::from(participant.usage(&skill.id).max(1))
        }
        _ => i64::from(effect.value.number()),
    }
}

/// Participants an effect lands on.
///
/// An explicit `target` wins. Otherwise negative values land on the
/// counterparts of the hook and everything else lands on the owner.
pub fn resolve_targets(scene: &Scene<'_>, ctx: &HookContext, effect: &SkillEffect, amount: i64) -> Vec<ParticipantId> {
    let Some(owner) = scene.get(ctx.owner) else {
        return Vec::new();
    };
    let side = owner.side();
    let active = |pred: &dyn Fn(&crate::state::Participant) -> bool| -> Vec<ParticipantId> {
        scene
            .roster()
            .iter()
            .filter(|p| p.is_active() && pred(p))
            .map(|p| p.id)
            .collect()
    };
    match effect.target {
        Some(EffectTarget::Owner) => vec![ctx.owner],
        Some(EffectTarget::Target) => ctx.counterparts.clone(),
        Some(EffectTarget::Allies) => active(&|p| p.side() == side && p.id != ctx.owner),
        Some(EffectTarget::Enemies) => active(&|p| p.side() != side),
        Some(EffectTarget::All) => active(&|_| true),
        None if amount < 0 && !ctx.counterparts.is_empty() => ctx.counterparts.clone(),
        None => vec![ctx.owner],
    }
}

/// Key under which per-effect trigger counts are stored.
fn effect_usage_key(skill: &ActiveSkill, effect: &SkillEffect) -> String {
    format!("{}#{}", skill.id, normalize_tag(&effect.stat))
}

fn duration_of(effect: &SkillEffect) -> u32 {
    effect
        .duration
        .unwrap_or(BattleConfig::DEFAULT_EFFECT_DURATION)
}

/// Executes every effect of a fired skill.
pub fn dispatch_skill(scene: &mut Scene<'_>, ctx: &HookContext, skill: &ActiveSkill, out: &mut TriggerOutput) {
    for effect in &skill.effects {
        dispatch_effect(scene, ctx, skill, effect, out);
    }
}

/// Executes one effect. Returns false if `max_triggers` blocked it.
pub fn dispatch_effect(
    scene: &mut Scene<'_>,
    ctx: &HookContext,
    skill: &ActiveSkill,
    effect: &SkillEffect,
    out: &mut TriggerOutput,
) -> bool {
    let key = effect_usage_key(skill, effect);
    if let Some(max) = effect.max_triggers {
        let used = scene.get(ctx.owner).map_or(0, |p| p.usage(&key));
        if used >= max {
            debug!(skill = %skill.id, stat = %effect.stat, used, max, "effect trigger cap reached");
            return false;
        }
    }

    let amount = resolve_value(scene, ctx.owner, skill, effect);
    let tag = normalize_tag(&effect.stat);
    let label = format!("Skill {}", skill.name);

    if effect.kind == SkillEffectKind::Ignore || tag == "ignore_resistance" {
        out.flags |= TriggerFlags::IGNORE_RESISTANCE;
    } else if effect.kind == SkillEffectKind::Min || tag == "min_damage" {
        out.min_damage = out.min_damage.max(saturating_i32(amount));
    } else {
        match tag.as_str() {
            "life_steal" | "lifesteal" => {
                out.life_steal_percent = out.life_steal_percent.saturating_add(saturating_i32(amount))
            },
            "heal" | "healing" => apply_heal(scene, ctx, skill, effect, amount),
            "healing_bonus" | "heal_bonus" => {
                if effect.is_percent() {
                    out.healing.add_percent(label, saturating_i32(amount));
                } else {
                    out.healing.add_flat(label, saturating_i32(amount));
                }
            }
            "dot" | "poison" | "bleed" | "burn" => apply_dot(scene, ctx, skill, effect, &tag, amount),
            "ac" | "ac_bonus" | "speed" | "initiative" | "morale" | "attack" | "attack_bonus" => {
                apply_stat(scene, ctx, skill, effect, &tag, amount)
            }
            "advantage" => raise_flag(scene, ctx, skill, effect, out, TriggerFlags::ADVANTAGE, "advantage"),
            "first_strike" => {
                out.flags |= TriggerFlags::FIRST_STRIKE;
                if ctx.hook == Hook::OnBattleStart {
                    let pinned = scene.config().pinned_initiative - 1;
                    if let Some(owner) = scene.get_mut(ctx.owner) {
                        owner.initiative = owner.initiative.max(pinned);
                    }
                }
            }
            "guaranteed_hit" | "auto_hit" => raise_flag(
                scene,
                ctx,
                skill,
                effect,
                out,
                TriggerFlags::GUARANTEED_HIT,
                "guaranteed_hit",
            ),
            "area" | "area_damage" | "area_cells" => out.flags |= TriggerFlags::AREA,
            "extra_action" => {
                if let Some(owner) = scene.get_mut(ctx.owner) {
                    owner.flags.remove(ActionFlags::ACTION_USED);
                }
                let name = scene.name_of(ctx.owner);
                scene.say(format!("{}: {} gains an extra action", skill.name, name));
            }
            "extra_turn" => {
                if let Some(owner) = scene.get_mut(ctx.owner) {
                    owner.flags.insert(ActionFlags::EXTRA_TURN);
                }
                let name = scene.name_of(ctx.owner);
                scene.say(format!("{}: {} will act again", skill.name, name));
            }
            "counter" | "counter_damage" => {
                let counter = ActiveEffect::new(&skill.name, EffectKind::Buff, duration_of(effect))
                    .with_entry(EffectEntry::percent("counter_damage", saturating_i32(amount)));
                scene.add_effect(ctx.owner, counter);
            }
            "survive_lethal" => out.flags |= TriggerFlags::SURVIVED,
            "redirect" | "redirect_target" | "spell_redirect" => out.flags |= TriggerFlags::REDIRECT,
            "upgrade" | "upgrade_spell" => out.flags |= TriggerFlags::UPGRADE,
            "elemental_rider" => push_rider(out, &label, effect, "elemental"),
            t if t.starts_with("rider_") => push_rider(out, &label, effect, &t["rider_".len()..]),
            t if t.starts_with("buff_") => {
                let stat = t["buff_".len()..].to_string();
                let buff = ActiveEffect::new(&skill.name, EffectKind::Buff, duration_of(effect))
                    .with_entry(entry(&stat, amount, effect.is_percent()));
                scene.add_effect(ctx.owner, buff);
                let name = scene.name_of(ctx.owner);
                scene.say(format!("{}: {} gains {} {}", skill.name, name, stat, signed(amount)));
            }
            t if t.contains("damage") => apply_damage_modifier(scene, ctx, skill, effect, out, t, amount),
            _ => {
                debug!(skill = %skill.id, stat = %effect.stat, kind = effect.kind.as_str(), "unhandled effect tag");
                scene.say(format!("{}: {} {}", skill.name, effect.stat, signed(amount)));
            }
        }
    }

    if effect.max_triggers.is_some() {
        if let Some(owner) = scene.get_mut(ctx.owner) {
            owner.record_usage(&key);
        }
    }
    true
}

fn entry(stat: &str, amount: i64, percent: bool) -> EffectEntry {
    if percent {
        EffectEntry::percent(stat, saturating_i32(amount))
    } else {
        EffectEntry::flat(stat, saturating_i32(amount))
    }
}

fn push_rider(out: &mut TriggerOutput, label: &str, effect: &SkillEffect, damage_type: &str) {
    let dice = match effect.value.text() {
        Some(text) => text.to_string(),
        None => effect.value.number().to_string(),
    };
    out.riders.push(Rider {
        label: label.to_string(),
        dice,
        damage_type: damage_type.to_string(),
    });
}

/// Sets `flag` for the resolution in progress; outside an attack the flag is
/// kept as a short effect so the next attack can read it.
fn raise_flag(
    scene: &mut Scene<'_>,
    ctx: &HookContext,
    skill: &ActiveSkill,
    effect: &SkillEffect,
    out: &mut TriggerOutput,
    flag: TriggerFlags,
    stat: &str,
) {
    out.flags |= flag;
    if ctx.attack_type.is_none() {
        let carried = ActiveEffect::new(&skill.name, EffectKind::Buff, duration_of(effect))
            .with_entry(EffectEntry::flat(stat, 1));
        scene.add_effect(ctx.owner, carried);
    }
}

fn apply_damage_modifier(
    scene: &mut Scene<'_>,
    ctx: &HookContext,
    skill: &ActiveSkill,
    effect: &SkillEffect,
    out: &mut TriggerOutput,
    tag: &str,
    amount: i64,
) {
    match ctx.attack_type {
        Some(attack_type) => {
            if matches_attack_type(tag, attack_type) {
                let label = format!("Skill {}", skill.name);
                if effect.is_percent() {
                    out.damage.add_percent(label, saturating_i32(amount));
                } else {
                    out.damage.add_flat(label, saturating_i32(amount));
                }
            }
        }
        None => {
            let buff = ActiveEffect::new(&skill.name, EffectKind::Buff, duration_of(effect))
                .with_entry(entry(tag, amount, effect.is_percent()));
            scene.add_effect(ctx.owner, buff);
        }
    }
}

fn apply_heal(scene: &mut Scene<'_>, ctx: &HookContext, skill: &ActiveSkill, effect: &SkillEffect, amount: i64) {
    let targets = match effect.target {
        Some(_) => resolve_targets(scene, ctx, effect, amount),
        None => vec![ctx.owner],
    };
    for id in targets {
        let Some(target) = scene.get_mut(id) else {
            continue;
        };
        let heal = if effect.is_percent() {
            i64::from(target.max_hp) * amount / 100
        } else {
            amount
        };
        let healed = vitals::heal(target, saturating_u32(heal));
        let name = target.name.clone();
        if healed > 0 {
            scene.say(format!("{}: {} recovers {} HP", skill.name, name, healed));
        }
    }
}

fn apply_dot(
    scene: &mut Scene<'_>,
    ctx: &HookContext,
    skill: &ActiveSkill,
    effect: &SkillEffect,
    tag: &str,
    amount: i64,
) {
    let targets = match effect.target {
        Some(_) => resolve_targets(scene, ctx, effect, amount),
        None => ctx.counterparts.clone(),
    };
    if targets.is_empty() {
        debug!(skill = %skill.id, "damage over time without a target");
        return;
    }
    let damage_type = if tag == "dot" { "poison" } else { tag };
    let duration = effect.duration.unwrap_or(BattleConfig::DEFAULT_DOT_DURATION);
    for id in targets {
        let dot = ActiveEffect::new(&skill.name, EffectKind::Debuff, duration)
            .with_dot(saturating_u32(amount), damage_type)
            .with_source(ctx.owner);
        if scene.add_effect(id, dot) {
            let name = scene.name_of(id);
            scene.say(format!(
                "{}: {} suffers {} {} per round for {} rounds",
                skill.name, name, amount, damage_type, duration
            ));
        }
    }
}

fn apply_stat(
    scene: &mut Scene<'_>,
    ctx: &HookContext,
    skill: &ActiveSkill,
    effect: &SkillEffect,
    tag: &str,
    amount: i64,
) {
    let stat = match tag {
        "ac" => "ac_bonus",
        "attack" => "attack_bonus",
        other => other,
    };
    let percent = effect.is_percent() || stat == "speed" && effect.kind != SkillEffectKind::Flat;
    let targets = resolve_targets(scene, ctx, effect, amount);
    for id in targets {
        if stat == "initiative" && ctx.hook == Hook::OnBattleStart {
            if let Some(target) = scene.get_mut(id) {
                target.initiative = target.initiative.saturating_add(saturating_i32(amount));
            }
        } else {
            let kind = if amount >= 0 {
                EffectKind::Buff
            } else {
                EffectKind::Debuff
            };
            let modifier = ActiveEffect::new(&skill.name, kind, duration_of(effect))
                .with_entry(entry(stat, amount, percent))
                .with_source(ctx.owner);
            scene.add_effect(id, modifier);
        }
        let name = scene.name_of(id);
        let unit = if percent { "%" } else { "" };
        scene.say(format!("{}: {} {} {}{}", skill.name, name, stat, signed(amount), unit));
    }
}
