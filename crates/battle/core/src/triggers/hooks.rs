//! Hook evaluation and the per-family entry points used by the pipelines.

use tracing::debug;

use super::condition::trigger_holds;
use super::dispatch::dispatch_skill;
use super::usage::check_usage;
use super::{HookContext, TriggerFlags, TriggerOutput};
use crate::scene::Scene;
use crate::state::{Hook, ParticipantId};
use crate::stats::AttackType;

/// Evaluates every skill of `ctx.owner` at `ctx.hook`.
///
/// A skill fires at most once per evaluation: the first listening trigger
/// whose condition holds decides, and its usage modifiers gate the skill.
pub fn run_hook(scene: &mut Scene<'_>, ctx: &HookContext) -> TriggerOutput {
    let mut out = TriggerOutput::default();
    let Some(owner) = scene.get(ctx.owner).cloned() else {
        return out;
    };

    for skill in &owner.skills {
        let Some(trigger) = skill.triggers.iter().find(|trigger| {
            trigger_holds(scene.roster(), &owner, trigger, &ctx.hook, scene.config())
        }) else {
            continue;
        };

        let current = match scene.get(ctx.owner) {
            Some(current) => current.clone(),
            None => break,
        };
        let gate = check_usage(&current, &skill.id, trigger.modifiers(), scene.cursor());
        if !gate.is_allowed() {
            continue;
        }

        if let Some(participant) = scene.get_mut(ctx.owner) {
            participant.record_usage(&skill.id);
        }
        debug!(owner = %ctx.owner, skill = %skill.id, hook = %ctx.hook, "skill fired");
        scene.say(format!("{} triggers {}", owner.name, skill.name));
        out.fired.push(skill.name.clone());
        dispatch_skill(scene, ctx, skill, &mut out);
    }
    out
}

/// `startRound`, `passive`, `lowHp` and `allyLowHp` hooks of the participant
/// starting its turn.
pub fn start_of_turn(scene: &mut Scene<'_>, owner: ParticipantId) -> TriggerOutput {
    let mut out = TriggerOutput::default();
    for hook in [Hook::StartRound, Hook::Passive, Hook::LowHp, Hook::AllyLowHp] {
        out.merge(run_hook(scene, &HookContext::new(hook, owner)));
    }
    out
}

/// `onBattleStart` hook, run once per participant before the first sort.
pub fn on_battle_start(scene: &mut Scene<'_>, owner: ParticipantId) -> TriggerOutput {
    run_hook(scene, &HookContext::new(Hook::OnBattleStart, owner))
}

/// `beforeAttack` for the attacker and `beforeEnemyAttack` for the target.
///
/// Returns the attacker's output; the target's skills act through the scene.
pub fn before_attack(
    scene: &mut Scene<'_>,
    attacker: ParticipantId,
    target: ParticipantId,
    attack_type: AttackType,
) -> TriggerOutput {
    let out = run_hook(
        scene,
        &HookContext::new(Hook::BeforeAttack, attacker)
            .against(target)
            .with_attack_type(attack_type),
    );
    run_hook(
        scene,
        &HookContext::new(Hook::BeforeEnemyAttack, target)
            .against(attacker)
            .with_attack_type(attack_type),
    );
    out
}

/// `afterAttack` for the attacker and `afterEnemyAttack` for a surviving target.
pub fn after_attack(
    scene: &mut Scene<'_>,
    attacker: ParticipantId,
    target: ParticipantId,
    attack_type: AttackType,
) -> TriggerOutput {
    let out = run_hook(
        scene,
        &HookContext::new(Hook::AfterAttack, attacker)
            .against(target)
            .with_attack_type(attack_type),
    );
    if scene.is_active(target) {
        run_hook(
            scene,
            &HookContext::new(Hook::AfterEnemyAttack, target)
                .against(attacker)
                .with_attack_type(attack_type),
        );
    }
    out
}

/// `onHit` for the attacker.
pub fn on_hit(
    scene: &mut Scene<'_>,
    attacker: ParticipantId,
    target: ParticipantId,
    attack_type: AttackType,
) -> TriggerOutput {
    run_hook(
        scene,
        &HookContext::new(Hook::OnHit, attacker)
            .against(target)
            .with_attack_type(attack_type),
    )
}

/// `onKill` for the participant that dropped `victim`.
pub fn on_kill(scene: &mut Scene<'_>, killer: ParticipantId, victim: ParticipantId) -> TriggerOutput {
    run_hook(scene, &HookContext::new(Hook::OnKill, killer).against(victim))
}

/// `surviveLethal` for a participant about to drop. True if a skill saved it.
pub fn survive_lethal(scene: &mut Scene<'_>, owner: ParticipantId, attacker: Option<ParticipantId>) -> bool {
    let mut ctx = HookContext::new(Hook::SurviveLethal, owner);
    if let Some(attacker) = attacker {
        ctx = ctx.against(attacker);
    }
    let out = run_hook(scene, &ctx);
    !out.fired.is_empty() || out.has(TriggerFlags::SURVIVED)
}

/// `beforeSpellCast` for the caster.
pub fn before_spell_cast(scene: &mut Scene<'_>, caster: ParticipantId, targets: &[ParticipantId]) -> TriggerOutput {
    run_hook(
        scene,
        &HookContext::new(Hook::BeforeSpellCast, caster)
            .against_all(targets)
            .with_attack_type(AttackType::Spell),
    )
}

/// `afterSpellCast` for the caster.
pub fn after_spell_cast(scene: &mut Scene<'_>, caster: ParticipantId, targets: &[ParticipantId]) -> TriggerOutput {
    run_hook(
        scene,
        &HookContext::new(Hook::AfterSpellCast, caster)
            .against_all(targets)
            .with_attack_type(AttackType::Spell),
    )
}
