//! Skill enhancements applied to a spell in progress.
//!
//! `beforeSpellCast` skills feed percent/flat damage and healing increases,
//! elemental riders, target redirection and upgraded follow-up spells.
//! Static skills, effects and artifacts tagged as healing bonuses feed the
//! healing stack directly.

use crate::scene::Scene;
use crate::state::{KnownSpell, Participant, ParticipantId, SpellEffect};
use crate::stats::{BonusStack, normalize_tag};
use crate::triggers::{Rider, TriggerFlags, TriggerOutput};

const HEALING_TAGS: [&str; 3] = ["healing_bonus", "heal_bonus", "healing"];

/// Enhancements collected for one cast.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Enhancements {
    pub damage: BonusStack,
    pub healing: BonusStack,
    pub riders: Vec<Rider>,
    pub redirect: bool,
    pub upgrade: bool,
    pub ignore_resistance: bool,
    pub min_damage: i32,
}

impl Enhancements {
    /// Enhancements raised by fired triggers plus static healing bonuses of
    /// the caster.
    pub fn collect(caster: &Participant, out: TriggerOutput) -> Self {
        let mut healing = static_healing(caster);
        healing.extend(out.healing);
        Self {
            redirect: out.flags.contains(TriggerFlags::REDIRECT),
            upgrade: out.flags.contains(TriggerFlags::UPGRADE),
            ignore_resistance: out.flags.contains(TriggerFlags::IGNORE_RESISTANCE),
            min_damage: out.min_damage,
            damage: out.damage,
            healing,
            riders: out.riders,
        }
    }
}

/// Healing bonuses that apply without a trigger.
pub fn static_healing(caster: &Participant) -> BonusStack {
    let mut stack = BonusStack::new();
    let is_healing = |tag: &str| HEALING_TAGS.contains(&normalize_tag(tag).as_str());

    for skill in caster.skills.iter().filter(|skill| skill.is_static()) {
        for effect in skill.effects.iter().filter(|effect| is_healing(&effect.stat)) {
            let label = format!("Skill {}", skill.name);
            if effect.is_percent() {
                stack.add_percent(label, effect.value.number());
            } else {
                stack.add_flat(label, effect.value.number());
            }
        }
    }
    for effect in &caster.effects {
        for entry in effect.effects.iter().filter(|entry| is_healing(&entry.stat)) {
            let label = format!("Effect {}", effect.name);
            if entry.is_percentage {
                stack.add_percent(label, entry.value);
            } else {
                stack.add_flat(label, entry.value);
            }
        }
    }
    for artifact in caster.artifacts.iter().filter(|artifact| is_healing(&artifact.stat)) {
        let label = format!("Artifact {}", artifact.name);
        if artifact.is_percentage {
            stack.add_percent(label, artifact.value);
        } else {
            stack.add_flat(label, artifact.value);
        }
    }
    stack
}

/// New target for a redirected single-target spell: the active opponent of
/// the caster with the lowest current HP, lowest id first on ties.
///
/// Healing spells redirect to the most wounded active ally instead.
pub fn redirect_target(scene: &Scene<'_>, caster: ParticipantId, spell: &KnownSpell) -> Option<ParticipantId> {
    let side = scene.get(caster)?.side();
    let friendly = matches!(spell.effect, SpellEffect::Heal { .. });
    scene
        .roster()
        .iter()
        .filter(|p| p.is_active() && (p.side() == side) == friendly)
        .min_by_key(|p| {
            if friendly {
                (i64::from(p.current_hp) - i64::from(p.max_hp), p.id)
            } else {
                (i64::from(p.current_hp), p.id)
            }
        })
        .map(|p| p.id)
}

/// Upgraded follow-up spell, if the caster knows it and it is not the same spell.
pub fn follow_up(caster: &Participant, spell: &KnownSpell) -> Option<KnownSpell> {
    let id = spell.upgrade.as_deref()?;
    if id == spell.id {
        return None;
    }
    caster.spellcasting.spell(id).cloned()
}
