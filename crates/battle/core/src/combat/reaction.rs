//! Counter-attacks.
//!
//! A target reacts at most once per round, and only while it carries a
//! `counter_damage` effect, is active, and the attack did not suppress
//! reactions.

use tracing::debug;

use super::vitals;
use crate::dice::DiceExpr;
use crate::scene::Scene;
use crate::state::{ActionFlags, Participant, ParticipantId, ReactionDetails};
use crate::stats::max_percent;

/// Why a counter did not happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NoReaction {
    Inactive,
    NoCounterEffect,
    ReactionUsed,
    Suppressed,
    NoWeapon,
}

/// Counter bonus percent of `participant`, or `None` without a counter effect.
///
/// A `counter_damage` entry of 0 uses `default_percent`.
pub fn counter_percent(participant: &Participant, default_percent: u32) -> Option<u32> {
    let value = max_percent(participant, "counter_damage")?;
    if value <= 0 {
        Some(default_percent)
    } else {
        Some(value as u32)
    }
}

/// `floor(average(dice) × (1 + percent/100))`.
pub fn counter_damage(dice: &str, percent: u32) -> u32 {
    let average = DiceExpr::parse(dice).average();
    (average * (1.0 + f64::from(percent) / 100.0)).floor().max(0.0) as u32
}

/// Lets `reactor` counter `attacker` with its first weapon.
pub fn try_counter(
    scene: &mut Scene<'_>,
    reactor: ParticipantId,
    attacker: ParticipantId,
    suppressed: bool,
) -> Result<ReactionDetails, NoReaction> {
    let default_percent = scene.config().counter_bonus_percent;
    let Some(participant) = scene.get(reactor) else {
        return Err(NoReaction::Inactive);
    };
    if !participant.is_active() || !scene.is_active(attacker) {
        return Err(NoReaction::Inactive);
    }
    let percent = counter_percent(participant, default_percent).ok_or(NoReaction::NoCounterEffect)?;
    if participant.flags.contains(ActionFlags::REACTION_USED) {
        return Err(NoReaction::ReactionUsed);
    }
    if suppressed {
        return Err(NoReaction::Suppressed);
    }
    let weapon = participant.attacks.first().ok_or(NoReaction::NoWeapon)?.clone();
    let name = participant.name.clone();

    let damage = counter_damage(&weapon.damage_dice, percent);
    if let Some(participant) = scene.get_mut(reactor) {
        participant.flags.insert(ActionFlags::REACTION_USED);
    }
    let wound = vitals::inflict(scene, Some(reactor), attacker, damage);
    debug!(reactor = %reactor, attacker = %attacker, damage, "counter-attack");
    let victim = scene.name_of(attacker);
    scene.say(format!(
        "{name} counters with {} for {} damage to {victim}",
        weapon.name, wound.dealt
    ));
    Ok(ReactionDetails {
        actor: reactor,
        target: attacker,
        weapon: weapon.name,
        damage: wound.dealt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::env::{BattleEnv, FixedRng};
    use crate::state::{ActiveEffect, Attack, EffectEntry, EffectKind, Side};
    use crate::stats::AttackType;

    fn roster(counter: Option<i32>) -> Vec<Participant> {
        let mut guard = Participant::new(ParticipantId(2), "Guard", Side::Enemy)
            .with_hp(20)
            .with_attack(Attack::new("Spear", AttackType::Melee, "1d8"));
        if let Some(percent) = counter {
            guard = guard.with_effect(
                ActiveEffect::new("Riposte", EffectKind::Buff, 2)
                    .with_entry(EffectEntry::percent("counter_damage", percent)),
            );
        }
        vec![
            Participant::new(ParticipantId(1), "Hero", Side::Ally).with_hp(30),
            guard,
        ]
    }

    fn counter(roster: &[Participant], suppressed: bool) -> Result<ReactionDetails, NoReaction> {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut scene = Scene::new(roster, env, 1, 0, ParticipantId(1), 3);
        try_counter(&mut scene, ParticipantId(2), ParticipantId(1), suppressed)
    }

    #[test]
    fn default_multiplier_applies() {
        // 1d8 averages 4.5; 4.5 * 1.15 = 5.175
        assert_eq!(counter_damage("1d8", 15), 5);
        let details = counter(&roster(Some(0)), false);
        assert_eq!(details.map(|d| d.damage), Ok(5));
    }

    #[test]
    fn gating() {
        assert_eq!(counter(&roster(None), false), Err(NoReaction::NoCounterEffect));
        assert_eq!(counter(&roster(Some(50)), true), Err(NoReaction::Suppressed));
        let mut used = roster(Some(50));
        used[1].flags.insert(ActionFlags::REACTION_USED);
        assert_eq!(counter(&used, false), Err(NoReaction::ReactionUsed));
        assert_eq!(counter(&roster(Some(50)), false).map(|d| d.damage), Ok(6));
    }
}
