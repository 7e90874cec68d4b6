//! Critical-effect draws and their mechanical consequences.

use tracing::debug;

use super::vitals;
use crate::dice::average_of;
use crate::env::{CriticalEffect, CriticalKind, CriticalOutcome};
use crate::scene::Scene;
use crate::state::{ActiveEffect, EffectEntry, EffectKind, ParticipantId};

/// Draws one entry from the table for `outcome`. Empty tables yield `None`.
pub fn draw(scene: &mut Scene<'_>, outcome: CriticalOutcome) -> Option<CriticalEffect> {
    let table = scene.env().critical().table(outcome);
    let index = scene.cursor().pick(table.len())?;
    let effect = table.get(index).cloned();
    if let Some(effect) = &effect {
        debug!(id = %effect.id, ?outcome, "critical effect drawn");
    }
    effect
}

/// Weapon dice count as their maximum.
pub fn maximizes_dice(effect: Option<&CriticalEffect>) -> bool {
    matches!(effect.map(|effect| &effect.kind), Some(CriticalKind::MaxDice))
}

/// Applies a damage-multiplying entry to `total`.
///
/// Returns the new total and a breakdown line (empty if the entry does not
/// change damage).
pub fn amplify(effect: &CriticalEffect, total: i64) -> (i64, String) {
    match &effect.kind {
        CriticalKind::DoubleDamage => (total * 2, format!("Critical {}: x2", effect.name)),
        CriticalKind::ExtraDamage { dice } => {
            let extra = average_of(dice).max(0);
            (total + extra, format!("Critical {}: +{extra}", effect.name))
        }
        CriticalKind::MaxDice => (total, format!("Critical {}: maximum dice", effect.name)),
        _ => (total, String::new()),
    }
}

/// Armor penalties and self-inflicted damage.
pub fn apply_side_effects(
    scene: &mut Scene<'_>,
    effect: &CriticalEffect,
    attacker: ParticipantId,
    target: ParticipantId,
) {
    match &effect.kind {
        CriticalKind::TargetArmorPenalty { value, duration } => {
            penalize_armor(scene, target, &effect.name, *value, *duration);
        }
        CriticalKind::SelfArmorPenalty { value, duration } => {
            penalize_armor(scene, attacker, &effect.name, *value, *duration);
        }
        CriticalKind::SelfDamage { amount } => {
            let wound = vitals::inflict(scene, None, attacker, *amount);
            let name = scene.name_of(attacker);
            scene.say(format!("{}: {} takes {} damage", effect.name, name, wound.dealt));
        }
        CriticalKind::Nothing => {
            let name = scene.name_of(attacker);
            scene.say(format!("{}: {}", effect.name, name));
        }
        _ => {}
    }
}

fn penalize_armor(scene: &mut Scene<'_>, id: ParticipantId, name: &str, value: i32, duration: u32) {
    let penalty = ActiveEffect::new(name, EffectKind::Debuff, duration)
        .with_entry(EffectEntry::flat("ac_bonus", -value.abs()));
    if scene.add_effect(id, penalty) {
        let who = scene.name_of(id);
        scene.say(format!("{name}: {who} loses {} AC for {duration} rounds", value.abs()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::env::{BattleEnv, CriticalTable, FixedRng};
    use crate::state::{Participant, Side};
    use crate::stats::effective_ac;

    #[test]
    fn fixed_rng_draws_first_entry() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let roster = vec![Participant::new(ParticipantId(1), "a", Side::Ally)];
        let mut scene = Scene::new(&roster, env, 1, 0, ParticipantId(1), 2);
        let drawn = draw(&mut scene, CriticalOutcome::Success);
        assert_eq!(drawn.map(|e| e.kind), Some(CriticalKind::DoubleDamage));
    }

    #[test]
    fn empty_table_draws_nothing() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let table = CriticalTable::new(Vec::new(), Vec::new());
        let env = BattleEnv::new(&config, &rng).with_critical(&table);
        let roster = vec![Participant::new(ParticipantId(1), "a", Side::Ally)];
        let mut scene = Scene::new(&roster, env, 1, 0, ParticipantId(1), 2);
        assert!(draw(&mut scene, CriticalOutcome::Fail).is_none());
    }

    #[test]
    fn amplify_doubles_and_adds() {
        let double = CriticalEffect::new("d", "Devastating blow", CriticalKind::DoubleDamage);
        assert_eq!(amplify(&double, 7), (14, "Critical Devastating blow: x2".to_string()));
        let extra = CriticalEffect::new(
            "e",
            "Deep wound",
            CriticalKind::ExtraDamage {
                dice: "2d6".to_string(),
            },
        );
        assert_eq!(amplify(&extra, 7).0, 14);
    }

    #[test]
    fn target_armor_penalty_is_an_effect() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let roster = vec![
            Participant::new(ParticipantId(1), "a", Side::Ally),
            Participant::new(ParticipantId(2), "b", Side::Enemy).with_armor_class(14),
        ];
        let mut scene = Scene::new(&roster, env, 1, 0, ParticipantId(1), 3);
        let crack = CriticalEffect::new(
            "armor_crack",
            "Staggering blow",
            CriticalKind::TargetArmorPenalty { value: 2, duration: 2 },
        );
        apply_side_effects(&mut scene, &crack, ParticipantId(1), ParticipantId(2));
        assert_eq!(scene.get(ParticipantId(2)).map(effective_ac), Some(12));
    }
}
