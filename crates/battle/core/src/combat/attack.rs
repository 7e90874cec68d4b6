//! Weapon attack pipeline.
//!
//! ```text
//! beforeAttack → roll ─┬─ critical fail ─────────────────────────────┐
//!                      ├─ miss ───────────────────────────────┐      │
//!                      └─ hit → damage → resistance → vitals  │      │
//!                               → riders → life steal → onHit │      │
//!                      afterAttack ◄──────────────────────────┴──────┘
//!                      reaction (not after a critical fail)
//! ```

use tracing::debug;

use super::critical;
use super::damage::{DamageInput, attack_ability, compute_damage, static_bonuses};
use super::hit::{HitInput, attack_bonus, has_advantage, resolve_hit};
use super::reaction;
use super::resistance::resist;
use super::vitals;
use crate::dice::{DiceExpr, average_of};
use crate::env::CriticalOutcome;
use crate::scene::Scene;
use crate::state::{ActionDetails, AttackDetails, HitOutcome, ParticipantId};
use crate::stats::{DamageCategory, effective_ac, has_flag, normalize_tag, saturating_u32};
use crate::triggers::{self, Rider, TriggerFlags};

/// Caller-supplied rolls for one attack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AttackRolls {
    pub d20: u32,
    pub advantage_d20: Option<u32>,
    /// Weapon dice faces.
    pub damage: Vec<u32>,
    pub hero_level_bonus: i64,
    pub hero_dice: i64,
}

/// Everything the engine needs to build the log entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackResolution {
    pub details: ActionDetails,
    pub targets: Vec<ParticipantId>,
    pub result: String,
    pub success: bool,
}

impl AttackResolution {
    fn failed(reason: &str) -> Self {
        Self {
            result: reason.to_string(),
            ..Self::default()
        }
    }
}

/// Resolves an attack of `attacker` with its weapon `weapon` against
/// `targets`. Only the first target is attacked unless the attacker may hit
/// several or an area effect fired.
pub fn resolve_attack(
    scene: &mut Scene<'_>,
    attacker_id: ParticipantId,
    targets: &[ParticipantId],
    weapon: usize,
    rolls: &AttackRolls,
) -> AttackResolution {
    let Some(attacker) = scene.get(attacker_id).cloned() else {
        return AttackResolution::failed("unknown attacker");
    };
    let Some(weapon) = attacker.attacks.get(weapon).cloned() else {
        return AttackResolution::failed("no weapon");
    };
    let mut targets: Vec<ParticipantId> = targets
        .iter()
        .copied()
        .filter(|id| *id != attacker_id && scene.is_active(*id))
        .collect();
    targets.dedup();
    let Some(&primary) = targets.first() else {
        return AttackResolution::failed("no valid target");
    };
    let attack_type = weapon.attack_type;
    let config = scene.config();

    let mut out = triggers::before_attack(scene, attacker_id, primary, attack_type);

    // hooks may have changed the attacker
    let Some(attacker) = scene.get(attacker_id).cloned() else {
        return AttackResolution::failed("unknown attacker");
    };
    let reach = if out.has(TriggerFlags::AREA) {
        targets.len()
    } else {
        attacker.max_targets.max(1) as usize
    };
    targets.truncate(reach);

    let advantage = has_advantage(&attacker, attack_type, config) || out.has(TriggerFlags::ADVANTAGE);
    let guaranteed = out.has(TriggerFlags::GUARANTEED_HIT) || has_flag(&attacker, "guaranteed_hit");
    let primary_target = scene.get(primary).cloned();
    let bonus = attack_bonus(&attacker, &weapon, primary_target.as_ref());
    let target_ac = primary_target.as_ref().map_or(0, effective_ac);
    let roll = resolve_hit(&HitInput {
        d20: rolls.d20,
        advantage_d20: rolls.advantage_d20,
        advantage,
        attack_bonus: bonus,
        target_ac,
        guaranteed,
    });

    let mut resolution = AttackResolution {
        targets: targets.clone(),
        success: true,
        ..AttackResolution::default()
    };
    resolution.details.attack = Some(AttackDetails {
        weapon: weapon.name.clone(),
        d20: rolls.d20,
        advantage_d20: rolls.advantage_d20,
        natural: roll.natural,
        attack_bonus: bonus,
        total: roll.total,
        target_ac,
        outcome: roll.outcome,
    });
    debug!(attacker = %attacker_id, defender = %primary, natural = roll.natural, total = roll.total, target_ac, outcome = %roll.outcome, "attack rolled");

    if roll.outcome == HitOutcome::CriticalFail {
        scene.say(format!("{} fumbles the attack with {}", attacker.name, weapon.name));
        let drawn = critical::draw(scene, CriticalOutcome::Fail);
        if let Some(effect) = &drawn {
            critical::apply_side_effects(scene, effect, attacker_id, primary);
        }
        resolution.details.critical = drawn;
        triggers::after_attack(scene, attacker_id, primary, attack_type);
        resolution.result = "critical fail".to_string();
        return resolution;
    }

    let drawn = if roll.outcome == HitOutcome::CriticalHit {
        critical::draw(scene, CriticalOutcome::Success)
    } else {
        None
    };

    // secondary targets are checked against their own AC with the same roll
    let hit_targets: Vec<ParticipantId> = targets
        .iter()
        .copied()
        .filter(|id| {
            if *id == primary {
                return roll.outcome.is_hit();
            }
            let Some(target) = scene.get(*id) else {
                return false;
            };
            let bonus = attack_bonus(&attacker, &weapon, Some(target));
            let other = resolve_hit(&HitInput {
                d20: roll.natural,
                attack_bonus: bonus,
                target_ac: effective_ac(target),
                guaranteed,
                ..HitInput::default()
            });
            other.outcome.is_hit()
        })
        .collect();

    if hit_targets.is_empty() {
        let target_name = scene.name_of(primary);
        scene.say(format!("{} misses {target_name}", attacker.name));
        resolution.result = "miss".to_string();
    } else {
        let dice = DiceExpr::parse(&weapon.damage_dice);
        let base = if critical::maximizes_dice(drawn.as_ref()) {
            dice.maximum()
        } else {
            dice.total(&rolls.damage)
        };
        let ability = attack_ability(&attacker, attack_type);
        let input = DamageInput {
            base,
            hero_level_bonus: rolls.hero_level_bonus,
            hero_dice: rolls.hero_dice,
            stat: Some((ability, attacker.modifier(ability))),
        };
        let mut bonuses = static_bonuses(&attacker, scene.roster(), config, attack_type);
        bonuses.extend(out.damage.clone());
        let damage = compute_damage(&input, &bonuses);
        let mut breakdown = damage.breakdown.clone();
        let mut total = damage.total;
        if let Some(effect) = &drawn {
            let (amplified, line) = critical::amplify(effect, total);
            total = amplified;
            breakdown.push(line);
        }
        if i64::from(out.min_damage) > total {
            total = i64::from(out.min_damage);
            breakdown.push(format!("Minimum damage: {total}"));
        }
        if total != damage.total {
            breakdown.push(format!("Final damage: {total}"));
        }

        let ignore = out.has(TriggerFlags::IGNORE_RESISTANCE);
        let mut riders = out.riders.clone();
        riders.extend(passive_riders(&attacker));
        let mut dealt_total = 0u32;

        for &id in &hit_targets {
            let Some(target) = scene.get(id).cloned() else {
                continue;
            };
            let resisted = resist(total, &target, attack_type.category(), ignore);
            let line = resisted.line();
            if !line.is_empty() {
                breakdown.push(format!("{}: {line}", target.name));
            }
            let wound = vitals::inflict(scene, Some(attacker_id), id, saturating_u32(resisted.final_damage));
            dealt_total += wound.dealt;
            scene.say(format!(
                "{} hits {} with {} for {} damage",
                attacker.name, target.name, weapon.name, wound.dealt
            ));

            for rider in &riders {
                let Some(current) = scene.get(id).cloned() else {
                    continue;
                };
                let amount = average_of(&rider.dice).max(0);
                let category = DamageCategory::of_damage_type(&rider.damage_type);
                let resisted = resist(amount, &current, category, ignore);
                if resisted.final_damage <= 0 {
                    continue;
                }
                let wound = vitals::inflict(scene, Some(attacker_id), id, saturating_u32(resisted.final_damage));
                dealt_total += wound.dealt;
                breakdown.push(format!("{}: +{} {}", rider.label, wound.dealt, rider.damage_type));
            }

            out.merge(triggers::on_hit(scene, attacker_id, id, attack_type));
        }

        if let Some(effect) = &drawn {
            critical::apply_side_effects(scene, effect, attacker_id, primary);
        }

        if out.life_steal_percent > 0 && dealt_total > 0 {
            let stolen = u64::from(dealt_total) * out.life_steal_percent as u64 / 100;
            if let Some(attacker) = scene.get_mut(attacker_id) {
                let healed = vitals::heal(attacker, u32::try_from(stolen).unwrap_or(u32::MAX));
                if healed > 0 {
                    breakdown.push(format!("Life steal: +{healed}"));
                }
            }
        }

        resolution.details.breakdown = breakdown;
        resolution.result = match roll.outcome {
            HitOutcome::CriticalHit => "critical hit",
            _ => "hit",
        }
        .to_string();
    }
    resolution.details.critical = drawn.clone();

    triggers::after_attack(scene, attacker_id, primary, attack_type);

    let suppressed = drawn.as_ref().is_some_and(|effect| effect.suppresses_reaction);
    match reaction::try_counter(scene, primary, attacker_id, suppressed) {
        Ok(details) => resolution.details.reaction = Some(details),
        Err(reason) => debug!(reactor = %primary, %reason, "no reaction"),
    }
    resolution
}

/// Elemental riders granted by passive and racial abilities.
fn passive_riders(attacker: &crate::state::Participant) -> Vec<Rider> {
    attacker
        .passives
        .iter()
        .chain(attacker.racial.iter())
        .filter(|passive| normalize_tag(&passive.effect) == "elemental_rider")
        .filter_map(|passive| {
            Some(Rider {
                label: format!("Passive {}", passive.name),
                dice: passive.dice.clone()?,
                damage_type: passive
                    .damage_type
                    .clone()
                    .unwrap_or_else(|| "elemental".to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::env::{BattleEnv, FixedRng};
    use crate::state::{
        AbilityScores, ActionFlags, ActiveEffect, ActiveSkill, Attack, EffectEntry, EffectKind, Hook,
        LifeStatus, PassiveAbility, Participant, Side, SkillEffect, SkillTrigger,
    };
    use crate::stats::AttackType;

    fn fighter() -> Participant {
        Participant::new(ParticipantId(1), "Fighter", Side::Ally)
            .with_hp(30)
            .with_abilities(AbilityScores::new(14, 10, 10, 10, 10, 10))
            .with_attack(Attack::new("Longsword", AttackType::Melee, "1d8").with_bonus(1))
    }

    fn orc() -> Participant {
        Participant::new(ParticipantId(2), "Orc", Side::Enemy)
            .with_hp(30)
            .with_armor_class(15)
            .with_attack(Attack::new("Axe", AttackType::Melee, "1d12"))
    }

    fn attack(roster: &[Participant], rolls: AttackRolls) -> (AttackResolution, Vec<Participant>) {
        let config = BattleConfig::default();
        let rng = FixedRng(u32::MAX);
        let env = BattleEnv::new(&config, &rng);
        let mut scene = Scene::new(roster, env, 1, 0, ParticipantId(1), 3);
        let resolution = resolve_attack(&mut scene, ParticipantId(1), &[ParticipantId(2)], 0, &rolls);
        (resolution, scene.roster().to_vec())
    }

    fn rolls(d20: u32, damage: u32) -> AttackRolls {
        AttackRolls {
            d20,
            damage: vec![damage],
            ..AttackRolls::default()
        }
    }

    #[test]
    fn basic_hit_applies_damage() {
        let (resolution, roster) = attack(&[fighter(), orc()], rolls(15, 5));
        let details = resolution.details.attack.clone();
        assert_eq!(details.map(|d| (d.attack_bonus, d.total)), Some((5, 20)));
        assert_eq!(resolution.result, "hit");
        assert_eq!(roster[1].current_hp, 23);
        assert_eq!(resolution.details.breakdown.last().map(String::as_str), Some("Total damage: 7"));
    }

    #[test]
    fn miss_leaves_target_untouched() {
        let (resolution, roster) = attack(&[fighter(), orc()], rolls(9, 5));
        assert_eq!(resolution.result, "miss");
        assert_eq!(roster[1].current_hp, 30);
        assert!(resolution.details.breakdown.is_empty());
    }

    #[test]
    fn critical_fail_short_circuits() {
        let guard = orc().with_effect(
            ActiveEffect::new("Riposte", EffectKind::Buff, 2)
                .with_entry(EffectEntry::percent("counter_damage", 15)),
        );
        let (resolution, roster) = attack(&[fighter(), guard], rolls(1, 8));
        assert_eq!(resolution.result, "critical fail");
        assert!(resolution.success);
        assert_eq!(roster[1].current_hp, 30);
        assert!(resolution.details.reaction.is_none());
        assert!(resolution.details.critical.is_some());
    }

    #[test]
    fn counter_follows_a_hit() {
        let guard = orc().with_effect(
            ActiveEffect::new("Riposte", EffectKind::Buff, 2)
                .with_entry(EffectEntry::percent("counter_damage", 0)),
        );
        let (resolution, roster) = attack(&[fighter(), guard], rolls(15, 5));
        // 1d12 averages 6.5; 6.5 * 1.15 = 7.475
        assert_eq!(resolution.details.reaction.map(|r| r.damage), Some(7));
        assert_eq!(roster[0].current_hp, 23);
        assert!(roster[1].flags.contains(ActionFlags::REACTION_USED));
    }

    #[test]
    fn resistance_and_rider_apply_per_category() {
        let attacker = fighter().with_passive(PassiveAbility::elemental_rider("Flame Brand", "fire", "1d6"));
        let target = orc().with_resistances(crate::state::Resistances::new(50, 0));
        let (resolution, roster) = attack(&[attacker, target], rolls(15, 5));
        // 7 physical halved to 4, plus 3 fire
        assert_eq!(roster[1].current_hp, 23);
        assert!(resolution.details.breakdown.contains(&"Orc: Physical resistance (50%): -3".to_string()));
        assert!(resolution.details.breakdown.contains(&"Passive Flame Brand: +3 fire".to_string()));
    }

    #[test]
    fn lethal_hit_drops_target() {
        let target = orc().with_current_hp(7);
        let (_, roster) = attack(&[fighter(), target], rolls(15, 5));
        assert_eq!(roster[1].current_hp, 0);
        assert_eq!(roster[1].status, LifeStatus::Unconscious);
    }

    fn triggered(id: &str, name: &str, hook: Hook, effect: SkillEffect) -> ActiveSkill {
        ActiveSkill::new(id, name)
            .with_trigger(SkillTrigger::simple(hook))
            .with_effect(effect)
    }

    #[test]
    fn static_counter_skill_enables_a_reaction() {
        let guard = orc().with_skill(
            ActiveSkill::new("riposte", "Riposte").with_effect(SkillEffect::percent("counter_damage", 20)),
        );
        let (resolution, roster) = attack(&[fighter(), guard], rolls(15, 5));
        // 6.5 * 1.2 = 7.8
        assert_eq!(resolution.details.reaction.map(|r| r.damage), Some(7));
        assert_eq!(roster[0].current_hp, 23);
    }

    #[test]
    fn physical_rider_is_resisted_as_physical() {
        let attacker = fighter().with_passive(PassiveAbility::elemental_rider("Barbed Bolt", "piercing", "1d6"));
        let target = orc().with_resistances(crate::state::Resistances::new(50, 0));
        let (resolution, roster) = attack(&[attacker, target], rolls(15, 5));
        // 7 halved to 4, rider 3 halved to 2
        assert_eq!(roster[1].current_hp, 24);
        assert!(resolution.details.breakdown.contains(&"Passive Barbed Bolt: +2 piercing".to_string()));
    }

    #[test]
    fn critical_fail_still_runs_attack_hooks() {
        let attacker = fighter()
            .with_skill(triggered("steady", "Steady Aim", Hook::BeforeAttack, SkillEffect::flat("buff_attack", 1)))
            .with_skill(triggered("regroup", "Regroup", Hook::AfterAttack, SkillEffect::flat("buff_ac", 2)))
            .with_skill(triggered("venom", "Venom Strike", Hook::OnHit, SkillEffect::flat("poison", 3)));
        let (resolution, roster) = attack(&[attacker, orc()], rolls(1, 8));
        assert_eq!(resolution.result, "critical fail");
        assert_eq!(roster[0].usage("steady"), 1);
        assert_eq!(roster[0].usage("regroup"), 1);
        assert_eq!(roster[0].usage("venom"), 0);
        assert!(roster[0].has_effect("Steady Aim"));
        assert!(roster[0].has_effect("Regroup"));
        assert!(!roster[1].has_effect("Venom Strike"));
    }

    #[test]
    fn on_hit_skill_poisons_the_target() {
        let attacker = fighter().with_skill(triggered(
            "venom",
            "Venom Strike",
            Hook::OnHit,
            SkillEffect::flat("poison", 3).with_duration(2),
        ));
        let (_, roster) = attack(&[attacker, orc()], rolls(15, 5));
        assert_eq!(roster[0].usage("venom"), 1);
        assert_eq!(roster[1].current_hp, 23);
        let dot = roster[1]
            .effects
            .iter()
            .find(|effect| effect.name == "Venom Strike")
            .and_then(|effect| effect.dot_damage.clone())
            .map(|dot| (dot.damage_per_round, dot.damage_type));
        assert_eq!(dot, Some((3, "poison".to_string())));
    }

    #[test]
    fn killing_blow_fires_on_kill_skills() {
        let mut attacker = fighter().with_skill(triggered(
            "bloodlust",
            "Bloodlust",
            Hook::OnKill,
            SkillEffect::flag("extra_action"),
        ));
        attacker.flags.insert(ActionFlags::ACTION_USED);
        let target = orc().with_current_hp(7);
        let (_, roster) = attack(&[attacker, target], rolls(15, 5));
        assert_eq!(roster[1].status, LifeStatus::Unconscious);
        assert_eq!(roster[0].usage("bloodlust"), 1);
        assert!(!roster[0].flags.contains(ActionFlags::ACTION_USED));
    }

    #[test]
    fn surviving_target_does_not_fire_on_kill() {
        let attacker = fighter().with_skill(triggered(
            "bloodlust",
            "Bloodlust",
            Hook::OnKill,
            SkillEffect::flag("extra_action"),
        ));
        let (_, roster) = attack(&[attacker, orc()], rolls(15, 5));
        assert_eq!(roster[0].usage("bloodlust"), 0);
    }
}
