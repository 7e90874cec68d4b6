//! Trigger condition evaluation.

use tracing::debug;

use crate::config::BattleConfig;
use crate::state::{Ability, Hook, Participant, SkillTrigger, TriggerTarget, ValueType};
use crate::stats::{
    allies, effective_ac, effective_initiative, effective_morale, effective_speed,
    has_any_ally_low_hp, normalize_tag, opponents,
};

/// Reads a stat for a complex trigger comparison.
///
/// `ValueType::Percent` turns HP stats into a percentage of max HP; other
/// stats ignore it. Unknown stats yield `None`.
pub fn stat_value(participant: &Participant, stat: &str, value_type: ValueType) -> Option<i64> {
    let tag = normalize_tag(stat);
    let value = match tag.as_str() {
        "hp" | "current_hp" | "health" => match value_type {
            ValueType::Percent => participant.hp_percent(),
            ValueType::Number => i64::from(participant.current_hp),
        },
        "temp_hp" => i64::from(participant.temp_hp),
        "max_hp" | "maxhp" => i64::from(participant.max_hp),
        "ac" | "armor_class" => i64::from(effective_ac(participant)),
        "speed" => i64::from(effective_speed(participant)),
        "morale" => i64::from(effective_morale(participant)),
        "initiative" => i64::from(effective_initiative(participant)),
        "level" => i64::from(participant.level),
        "buffs" => participant
            .effects
            .iter()
            .filter(|effect| !effect.kind.is_negative())
            .count() as i64,
        "debuffs" => participant
            .effects
            .iter()
            .filter(|effect| effect.kind.is_negative())
            .count() as i64,
        other => {
            let ability: Ability = other.parse().ok()?;
            i64::from(participant.abilities.score(ability))
        }
    };
    Some(value)
}

/// True if `trigger` fires for `owner` at `hook`.
///
/// Simple triggers must name the hook; `lowHp` and `allyLowHp` also check
/// their precondition. Complex triggers are evaluated at the condition hooks
/// and hold if at least one active participant of the quantified slice
/// satisfies `stat op value`.
pub fn trigger_holds(
    roster: &[Participant],
    owner: &Participant,
    trigger: &SkillTrigger,
    hook: &Hook,
    config: &BattleConfig,
) -> bool {
    if !trigger.listens_to(hook) {
        return false;
    }
    match trigger {
        SkillTrigger::Simple { trigger, .. } => match trigger {
            Hook::LowHp => owner.has_low_hp(config.low_hp_threshold),
            Hook::AllyLowHp => has_any_ally_low_hp(roster, owner, config.low_hp_threshold),
            _ => true,
        },
        SkillTrigger::Complex {
            target,
            operator,
            value,
            value_type,
            stat,
            ..
        } => {
            let check = |p: &Participant| match stat_value(p, stat, *value_type) {
                Some(actual) => operator.holds(actual, i64::from(*value)),
                None => {
                    debug!(stat = %stat, "unknown trigger stat");
                    false
                }
            };
            match target {
                TriggerTarget::Owner => check(owner),
                TriggerTarget::Ally => allies(roster, owner)
                    .filter(|p| p.is_active())
                    .any(check),
                TriggerTarget::Enemy => opponents(roster, owner)
                    .filter(|p| p.is_active())
                    .any(check),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Comparison, ParticipantId, Side, TriggerModifiers};

    fn complex(target: TriggerTarget, op: &str, value: i32, value_type: ValueType, stat: &str) -> SkillTrigger {
        SkillTrigger::Complex {
            target,
            operator: Comparison::from(op.to_string()),
            value,
            value_type,
            stat: stat.to_string(),
            modifiers: TriggerModifiers::default(),
        }
    }

    fn roster() -> Vec<Participant> {
        vec![
            Participant::new(ParticipantId(1), "owner", Side::Ally).with_hp(40),
            Participant::new(ParticipantId(2), "friend", Side::Ally)
                .with_hp(20)
                .with_current_hp(3),
            Participant::new(ParticipantId(3), "foe", Side::Enemy)
                .with_hp(30)
                .with_armor_class(17),
        ]
    }

    #[test]
    fn complex_trigger_quantifies_over_allies() {
        let roster = roster();
        let config = BattleConfig::default();
        let trigger = complex(TriggerTarget::Ally, "<", 25, ValueType::Percent, "hp");
        assert!(trigger_holds(&roster, &roster[0], &trigger, &Hook::StartRound, &config));
        assert!(!trigger_holds(&roster, &roster[0], &trigger, &Hook::OnHit, &config));
        let trigger = complex(TriggerTarget::Ally, "<", 15, ValueType::Percent, "hp");
        assert!(!trigger_holds(&roster, &roster[0], &trigger, &Hook::StartRound, &config));
    }

    #[test]
    fn complex_trigger_reads_enemy_and_self_stats() {
        let roster = roster();
        let config = BattleConfig::default();
        let enemy_ac = complex(TriggerTarget::Enemy, ">=", 17, ValueType::Number, "ac");
        assert!(trigger_holds(&roster, &roster[0], &enemy_ac, &Hook::BeforeAttack, &config));
        let own_hp = complex(TriggerTarget::Owner, "=", 40, ValueType::Number, "hp");
        assert!(trigger_holds(&roster, &roster[0], &own_hp, &Hook::BeforeAttack, &config));
        let unknown = complex(TriggerTarget::Owner, ">", 0, ValueType::Number, "mana");
        assert!(!trigger_holds(&roster, &roster[0], &unknown, &Hook::BeforeAttack, &config));
    }

    #[test]
    fn simple_low_hp_checks_precondition() {
        let roster = roster();
        let config = BattleConfig::default();
        let trigger = SkillTrigger::simple(Hook::AllyLowHp);
        assert!(trigger_holds(&roster, &roster[0], &trigger, &Hook::AllyLowHp, &config));
        let trigger = SkillTrigger::simple(Hook::LowHp);
        assert!(!trigger_holds(&roster, &roster[0], &trigger, &Hook::LowHp, &config));
        assert!(trigger_holds(&roster, &roster[1], &trigger, &Hook::LowHp, &config));
    }
}
