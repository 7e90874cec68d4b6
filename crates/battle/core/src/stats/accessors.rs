//! Derived values read from a participant snapshot.
//!
//! Nothing here is cached: every call re-reads the current effects, so a
//! freshly added or expired effect is visible immediately.

use super::modifiers::normalize_tag;
use crate::state::Participant;

/// Sum of effect entries whose normalized tag is one of `tags`.
fn effect_sum(participant: &Participant, tags: &[&str], percentage: bool) -> i64 {
    participant
        .effects
        .iter()
        .flat_map(|effect| effect.effects.iter())
        .filter(|entry| entry.is_percentage == percentage)
        .filter(|entry| tags.contains(&normalize_tag(&entry.stat).as_str()))
        .map(|entry| i64::from(entry.value))
        .sum()
}

/// Armor class plus every `ac_bonus` entry.
pub fn effective_ac(participant: &Participant) -> i32 {
    let bonus = effect_sum(participant, &["ac_bonus", "ac"], false);
    (i64::from(participant.armor_class) + bonus) as i32
}

/// Speed multiplied by `(1 + p/100)` for each percent `speed` entry, plus any
/// flat `speed` entries. Never negative.
pub fn effective_speed(participant: &Participant) -> u32 {
    let mut speed = f64::from(participant.speed);
    for entry in participant
        .effects
        .iter()
        .flat_map(|effect| effect.effects.iter())
        .filter(|entry| normalize_tag(&entry.stat) == "speed")
    {
        if entry.is_percentage {
            speed *= 1.0 + f64::from(entry.value) / 100.0;
        } else {
            speed += f64::from(entry.value);
        }
    }
    speed.max(0.0).floor() as u32
}

/// Morale plus every `morale` entry. Not clamped.
pub fn effective_morale(participant: &Participant) -> i32 {
    i32::from(participant.morale) + effect_sum(participant, &["morale"], false) as i32
}

/// Initiative plus every `initiative` entry.
pub fn effective_initiative(participant: &Participant) -> i32 {
    participant.initiative + effect_sum(participant, &["initiative"], false) as i32
}

/// Attack bonus granted by effects and artifacts.
pub fn bonus_attack(participant: &Participant) -> i32 {
    let from_effects = effect_sum(participant, &["attack_bonus", "attack", "to_hit"], false);
    let from_artifacts: i64 = participant
        .artifacts
        .iter()
        .filter(|artifact| !artifact.is_percentage)
        .filter(|artifact| {
            matches!(
                normalize_tag(&artifact.stat).as_str(),
                "attack_bonus" | "attack" | "to_hit"
            )
        })
        .map(|artifact| i64::from(artifact.value))
        .sum();
    (from_effects + from_artifacts) as i32
}

/// True if any active effect carries a flag entry with the given tag.
pub fn has_flag(participant: &Participant, tag: &str) -> bool {
    participant
        .effects
        .iter()
        .flat_map(|effect| effect.effects.iter())
        .any(|entry| normalize_tag(&entry.stat) == tag && entry.value != 0)
}

/// Largest percent value carried under `tag`, from active effect entries or
/// from the effects of static (trigger-less) skills. Flat entries are ignored.
pub fn max_percent(participant: &Participant, tag: &str) -> Option<i32> {
    let from_effects = participant
        .effects
        .iter()
        .flat_map(|effect| effect.effects.iter())
        .filter(|entry| entry.is_percentage && normalize_tag(&entry.stat) == tag)
        .map(|entry| entry.value);
    let from_skills = participant
        .skills
        .iter()
        .filter(|skill| skill.is_static())
        .flat_map(|skill| skill.effects.iter())
        .filter(|effect| effect.is_percent() && normalize_tag(&effect.stat) == tag)
        .map(|effect| effect.value.number());
    from_effects.chain(from_skills).max()
}

/// Same-side participants other than `participant`.
pub fn allies<'a>(
    roster: &'a [Participant],
    participant: &'a Participant,
) -> impl Iterator<Item = &'a Participant> + 'a {
    roster
        .iter()
        .filter(move |other| other.side() == participant.side() && other.id != participant.id)
}

/// Participants on the other side.
pub fn opponents<'a>(
    roster: &'a [Participant],
    participant: &'a Participant,
) -> impl Iterator<Item = &'a Participant> + 'a {
    roster
        .iter()
        .filter(move |other| other.side() != participant.side())
}

/// True if any ally of `participant` is at or below `threshold` percent HP.
pub fn has_any_ally_low_hp(roster: &[Participant], participant: &Participant, threshold: u32) -> bool {
    allies(roster, participant).any(|ally| ally.is_active() && ally.has_low_hp(threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        ActiveEffect, ActiveSkill, EffectEntry, EffectKind, Hook, ParticipantId, Side, SkillEffect,
        SkillTrigger,
    };

    fn hero() -> Participant {
        Participant::new(ParticipantId(1), "hero", Side::Ally)
            .with_armor_class(14)
            .with_speed(30)
            .with_morale(1)
    }

    #[test]
    fn effective_ac_sums_bonuses() {
        let p = hero()
            .with_effect(
                ActiveEffect::new("Shield", EffectKind::Buff, 2)
                    .with_entry(EffectEntry::flat("ac_bonus", 2)),
            )
            .with_effect(
                ActiveEffect::new("Sundered", EffectKind::Debuff, 1)
                    .with_entry(EffectEntry::flat("AC Bonus", -1)),
            );
        assert_eq!(effective_ac(&p), 15);
    }

    #[test]
    fn effective_speed_multiplies() {
        let p = hero()
            .with_effect(
                ActiveEffect::new("Haste", EffectKind::Buff, 2)
                    .with_entry(EffectEntry::percent("speed", 50)),
            )
            .with_effect(
                ActiveEffect::new("Mud", EffectKind::Debuff, 2)
                    .with_entry(EffectEntry::percent("speed", -50)),
            );
        assert_eq!(effective_speed(&p), 22);
    }

    #[test]
    fn effective_morale_is_not_cached() {
        let mut p = hero();
        assert_eq!(effective_morale(&p), 1);
        p.effects.push(
            ActiveEffect::new("Rally", EffectKind::Buff, 1)
                .with_entry(EffectEntry::flat("morale", 2)),
        );
        assert_eq!(effective_morale(&p), 3);
    }

    #[test]
    fn ally_lookup_excludes_self_and_enemies() {
        let roster = vec![
            hero(),
            Participant::new(ParticipantId(2), "friend", Side::Ally)
                .with_hp(20)
                .with_current_hp(2),
            Participant::new(ParticipantId(3), "foe", Side::Enemy)
                .with_hp(20)
                .with_current_hp(1),
        ];
        let ids: Vec<_> = allies(&roster, &roster[0]).map(|p| p.id).collect();
        assert_eq!(ids, vec![ParticipantId(2)]);
        assert!(has_any_ally_low_hp(&roster, &roster[0], 15));
        assert!(!has_any_ally_low_hp(&roster, &roster[1], 15));
    }

    #[test]
    fn max_percent_reads_static_skills_and_skips_flat_entries() {
        let flat_only = hero().with_effect(
            ActiveEffect::new("Spiked", EffectKind::Buff, 2)
                .with_entry(EffectEntry::flat("counter_damage", 40)),
        );
        assert_eq!(max_percent(&flat_only, "counter_damage"), None);

        let riposte = hero()
            .with_skill(
                ActiveSkill::new("riposte", "Riposte")
                    .with_effect(SkillEffect::percent("counter_damage", 20)),
            )
            .with_effect(
                ActiveEffect::new("Guard", EffectKind::Buff, 2)
                    .with_entry(EffectEntry::percent("Counter Damage", 10)),
            );
        assert_eq!(max_percent(&riposte, "counter_damage"), Some(20));

        let triggered = hero().with_skill(
            ActiveSkill::new("vengeance", "Vengeance")
                .with_trigger(SkillTrigger::simple(Hook::OnHit))
                .with_effect(SkillEffect::percent("counter_damage", 50)),
        );
        assert_eq!(max_percent(&triggered, "counter_damage"), None);
    }
}
