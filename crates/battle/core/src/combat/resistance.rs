//! Percent damage reduction per category.

use crate::state::Participant;
use crate::stats::{DamageCategory, normalize_tag};

/// Damage after one resistance check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resisted {
    pub category: Option<DamageCategory>,
    pub damage: i64,
    /// Effective resistance percent, 0 when ignored.
    pub percent: u32,
    pub reduction: i64,
    pub final_damage: i64,
    pub ignored: bool,
}

impl Resisted {
    /// Breakdown line, empty when nothing was reduced or ignored.
    pub fn line(&self) -> String {
        let label = match self.category {
            Some(DamageCategory::Physical) => "Physical resistance",
            Some(DamageCategory::Spell) => "Spell resistance",
            None => "Resistance",
        };
        if self.ignored {
            return format!("{label} ignored");
        }
        if self.reduction == 0 {
            return String::new();
        }
        format!("{label} ({}%): -{}", self.percent, self.reduction)
    }
}

/// Resistance of `participant` to `category`: the base value plus any
/// percent effect entries tagged `<category>_resistance` or `resistance`,
/// capped at 100.
pub fn resistance_percent(participant: &Participant, category: DamageCategory) -> u32 {
    let specific = match category {
        DamageCategory::Physical => "physical_resistance",
        DamageCategory::Spell => "spell_resistance",
    };
    let from_effects: i64 = participant
        .effects
        .iter()
        .flat_map(|effect| effect.effects.iter())
        .filter(|entry| {
            let tag = normalize_tag(&entry.stat);
            tag == specific || tag == "resistance"
        })
        .map(|entry| i64::from(entry.value))
        .sum();
    (i64::from(participant.resistances.percent(category)) + from_effects).clamp(0, 100) as u32
}

/// `reduction = floor(damage × resist / 100)`, `final = max(0, damage − reduction)`.
pub fn resist(damage: i64, target: &Participant, category: DamageCategory, ignore: bool) -> Resisted {
    let damage = damage.max(0);
    let base = resistance_percent(target, category);
    if ignore {
        return Resisted {
            category: Some(category),
            damage,
            percent: 0,
            reduction: 0,
            final_damage: damage,
            ignored: base > 0,
        };
    }
    let reduction = (damage * i64::from(base)).div_euclid(100);
    Resisted {
        category: Some(category),
        damage,
        percent: base,
        reduction,
        final_damage: (damage - reduction).max(0),
        ignored: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActiveEffect, EffectEntry, EffectKind, ParticipantId, Resistances, Side};

    fn target(physical: u32, spell: u32) -> Participant {
        Participant::new(ParticipantId(1), "golem", Side::Enemy)
            .with_hp(40)
            .with_resistances(Resistances::new(physical, spell))
    }

    #[test]
    fn reduction_is_floored() {
        let resisted = resist(13, &target(25, 0), DamageCategory::Physical, false);
        assert_eq!(resisted.reduction, 3);
        assert_eq!(resisted.final_damage, 10);
        assert_eq!(resisted.line(), "Physical resistance (25%): -3");
    }

    #[test]
    fn categories_are_independent() {
        let golem = target(50, 0);
        assert_eq!(resist(10, &golem, DamageCategory::Spell, false).final_damage, 10);
        assert_eq!(resist(10, &golem, DamageCategory::Physical, false).final_damage, 5);
    }

    #[test]
    fn ignore_flag_skips_reduction() {
        let resisted = resist(10, &target(50, 0), DamageCategory::Physical, true);
        assert_eq!(resisted.final_damage, 10);
        assert_eq!(resisted.line(), "Physical resistance ignored");
    }

    #[test]
    fn effects_add_and_cap() {
        let golem = target(80, 0).with_effect(
            ActiveEffect::new("Stoneskin", EffectKind::Buff, 2)
                .with_entry(EffectEntry::percent("physical_resistance", 40)),
        );
        assert_eq!(resistance_percent(&golem, DamageCategory::Physical), 100);
        assert_eq!(resist(9, &golem, DamageCategory::Physical, false).final_damage, 0);
    }
}
