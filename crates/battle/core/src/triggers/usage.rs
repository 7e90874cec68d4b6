//! Usage modifiers: once/twice per battle and probability gates.

use tracing::debug;

use crate::env::RollCursor;
use crate::state::{Participant, TriggerModifiers};

/// Result of checking a trigger's usage modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsageGate {
    Allowed,
    OncePerBattle,
    TwicePerBattle,
    Chance,
}

impl UsageGate {
    pub fn is_allowed(self) -> bool {
        self == UsageGate::Allowed
    }
}

/// Normalizes a probability given as a fraction (`0.3`) or a percentage (`30`).
pub fn normalize_probability(probability: f64) -> f64 {
    if probability > 1.0 {
        probability / 100.0
    } else {
        probability
    }
}

/// Checks modifiers in order: once per battle, twice per battle, probability.
///
/// The random draw only happens when the count limits pass, so a blocked
/// skill never consumes a draw.
pub fn check_usage(
    owner: &Participant,
    skill_id: &str,
    modifiers: &TriggerModifiers,
    cursor: &mut RollCursor<'_>,
) -> UsageGate {
    let used = owner.usage(skill_id);
    if modifiers.once_per_battle && used >= 1 {
        debug!(skill = skill_id, used, "blocked: once per battle");
        return UsageGate::OncePerBattle;
    }
    if modifiers.twice_per_battle && used >= 2 {
        debug!(skill = skill_id, used, "blocked: twice per battle");
        return UsageGate::TwicePerBattle;
    }
    if let Some(probability) = modifiers.probability {
        let probability = normalize_probability(probability);
        if !cursor.chance(probability) {
            debug!(skill = skill_id, probability, "blocked: probability");
            return UsageGate::Chance;
        }
    }
    UsageGate::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::FixedRng;
    use crate::state::{ParticipantId, Side};

    #[test]
    fn once_per_battle_blocks_second_use() {
        let rng = FixedRng(0);
        let mut cursor = RollCursor::new(&rng, 0, 0, 0);
        let mut owner = Participant::new(ParticipantId(1), "a", Side::Ally);
        let once = TriggerModifiers::once();
        assert!(check_usage(&owner, "s", &once, &mut cursor).is_allowed());
        owner.record_usage("s");
        assert_eq!(check_usage(&owner, "s", &once, &mut cursor), UsageGate::OncePerBattle);
    }

    #[test]
    fn twice_per_battle_blocks_third_use() {
        let rng = FixedRng(0);
        let mut cursor = RollCursor::new(&rng, 0, 0, 0);
        let mut owner = Participant::new(ParticipantId(1), "a", Side::Ally);
        let twice = TriggerModifiers::twice();
        owner.record_usage("s");
        assert!(check_usage(&owner, "s", &twice, &mut cursor).is_allowed());
        owner.record_usage("s");
        assert_eq!(check_usage(&owner, "s", &twice, &mut cursor), UsageGate::TwicePerBattle);
    }

    #[test]
    fn probability_accepts_fraction_and_percent() {
        assert_eq!(normalize_probability(25.0), 0.25);
        assert_eq!(normalize_probability(0.4), 0.4);

        let high = FixedRng(u32::MAX);
        let mut cursor = RollCursor::new(&high, 0, 0, 0);
        let owner = Participant::new(ParticipantId(1), "a", Side::Ally);
        assert_eq!(
            check_usage(&owner, "s", &TriggerModifiers::chance(90.0), &mut cursor),
            UsageGate::Chance
        );
        assert_eq!(cursor.draws(), 1);
    }

    #[test]
    fn count_block_skips_the_draw() {
        let rng = FixedRng(0);
        let mut cursor = RollCursor::new(&rng, 0, 0, 0);
        let mut owner = Participant::new(ParticipantId(1), "a", Side::Ally);
        owner.record_usage("s");
        let modifiers = TriggerModifiers {
            probability: Some(0.5),
            once_per_battle: true,
            twice_per_battle: false,
        };
        assert_eq!(check_usage(&owner, "s", &modifiers, &mut cursor), UsageGate::OncePerBattle);
        assert_eq!(cursor.draws(), 0);
    }
}
