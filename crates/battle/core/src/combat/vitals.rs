//! HP bookkeeping: temporary HP, lethal damage, status and healing.

use tracing::debug;

use crate::scene::Scene;
use crate::state::{LifeStatus, Participant, ParticipantId};
use crate::stats::normalize_tag;
use crate::triggers;

/// Result of removing HP from one participant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Absorbed {
    pub temp: u32,
    pub hp: u32,
    /// HP the participant would have without the floor at 0.
    pub raw_hp: i64,
}

/// Removes `amount`, temporary HP first. Current HP is floored at 0.
pub fn absorb(participant: &mut Participant, amount: u32) -> Absorbed {
    let temp = amount.min(participant.temp_hp);
    participant.temp_hp -= temp;
    let remaining = amount - temp;
    let raw_hp = i64::from(participant.current_hp) - i64::from(remaining);
    let hp = remaining.min(participant.current_hp);
    participant.current_hp -= hp;
    Absorbed { temp, hp, raw_hp }
}

/// Status implied by a raw HP value.
pub fn status_for(raw_hp: i64) -> LifeStatus {
    match raw_hp {
        hp if hp < 0 => LifeStatus::Dead,
        0 => LifeStatus::Unconscious,
        _ => LifeStatus::Active,
    }
}

/// Restores HP up to the maximum. Dead participants cannot be healed.
///
/// Returns the HP actually restored.
pub fn heal(participant: &mut Participant, amount: u32) -> u32 {
    if participant.status == LifeStatus::Dead {
        return 0;
    }
    let before = participant.current_hp;
    participant.current_hp = before.saturating_add(amount).min(participant.max_hp);
    if participant.current_hp > 0 && participant.status == LifeStatus::Unconscious {
        participant.status = LifeStatus::Active;
    }
    participant.current_hp - before
}

/// Result of [`inflict`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Wound {
    /// Damage that reached the target (temp HP included, redirection excluded).
    pub dealt: u32,
    pub absorbed_by_temp: u32,
    /// Damage moved to another participant by a redirect effect.
    pub redirected: u32,
    /// A survive-lethal skill kept the target up.
    pub survived: bool,
    /// The target stopped being active.
    pub dropped: bool,
}

/// Deals `amount` damage to `target` inside a scene.
///
/// Applies damage redirection, temporary HP, the survive-lethal hook, status
/// changes and the `onKill` hook of `source`.
pub fn inflict(scene: &mut Scene<'_>, source: Option<ParticipantId>, target: ParticipantId, amount: u32) -> Wound {
    inflict_inner(scene, source, target, amount, true)
}

fn inflict_inner(
    scene: &mut Scene<'_>,
    source: Option<ParticipantId>,
    target: ParticipantId,
    amount: u32,
    allow_redirect: bool,
) -> Wound {
    let mut wound = Wound::default();
    let Some(victim) = scene.get(target) else {
        return wound;
    };
    if victim.status == LifeStatus::Dead || amount == 0 {
        return wound;
    }
    let was_active = victim.is_active();

    let mut amount = amount;
    if allow_redirect {
        if let Some((guardian, percent)) = redirect_of(victim) {
            if scene.is_active(guardian) {
                let moved = (u64::from(amount) * u64::from(percent) / 100) as u32;
                if moved > 0 {
                    amount -= moved;
                    wound.redirected = moved;
                    let guardian_name = scene.name_of(guardian);
                    let victim_name = scene.name_of(target);
                    scene.say(format!(
                        "{guardian_name} takes {moved} damage in place of {victim_name}"
                    ));
                    inflict_inner(scene, source, guardian, moved, false);
                }
            }
        }
    }

    let Some(victim) = scene.get_mut(target) else {
        return wound;
    };
    let absorbed = absorb(victim, amount);
    wound.dealt = absorbed.temp + absorbed.hp;
    wound.absorbed_by_temp = absorbed.temp;

    if absorbed.raw_hp <= 0 && was_active {
        let name = victim.name.clone();
        if triggers::survive_lethal(scene, target, source) {
            if let Some(victim) = scene.get_mut(target) {
                victim.current_hp = 1.min(victim.max_hp);
                victim.status = LifeStatus::Active;
            }
            wound.survived = true;
            scene.say(format!("{name} refuses to fall and stays standing at 1 HP"));
        } else {
            let status = status_for(absorbed.raw_hp);
            if let Some(victim) = scene.get_mut(target) {
                victim.status = status;
            }
            wound.dropped = true;
            debug!(participant = %target, %status, "participant dropped");
            scene.say(format!("{name} is {status}"));
            if let Some(killer) = source.filter(|killer| *killer != target) {
                triggers::on_kill(scene, killer, target);
            }
        }
    } else if absorbed.raw_hp < 0 {
        // already down: further damage kills
        if let Some(victim) = scene.get_mut(target) {
            victim.status = LifeStatus::Dead;
        }
    }
    wound
}

/// First damage redirection carried by `participant`: `(guardian, percent)`.
fn redirect_of(participant: &Participant) -> Option<(ParticipantId, u32)> {
    participant.effects.iter().find_map(|effect| {
        let source = effect.source.filter(|source| *source != participant.id)?;
        let percent = effect
            .effects
            .iter()
            .find(|entry| normalize_tag(&entry.stat) == "redirect_damage")?
            .value;
        (percent > 0).then_some((source, percent.min(100) as u32))
    })
}
