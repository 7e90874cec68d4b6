//! Active effect ledger: add, tick and expire effects on one participant.

use tracing::debug;

use crate::state::{ActiveEffect, AppliedAt, Participant};
use crate::stats::normalize_tag;

/// Appends `effect` stamped with the current round and logical clock.
///
/// Effects never deduplicate: applying the same buff twice stacks it.
pub fn add_active_effect(participant: &mut Participant, mut effect: ActiveEffect, round: u32, clock: u64) {
    effect.applied_at = AppliedAt {
        round,
        timestamp: clock,
    };
    if effect.id.is_empty() {
        effect.id = format!(
            "{}-{}-{}",
            normalize_tag(&effect.name),
            clock,
            participant.effects.len()
        );
    }
    debug!(
        participant = %participant.id,
        effect = %effect.name,
        duration = effect.duration,
        "effect applied"
    );
    participant.effects.push(effect);
}

/// Applies every DOT in insertion order. HP never drops below 0.
///
/// Returns one narration line per tick.
pub fn apply_dot_effects(participant: &mut Participant) -> Vec<String> {
    let mut messages = Vec::new();
    let ticks: Vec<(String, u32, String)> = participant
        .effects
        .iter()
        .filter_map(|effect| {
            effect.dot_damage.as_ref().map(|dot| {
                (
                    effect.name.clone(),
                    dot.damage_per_round,
                    dot.damage_type.clone(),
                )
            })
        })
        .collect();

    for (name, amount, damage_type) in ticks {
        participant.current_hp = participant.current_hp.saturating_sub(amount);
        messages.push(format!(
            "{} takes {} {} damage from {} ({} HP left)",
            participant.name, amount, damage_type, name, participant.current_hp
        ));
    }
    messages
}

/// Decrements every duration by one and removes effects that reach zero.
///
/// Returns the names of expired effects in their original order.
pub fn decrease_effect_durations(participant: &mut Participant) -> Vec<String> {
    let mut expired = Vec::new();
    participant.effects.retain_mut(|effect| {
        effect.duration = effect.duration.saturating_sub(1);
        if effect.duration == 0 {
            expired.push(effect.name.clone());
            false
        } else {
            true
        }
    });
    if !expired.is_empty() {
        debug!(participant = %participant.id, ?expired, "effects expired");
    }
    expired
}

/// Removes every debuff and condition. Returns the removed names.
pub fn clear_negative_effects(participant: &mut Participant) -> Vec<String> {
    let mut removed = Vec::new();
    participant.effects.retain(|effect| {
        if effect.kind.is_negative() {
            removed.push(effect.name.clone());
            false
        } else {
            true
        }
    });
    removed
}
