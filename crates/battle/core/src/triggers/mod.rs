//! Trigger engine.
//!
//! For every skill of the hook owner:
//! 1. skip skills with no trigger listening to the hook
//! 2. evaluate the trigger condition ([`condition`])
//! 3. check usage modifiers ([`usage`]); a block aborts with no side effects
//! 4. record the use and dispatch each effect by stat tag ([`dispatch`])
//!
//! [`hooks`] wraps the per-family entry points the pipelines call;
//! [`bonus_action`] resolves skills used as a bonus action.
pub mod bonus_action;
pub mod condition;
pub mod dispatch;
pub mod hooks;
pub mod usage;

use bitflags::bitflags;

pub use bonus_action::{BonusActionOutcome, use_bonus_action};
pub use hooks::{
    after_attack, after_spell_cast, before_attack, before_spell_cast, on_battle_start, on_hit,
    on_kill, run_hook, start_of_turn, survive_lethal,
};
pub use usage::UsageGate;

use crate::state::{Hook, ParticipantId};
use crate::stats::{AttackType, BonusStack};

bitflags! {
    /// Flags raised by fired effects for the current resolution.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TriggerFlags: u16 {
        const IGNORE_RESISTANCE = 1 << 0;
        const GUARANTEED_HIT    = 1 << 1;
        const AREA              = 1 << 2;
        const ADVANTAGE         = 1 << 3;
        const FIRST_STRIKE      = 1 << 4;
        const SURVIVED          = 1 << 5;
        const REDIRECT          = 1 << 6;
        const UPGRADE           = 1 << 7;
    }
}

/// Where a hook runs and against whom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookContext {
    pub hook: Hook,
    pub owner: ParticipantId,
    /// The other side of the interaction (attack target, attacker, explicit
    /// bonus-action targets). Empty for self-contained hooks.
    pub counterparts: Vec<ParticipantId>,
    /// Attack type in play, if the hook runs inside an attack or spell.
    pub attack_type: Option<AttackType>,
}

impl HookContext {
    pub fn new(hook: Hook, owner: ParticipantId) -> Self {
        Self {
            hook,
            owner,
            counterparts: Vec::new(),
            attack_type: None,
        }
    }

    pub fn against(mut self, counterpart: ParticipantId) -> Self {
        self.counterparts.push(counterpart);
        self
    }

    pub fn against_all(mut self, counterparts: &[ParticipantId]) -> Self {
        self.counterparts.extend_from_slice(counterparts);
        self
    }

    pub fn with_attack_type(mut self, attack_type: AttackType) -> Self {
        self.attack_type = Some(attack_type);
        self
    }

    pub fn counterpart(&self) -> Option<ParticipantId> {
        self.counterparts.first().copied()
    }
}

/// Elemental rider queued by a fired effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rider {
    pub label: String,
    pub dice: String,
    pub damage_type: String,
}

/// Accumulated result of one or more hook evaluations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriggerOutput {
    /// Damage contributions for the attack or spell in progress.
    pub damage: BonusStack,
    /// Healing contributions for the spell in progress.
    pub healing: BonusStack,
    pub flags: TriggerFlags,
    pub life_steal_percent: i32,
    /// Minimum damage floor requested by `min` effects.
    pub min_damage: i32,
    pub riders: Vec<Rider>,
    /// Names of the skills that fired, in order.
    pub fired: Vec<String>,
}

impl TriggerOutput {
    pub fn merge(&mut self, other: TriggerOutput) {
        self.damage.extend(other.damage);
        self.healing.extend(other.healing);
        self.flags |= other.flags;
        self.life_steal_percent = self.life_steal_percent.saturating_add(other.life_steal_percent);
        self.min_damage = self.min_damage.max(other.min_damage);
        self.riders.extend(other.riders);
        self.fired.extend(other.fired);
    }

    pub fn has(&self, flag: TriggerFlags) -> bool {
        self.flags.contains(flag)
    }
}
