//! Stat math shared by every resolution pipeline.
//!
//! - [`modifiers`]: tag normalization, attack-type matching, percent math and
//!   breakdown formatting
//! - [`accessors`]: effective AC/speed/morale/initiative and roster lookups
//! - [`bonus`]: ordered damage/heal contribution stack
pub mod accessors;
pub mod bonus;
pub mod modifiers;

pub use accessors::{
    allies, bonus_attack, effective_ac, effective_initiative, effective_morale, effective_speed,
    has_any_ally_low_hp, has_flag, max_percent, opponents,
};
pub use bonus::{BonusStack, Contribution, StackTotal};
pub use modifiers::{
    AttackType, DamageCategory, format_flat, format_percent, matches_attack_type, non_empty,
    normalize_tag, percent_bonus, saturating_i32, saturating_u32, signed,
};
