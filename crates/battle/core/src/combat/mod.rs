//! Attack resolution.
//!
//! [`attack::resolve_attack`] runs the whole pipeline:
//! hooks → [`hit`] roll → [`critical`] draw → [`damage`] stack →
//! [`resistance`] → [`vitals`] → on-hit/on-kill hooks → [`reaction`].
//! The spell pipeline reuses the same damage, resistance and vitals steps.
pub mod attack;
pub mod critical;
pub mod damage;
pub mod hit;
pub mod reaction;
pub mod resistance;
pub mod vitals;

pub use attack::{AttackResolution, AttackRolls, resolve_attack};
pub use damage::{DamageInput, DamageRoll, compute_damage, static_bonuses};
pub use hit::{HitInput, HitRoll, resolve_hit};
pub use resistance::{Resisted, resist};
pub use vitals::{Wound, heal, inflict};
