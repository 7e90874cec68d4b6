//! Data-defined skills: effects and triggers.
//!
//! Skill data is authored outside the engine, so every tag here accepts
//! unknown values (`Other`) instead of failing to load. The trigger engine
//! treats unknown values as "no effect".

use core::fmt;
use core::str::FromStr;

/// Named point in the resolution pipeline at which skills are checked.
#[derive(Clone, Debug, PartialEq, Eq, Hash, strum::EnumString)]
#[strum(serialize_all = "camelCase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum Hook {
    StartRound,
    Passive,
    OnBattleStart,
    BeforeAttack,
    AfterAttack,
    BeforeEnemyAttack,
    AfterEnemyAttack,
    BeforeSpellCast,
    AfterSpellCast,
    OnHit,
    OnKill,
    SurviveLethal,
    BonusAction,
    LowHp,
    AllyLowHp,
    #[strum(default)]
    Other(String),
}

impl Hook {
    pub fn as_str(&self) -> &str {
        match self {
            Hook::StartRound => "startRound",
            Hook::Passive => "passive",
            Hook::OnBattleStart => "onBattleStart",
            Hook::BeforeAttack => "beforeAttack",
            Hook::AfterAttack => "afterAttack",
            Hook::BeforeEnemyAttack => "beforeEnemyAttack",
            Hook::AfterEnemyAttack => "afterEnemyAttack",
            Hook::BeforeSpellCast => "beforeSpellCast",
            Hook::AfterSpellCast => "afterSpellCast",
            Hook::OnHit => "onHit",
            Hook::OnKill => "onKill",
            Hook::SurviveLethal => "surviveLethal",
            Hook::BonusAction => "bonusAction",
            Hook::LowHp => "lowHp",
            Hook::AllyLowHp => "allyLowHp",
            Hook::Other(name) => name,
        }
    }

    /// Hooks at which condition-based (complex) triggers are evaluated.
    pub fn evaluates_conditions(&self) -> bool {
        matches!(self, Hook::StartRound | Hook::BeforeAttack)
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Hook {
    fn from(value: String) -> Self {
        Hook::from_str(&value).unwrap_or(Hook::Other(value))
    }
}

impl From<Hook> for String {
    fn from(value: Hook) -> Self {
        value.as_str().to_string()
    }
}

/// How a skill effect's value is interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum SkillEffectKind {
    Percent,
    Flat,
    Formula,
    Dice,
    Flag,
    Ignore,
    Stack,
    Min,
    #[strum(default)]
    Other(String),
}

impl SkillEffectKind {
    pub fn as_str(&self) -> &str {
        match self {
            SkillEffectKind::Percent => "percent",
            SkillEffectKind::Flat => "flat",
            SkillEffectKind::Formula => "formula",
            SkillEffectKind::Dice => "dice",
            SkillEffectKind::Flag => "flag",
            SkillEffectKind::Ignore => "ignore",
            SkillEffectKind::Stack => "stack",
            SkillEffectKind::Min => "min",
            SkillEffectKind::Other(name) => name,
        }
    }
}

impl From<String> for SkillEffectKind {
    fn from(value: String) -> Self {
        SkillEffectKind::from_str(&value).unwrap_or(SkillEffectKind::Other(value))
    }
}

impl From<SkillEffectKind> for String {
    fn from(value: SkillEffectKind) -> Self {
        value.as_str().to_string()
    }
}

/// Raw value of a skill effect: a number, or a formula/dice string.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum EffectValue {
    Number(i32),
    Text(String),
}

impl EffectValue {
    /// Numeric value; text that is not a plain integer reads as 0.
    pub fn number(&self) -> i32 {
        match self {
            EffectValue::Number(value) => *value,
            EffectValue::Text(text) => text.trim().parse().unwrap_or(0),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            EffectValue::Number(_) => None,
            EffectValue::Text(text) => Some(text),
        }
    }
}

impl Default for EffectValue {
    fn default() -> Self {
        EffectValue::Number(0)
    }
}

/// Who a skill effect lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EffectTarget {
    #[strum(serialize = "self")]
    #[cfg_attr(feature = "serde", serde(rename = "self"))]
    Owner,
    Target,
    Allies,
    Enemies,
    All,
}

/// One discrete effect of a skill. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillEffect {
    pub stat: String,
    pub kind: SkillEffectKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: EffectValue,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_percentage: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: Option<EffectTarget>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_triggers: Option<u32>,
}

impl SkillEffect {
    pub fn new(stat: &str, kind: SkillEffectKind, value: EffectValue) -> Self {
        let is_percentage = kind == SkillEffectKind::Percent;
        Self {
            stat: stat.to_string(),
            kind,
            value,
            is_percentage,
            duration: None,
            target: None,
            max_triggers: None,
        }
    }

    pub fn percent(stat: &str, value: i32) -> Self {
        Self::new(stat, SkillEffectKind::Percent, EffectValue::Number(value))
    }

    pub fn flat(stat: &str, value: i32) -> Self {
        Self::new(stat, SkillEffectKind::Flat, EffectValue::Number(value))
    }

    pub fn flag(stat: &str) -> Self {
        Self::new(stat, SkillEffectKind::Flag, EffectValue::Number(1))
    }

    pub fn formula(stat: &str, formula: &str) -> Self {
        Self::new(
            stat,
            SkillEffectKind::Formula,
            EffectValue::Text(formula.to_string()),
        )
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_target(mut self, target: EffectTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_max_triggers(mut self, max_triggers: u32) -> Self {
        self.max_triggers = Some(max_triggers);
        self
    }

    /// True when the value is a percentage rather than a flat amount.
    pub fn is_percent(&self) -> bool {
        self.is_percentage || self.kind == SkillEffectKind::Percent
    }
}

/// Usage-limiting modifiers attached to a trigger.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TriggerModifiers {
    /// Chance to fire, as a fraction (`0.25`) or a percentage (`25`).
    pub probability: Option<f64>,
    pub once_per_battle: bool,
    pub twice_per_battle: bool,
}

impl TriggerModifiers {
    pub fn once() -> Self {
        Self {
            once_per_battle: true,
            ..Self::default()
        }
    }

    pub fn twice() -> Self {
        Self {
            twice_per_battle: true,
            ..Self::default()
        }
    }

    pub fn chance(probability: f64) -> Self {
        Self {
            probability: Some(probability),
            ..Self::default()
        }
    }
}

/// Comparison operator of a complex trigger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum Comparison {
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "=", serialize = "==")]
    Equal,
    #[strum(serialize = "<=")]
    LessOrEqual,
    #[strum(serialize = ">=")]
    GreaterOrEqual,
    #[strum(default)]
    Other(String),
}

impl Comparison {
    pub fn as_str(&self) -> &str {
        match self {
            Comparison::Greater => ">",
            Comparison::Less => "<",
            Comparison::Equal => "=",
            Comparison::LessOrEqual => "<=",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Other(op) => op,
        }
    }

    /// Applies the operator; unknown operators never hold.
    pub fn holds(&self, left: i64, right: i64) -> bool {
        match self {
            Comparison::Greater => left > right,
            Comparison::Less => left < right,
            Comparison::Equal => left == right,
            Comparison::LessOrEqual => left <= right,
            Comparison::GreaterOrEqual => left >= right,
            Comparison::Other(_) => false,
        }
    }
}

impl From<String> for Comparison {
    fn from(value: String) -> Self {
        Comparison::from_str(value.trim()).unwrap_or(Comparison::Other(value))
    }
}

impl From<Comparison> for String {
    fn from(value: Comparison) -> Self {
        value.as_str().to_string()
    }
}

/// Roster slice a complex trigger quantifies over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TriggerTarget {
    Ally,
    Enemy,
    #[strum(serialize = "self")]
    #[cfg_attr(feature = "serde", serde(rename = "self"))]
    Owner,
}

/// Whether a complex trigger compares raw values or percentages of a maximum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValueType {
    #[default]
    Number,
    Percent,
}

/// When a skill fires.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillTrigger {
    /// Enumerated hook.
    Simple {
        trigger: Hook,
        #[cfg_attr(feature = "serde", serde(default))]
        modifiers: TriggerModifiers,
    },
    /// Stat comparison that must hold for at least one participant.
    Complex {
        target: TriggerTarget,
        operator: Comparison,
        value: i32,
        #[cfg_attr(feature = "serde", serde(default))]
        value_type: ValueType,
        stat: String,
        #[cfg_attr(feature = "serde", serde(default))]
        modifiers: TriggerModifiers,
    },
}

impl SkillTrigger {
    pub fn simple(trigger: Hook) -> Self {
        SkillTrigger::Simple {
            trigger,
            modifiers: TriggerModifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, new_modifiers: TriggerModifiers) -> Self {
        match &mut self {
            SkillTrigger::Simple { modifiers, .. } | SkillTrigger::Complex { modifiers, .. } => {
                *modifiers = new_modifiers;
            }
        }
        self
    }

    pub fn modifiers(&self) -> &TriggerModifiers {
        match self {
            SkillTrigger::Simple { modifiers, .. } | SkillTrigger::Complex { modifiers, .. } => {
                modifiers
            }
        }
    }

    /// True if this trigger is queried at `hook`.
    pub fn listens_to(&self, hook: &Hook) -> bool {
        match self {
            SkillTrigger::Simple { trigger, .. } => trigger == hook,
            SkillTrigger::Complex { .. } => hook.evaluates_conditions(),
        }
    }
}

/// An unlocked skill with its effect payload and triggers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveSkill {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<SkillEffect>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub triggers: Vec<SkillTrigger>,
}

impl ActiveSkill {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            effects: Vec::new(),
            triggers: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: SkillEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_trigger(mut self, trigger: SkillTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Skills without triggers apply their effects unconditionally.
    pub fn is_static(&self) -> bool {
        self.triggers.is_empty()
    }

    /// First effect whose tag equals `stat` (case-insensitive).
    pub fn effect(&self, stat: &str) -> Option<&SkillEffect> {
        self.effects
            .iter()
            .find(|effect| effect.stat.eq_ignore_ascii_case(stat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_parses_known_and_unknown_names() {
        assert_eq!(Hook::from("onHit".to_string()), Hook::OnHit);
        assert_eq!(
            Hook::from("beforeEnemyAttack".to_string()),
            Hook::BeforeEnemyAttack
        );
        assert_eq!(
            Hook::from("onFullMoon".to_string()),
            Hook::Other("onFullMoon".to_string())
        );
        assert_eq!(Hook::OnBattleStart.to_string(), "onBattleStart");
    }

    #[test]
    fn comparison_operators() {
        assert!(Comparison::from(">=".to_string()).holds(5, 5));
        assert!(Comparison::from("==".to_string()).holds(3, 3));
        assert!(!Comparison::from("~".to_string()).holds(1, 1));
    }

    #[test]
    fn effect_value_reads_numeric_text() {
        assert_eq!(EffectValue::Text(" 12 ".to_string()).number(), 12);
        assert_eq!(EffectValue::Text("2d6".to_string()).number(), 0);
        assert_eq!(
            SkillEffectKind::from("STACK".to_string()),
            SkillEffectKind::Stack
        );
    }
}
