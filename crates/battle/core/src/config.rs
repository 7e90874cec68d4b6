/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// HP percentage at or below which a participant counts as "low HP" when a
    /// passive or trigger does not carry its own threshold.
    pub low_hp_threshold: u32,

    /// Counter-attack bonus used when a `counter_damage` effect carries no
    /// explicit percent (15 = ×1.15).
    pub counter_bonus_percent: u32,

    /// Race tag that always acts first, regardless of rolled initiative.
    pub pinned_race: String,

    /// Initiative value assigned to the pinned race.
    pub pinned_initiative: i32,

    /// Race tags that roll ranged attacks with advantage.
    pub advantage_races: Vec<String>,

    /// Difficulty of a morale check (`d20 + morale >= dc` passes).
    pub morale_dc: i32,

    /// Base seed for internal probability and critical-table draws.
    pub seed: u64,
}

impl BattleConfig {
    // ===== compile-time bounds =====
    pub const MORALE_MIN: i8 = -3;
    pub const MORALE_MAX: i8 = 3;
    pub const MAX_SPELL_LEVEL: u8 = 9;
    /// Duration used for skill-granted effects that omit one.
    pub const DEFAULT_EFFECT_DURATION: u32 = 2;
    /// Duration used for DOT effects that omit one.
    pub const DEFAULT_DOT_DURATION: u32 = 3;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_LOW_HP_THRESHOLD: u32 = 15;
    pub const DEFAULT_COUNTER_BONUS_PERCENT: u32 = 15;
    pub const DEFAULT_PINNED_INITIATIVE: i32 = 999;
    pub const DEFAULT_MORALE_DC: i32 = 10;

    pub fn new() -> Self {
        Self {
            low_hp_threshold: Self::DEFAULT_LOW_HP_THRESHOLD,
            counter_bonus_percent: Self::DEFAULT_COUNTER_BONUS_PERCENT,
            pinned_race: "fey".to_string(),
            pinned_initiative: Self::DEFAULT_PINNED_INITIATIVE,
            advantage_races: vec!["elf".to_string()],
            morale_dc: Self::DEFAULT_MORALE_DC,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns true if the race tag grants advantage on ranged attacks.
    pub fn has_ranged_advantage(&self, race: &str) -> bool {
        let race = race.to_ascii_lowercase();
        self.advantage_races
            .iter()
            .any(|tag| race.contains(&tag.to_ascii_lowercase()))
    }

    /// Returns true if the race tag is pinned to the front of the order.
    pub fn is_pinned_race(&self, race: &str) -> bool {
        !self.pinned_race.is_empty() && race.eq_ignore_ascii_case(&self.pinned_race)
    }

    /// Clamps a morale value into the allowed range.
    pub fn clamp_morale(value: i32) -> i8 {
        value.clamp(Self::MORALE_MIN as i32, Self::MORALE_MAX as i32) as i8
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
