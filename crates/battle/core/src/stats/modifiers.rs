//! Modifier math: stat-tag matching, percent bonuses and breakdown lines.

use core::str::FromStr;

/// Canonical attack type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AttackType {
    Melee,
    Ranged,
    Spell,
}

impl AttackType {
    /// Reads the free-form attack type strings found in older unit data.
    ///
    /// Anything mentioning a bow, sling or throw is ranged, anything magical is
    /// a spell, everything else is melee.
    pub fn from_legacy(value: &str) -> Self {
        if let Ok(kind) = AttackType::from_str(value.trim()) {
            return kind;
        }
        let tag = normalize_tag(value);
        if ["ranged", "bow", "sling", "throw", "missile"]
            .iter()
            .any(|needle| tag.contains(needle))
        {
            AttackType::Ranged
        } else if ["spell", "magic", "arcane"].iter().any(|needle| tag.contains(needle)) {
            AttackType::Spell
        } else {
            AttackType::Melee
        }
    }

    pub fn category(self) -> DamageCategory {
        match self {
            AttackType::Melee | AttackType::Ranged => DamageCategory::Physical,
            AttackType::Spell => DamageCategory::Spell,
        }
    }
}

/// Resistance category of a damage instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DamageCategory {
    Physical,
    Spell,
}

impl DamageCategory {
    /// Weapon damage types are physical; every other damage type is resisted
    /// as spell damage.
    pub fn of_damage_type(damage_type: &str) -> Self {
        match normalize_tag(damage_type).as_str() {
            "physical" | "slashing" | "piercing" | "bludgeoning" | "weapon" => {
                DamageCategory::Physical
            }
            _ => DamageCategory::Spell,
        }
    }
}

/// Lower-cases a tag and folds spaces and dashes into underscores.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Tags that raise damage of every attack type.
const GENERIC_DAMAGE_TAGS: [&str; 4] = ["damage", "all_damage", "bonus_damage", "damage_bonus"];

/// True if a damage stat tag applies to `attack_type`.
///
/// Matching is permissive: `melee_damage`, `Melee Damage` and
/// `melee_weapon_damage` all match melee attacks, `physical_damage` matches
/// melee and ranged, `spell_damage`/`magic_damage` match spells, and the
/// generic tags match everything. Tags without `damage` never match.
pub fn matches_attack_type(stat: &str, attack_type: AttackType) -> bool {
    let tag = normalize_tag(stat);
    if !tag.contains("damage") {
        return false;
    }
    if GENERIC_DAMAGE_TAGS.contains(&tag.as_str()) {
        return true;
    }
    match attack_type {
        AttackType::Melee => tag.contains("melee") || is_physical(&tag),
        AttackType::Ranged => tag.contains("ranged") || is_physical(&tag),
        AttackType::Spell => tag.contains("spell") || tag.contains("magic"),
    }
}

fn is_physical(tag: &str) -> bool {
    tag.contains("physical") || tag.contains("weapon")
}

/// `floor(base * percent / 100)`, or 0 when `percent` is not positive.
pub fn percent_bonus(base: i64, percent: i64) -> i64 {
    if percent <= 0 {
        return 0;
    }
    (base * percent).div_euclid(100)
}

/// `+N` / `-N`.
pub fn signed(value: i64) -> String {
    if value >= 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

/// Narrows an effect value to `i32`, pinning out-of-range values to the bounds.
pub fn saturating_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Narrows a non-negative amount to `u32`; negatives become 0.
pub fn saturating_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// `"{label}: +N%"`, or an empty string for a zero contribution.
pub fn format_percent(label: &str, percent: i64) -> String {
    if percent == 0 {
        return String::new();
    }
    format!("{label}: {}%", signed(percent))
}

/// `"{label}: +N"`, or an empty string for a zero contribution.
pub fn format_flat(label: &str, value: i64) -> String {
    if value == 0 {
        return String::new();
    }
    format!("{label}: {}", signed(value))
}

/// Drops the empty lines produced by zero contributions.
pub fn non_empty(lines: impl IntoIterator<Item = String>) -> Vec<String> {
    lines.into_iter().filter(|line| !line.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_tags() {
        assert_eq!(normalize_tag(" Melee Damage "), "melee_damage");
        assert_eq!(normalize_tag("Spell-Damage"), "spell_damage");
    }

    #[test]
    fn narrowing_saturates() {
        assert_eq!(saturating_i32(-12), -12);
        assert_eq!(saturating_i32(i64::from(i32::MAX) + 1), i32::MAX);
        assert_eq!(saturating_i32(-(1 << 40)), i32::MIN);
        assert_eq!(saturating_u32(-5), 0);
        assert_eq!(saturating_u32(1 << 40), u32::MAX);
    }

    #[test]
    fn damage_types_map_to_categories() {
        assert_eq!(DamageCategory::of_damage_type("Piercing"), DamageCategory::Physical);
        assert_eq!(DamageCategory::of_damage_type("weapon"), DamageCategory::Physical);
        assert_eq!(DamageCategory::of_damage_type("fire"), DamageCategory::Spell);
        assert_eq!(DamageCategory::of_damage_type("elemental"), DamageCategory::Spell);
    }

    #[test]
    fn attack_type_matching_is_permissive() {
        assert!(matches_attack_type("melee_damage", AttackType::Melee));
        assert!(matches_attack_type("Melee Weapon Damage", AttackType::Melee));
        assert!(!matches_attack_type("melee_damage", AttackType::Ranged));
        assert!(matches_attack_type("physical_damage", AttackType::Ranged));
        assert!(!matches_attack_type("physical_damage", AttackType::Spell));
        assert!(matches_attack_type("magic_damage", AttackType::Spell));
        assert!(matches_attack_type("damage", AttackType::Ranged));
        assert!(!matches_attack_type("fire_damage", AttackType::Melee));
        assert!(!matches_attack_type("melee", AttackType::Melee));
    }

    #[test]
    fn percent_bonus_floors_and_ignores_non_positive() {
        assert_eq!(percent_bonus(12, 35), 4);
        assert_eq!(percent_bonus(7, 10), 0);
        assert_eq!(percent_bonus(12, 0), 0);
        assert_eq!(percent_bonus(12, -20), 0);
    }

    #[test]
    fn formatters_skip_zero() {
        assert_eq!(format_percent("Skill Rage", 25), "Skill Rage: +25%");
        assert_eq!(format_flat("Artifact Ring", -2), "Artifact Ring: -2");
        assert!(format_flat("Nothing", 0).is_empty());
        assert_eq!(
            non_empty(vec!["a".to_string(), String::new(), "b".to_string()]),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn legacy_attack_types() {
        assert_eq!(AttackType::from_legacy("Ranged"), AttackType::Ranged);
        assert_eq!(AttackType::from_legacy("longbow"), AttackType::Ranged);
        assert_eq!(AttackType::from_legacy("magic missile"), AttackType::Ranged);
        assert_eq!(AttackType::from_legacy("arcane bolt"), AttackType::Spell);
        assert_eq!(AttackType::from_legacy("greatsword"), AttackType::Melee);
    }
}
