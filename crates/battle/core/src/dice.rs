//! Dice notation (`NdM`, `NdM+K`, `NdM-K`, `K`).
//!
//! The engine never rolls: callers supply the rolled faces. Dice expressions
//! are only used to add the flat modifier, compute averages for riders and
//! counters, and maxima for critical hits.

use core::fmt;

use tracing::warn;

/// Parsed dice expression. The empty expression evaluates to 0 everywhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpr {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Parses dice notation. Malformed input yields the empty expression.
    pub fn parse(notation: &str) -> Self {
        match Self::try_parse(notation) {
            Some(expr) => expr,
            None => {
                if !notation.trim().is_empty() {
                    warn!(notation, "malformed dice notation, treating as 0");
                }
                Self::default()
            }
        }
    }

    fn try_parse(notation: &str) -> Option<Self> {
        let compact: String = notation
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if compact.is_empty() {
            return None;
        }

        let Some(d) = compact.find('d') else {
            let modifier = compact.parse::<i32>().ok()?;
            return Some(Self::new(0, 0, modifier));
        };

        let count = match &compact[..d] {
            "" => 1,
            digits => digits.parse::<u32>().ok()?,
        };
        let rest = &compact[d + 1..];
        let split = rest.find(['+', '-']).unwrap_or(rest.len());
        let sides = rest[..split].parse::<u32>().ok()?;
        let modifier = match &rest[split..] {
            "" => 0,
            tail => tail.parse::<i32>().ok()?,
        };
        if sides == 0 {
            return None;
        }
        Some(Self::new(count, sides, modifier))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Expected value of the expression.
    pub fn average(&self) -> f64 {
        f64::from(self.count) * (f64::from(self.sides) + 1.0) / 2.0 + f64::from(self.modifier)
    }

    /// Maximum value of the expression.
    pub fn maximum(&self) -> i64 {
        i64::from(self.count) * i64::from(self.sides) + i64::from(self.modifier)
    }

    /// Sum of the caller-supplied faces, without the modifier.
    pub fn sum_faces(&self, faces: &[u32]) -> i64 {
        faces.iter().map(|&face| i64::from(face)).sum()
    }

    /// Sum of the faces plus the modifier.
    pub fn total(&self, faces: &[u32]) -> i64 {
        self.sum_faces(faces) + i64::from(self.modifier)
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "{}", self.modifier);
        }
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// Floored average of a notation string.
pub fn average_of(notation: &str) -> i64 {
    DiceExpr::parse(notation).average().floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!(DiceExpr::parse("2d6+3"), DiceExpr::new(2, 6, 3));
        assert_eq!(DiceExpr::parse("d8"), DiceExpr::new(1, 8, 0));
        assert_eq!(DiceExpr::parse(" 1D10 - 1 "), DiceExpr::new(1, 10, -1));
        assert_eq!(DiceExpr::parse("4"), DiceExpr::new(0, 0, 4));
    }

    #[test]
    fn malformed_is_empty() {
        assert!(DiceExpr::parse("2x6").is_empty());
        assert!(DiceExpr::parse("d").is_empty());
        assert!(DiceExpr::parse("1d0").is_empty());
        assert!(DiceExpr::parse("").is_empty());
        assert_eq!(DiceExpr::parse("junk").average(), 0.0);
    }

    #[test]
    fn average_and_maximum() {
        let expr = DiceExpr::parse("2d6+1");
        assert_eq!(expr.average(), 8.0);
        assert_eq!(expr.maximum(), 13);
        assert_eq!(average_of("1d6"), 3);
        assert_eq!(average_of("1d8"), 4);
    }

    #[test]
    fn totals_add_modifier_to_faces() {
        let expr = DiceExpr::parse("2d6+2");
        assert_eq!(expr.sum_faces(&[5, 4]), 9);
        assert_eq!(expr.total(&[3]), 5);
        assert_eq!(expr.to_string(), "2d6+2");
    }
}
