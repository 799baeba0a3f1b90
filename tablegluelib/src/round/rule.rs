//! Rounding rules: one digit count per band of magnitudes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::TableGlueError;
use crate::Result;

/// Largest digit count the decimal engine can represent.
pub const MAX_DIGITS: u32 = 28;

/// How exact halfway cases are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TieBreak {
    /// Ties go away from zero (2.5 -> 3, -2.5 -> -3)
    #[default]
    #[serde(rename = "up")]
    HalfUp,
    /// Ties go to the even neighbour (2.5 -> 2, 3.5 -> 4)
    #[serde(rename = "even")]
    HalfEven,
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "half_up" | "half-up" => Ok(TieBreak::HalfUp),
            "even" | "half_even" | "half-even" | "bankers" => Ok(TieBreak::HalfEven),
            _ => Err(format!("Unknown tie-break mode: {}", s)),
        }
    }
}

/// A single band `[lower, upper)` of absolute magnitudes and the digits used inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundingRule {
    /// Inclusive lower bound of `|value|`
    pub lower: f64,
    /// Exclusive upper bound of `|value|`
    pub upper: f64,
    /// Digit count (decimal places or significant figures, see `DigitsMode`)
    pub digits: u32,
    /// Per-rule override of the spec-wide tie-break
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_break: Option<TieBreak>,
}

impl RoundingRule {
    /// Create a rule without a tie-break override.
    pub fn new(lower: f64, upper: f64, digits: u32) -> Self {
        Self {
            lower,
            upper,
            digits,
            tie_break: None,
        }
    }

    /// A rule covering every magnitude.
    pub fn everywhere(digits: u32) -> Self {
        Self::new(0.0, f64::INFINITY, digits)
    }

    /// Builder: override the tie-break for this rule only
    pub fn with_tie_break(mut self, mode: TieBreak) -> Self {
        self.tie_break = Some(mode);
        self
    }

    /// Check whether a magnitude falls inside `[lower, upper)`.
    pub fn contains(&self, magnitude: f64) -> bool {
        magnitude >= self.lower && magnitude < self.upper
    }
}

/// Build contiguous rules from parallel digit/break sequences.
///
/// `breaks[i]` is the exclusive upper bound of the band rounded with `digits[i]`.
pub(crate) fn rules_from_breaks(digits: &[u32], breaks: &[f64]) -> Result<Vec<RoundingRule>> {
    if digits.len() != breaks.len() {
        return Err(TableGlueError::config(format!(
            "{} digit counts given for {} breaks",
            digits.len(),
            breaks.len()
        )));
    }

    let mut lower = 0.0;
    let rules: Vec<RoundingRule> = digits
        .iter()
        .zip(breaks)
        .map(|(&d, &upper)| {
            let rule = RoundingRule::new(lower, upper, d);
            lower = upper;
            rule
        })
        .collect();

    validate_rules(&rules)?;
    Ok(rules)
}

/// Check that rules partition `[0, +inf)` with no gaps or overlaps.
pub(crate) fn validate_rules(rules: &[RoundingRule]) -> Result<()> {
    let Some(first) = rules.first() else {
        return Err(TableGlueError::config("at least one rule is required"));
    };

    if first.lower != 0.0 && first.lower != f64::NEG_INFINITY {
        return Err(TableGlueError::config(format!(
            "first rule must start at 0, found {}",
            first.lower
        )));
    }

    for (i, rule) in rules.iter().enumerate() {
        if rule.digits > MAX_DIGITS {
            return Err(TableGlueError::config(format!(
                "rule {} asks for {} digits, at most {} are supported",
                i, rule.digits, MAX_DIGITS
            )));
        }
        if rule.upper.is_nan() || rule.upper <= rule.lower {
            return Err(TableGlueError::config(format!(
                "breaks must be strictly increasing, rule {} spans [{}, {})",
                i, rule.lower, rule.upper
            )));
        }
        if let Some(next) = rules.get(i + 1) {
            if rule.upper == f64::INFINITY {
                return Err(TableGlueError::config(format!(
                    "rule {} already reaches infinity but more rules follow",
                    i
                )));
            }
            if next.lower != rule.upper {
                return Err(TableGlueError::config(format!(
                    "gap or overlap between rule {} (ends at {}) and rule {} (starts at {})",
                    i,
                    rule.upper,
                    i + 1,
                    next.lower
                )));
            }
        }
    }

    if let Some(last) = rules.last() {
        if last.upper != f64::INFINITY {
            return Err(TableGlueError::config(format!(
                "last break must be infinity, found {}",
                last.upper
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_break_from_str() {
        assert_eq!("up".parse::<TieBreak>().unwrap(), TieBreak::HalfUp);
        assert_eq!("EVEN".parse::<TieBreak>().unwrap(), TieBreak::HalfEven);
        assert_eq!("bankers".parse::<TieBreak>().unwrap(), TieBreak::HalfEven);
        assert!("sideways".parse::<TieBreak>().is_err());
    }

    #[test]
    fn test_rules_from_breaks() {
        let rules = rules_from_breaks(&[2, 1, 0], &[1.0, 10.0, f64::INFINITY]).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].lower, 0.0);
        assert_eq!(rules[1].lower, 1.0);
        assert_eq!(rules[1].upper, 10.0);
        assert_eq!(rules[2].upper, f64::INFINITY);
        assert!(rules[0].contains(0.5));
        assert!(!rules[0].contains(1.0));
        assert!(rules[1].contains(1.0));
    }

    #[test]
    fn test_rules_from_breaks_rejects_length_mismatch() {
        let err = rules_from_breaks(&[2, 1], &[f64::INFINITY]).unwrap_err();
        assert!(matches!(err, TableGlueError::Config(_)));
    }

    #[test]
    fn test_rules_from_breaks_rejects_unsorted() {
        assert!(rules_from_breaks(&[2, 1, 0], &[10.0, 1.0, f64::INFINITY]).is_err());
        assert!(rules_from_breaks(&[2, 1, 0], &[1.0, 1.0, f64::INFINITY]).is_err());
        assert!(rules_from_breaks(&[2, 1], &[f64::NAN, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_rules_from_breaks_requires_infinity() {
        assert!(rules_from_breaks(&[2, 1], &[1.0, 100.0]).is_err());
        assert!(rules_from_breaks(&[2, 1], &[f64::INFINITY, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_validate_rules_rejects_gap() {
        let rules = vec![
            RoundingRule::new(0.0, 1.0, 2),
            RoundingRule::new(2.0, f64::INFINITY, 1),
        ];
        assert!(validate_rules(&rules).is_err());
    }

    #[test]
    fn test_validate_rules_rejects_too_many_digits() {
        assert!(validate_rules(&[RoundingRule::everywhere(29)]).is_err());
        assert!(validate_rules(&[RoundingRule::everywhere(28)]).is_ok());
    }

    #[test]
    fn test_validate_rules_accepts_negative_infinity_start() {
        let rules = vec![RoundingRule::new(f64::NEG_INFINITY, f64::INFINITY, 1)];
        assert!(validate_rules(&rules).is_ok());
    }

    #[test]
    fn test_validate_rules_rejects_empty() {
        assert!(validate_rules(&[]).is_err());
    }
}
