//! Rounding specifications.
//!
//! A `RoundingSpec` is an immutable value built step by step:
//!
//! ```rust
//! use tablegluelib::{create_default_spec, TieBreak};
//!
//! let spec = create_default_spec()
//!     .with_magnitude_rule(&[2, 1, 1, 0], &[1.0, 10.0, 100.0, f64::INFINITY])
//!     .unwrap()
//!     .with_tie_break(TieBreak::HalfEven);
//!
//! assert_eq!(spec.format(0.5).unwrap(), "0.50");
//! assert_eq!(spec.format(500.0).unwrap(), "500");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rule::{rules_from_breaks, validate_rules, RoundingRule, TieBreak};
use crate::config::SpecConfig;
use crate::Result;

/// How a rule's digit count is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitsMode {
    /// Digits after the decimal point
    Decimal,
    /// Significant figures
    #[default]
    Significant,
}

/// Ordered rounding rules plus presentation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpecConfig", into = "SpecConfig")]
pub struct RoundingSpec {
    pub(crate) mode: DigitsMode,
    pub(crate) rules: Vec<RoundingRule>,
    pub(crate) tie_break: TieBreak,
    pub(crate) missing: Option<String>,
    pub(crate) big_mark: Option<String>,
    pub(crate) decimal_mark: String,
}

/// The starting point for every spec: two significant figures, ties away from zero.
pub fn create_default_spec() -> RoundingSpec {
    RoundingSpec {
        mode: DigitsMode::Significant,
        rules: vec![RoundingRule::everywhere(2)],
        tie_break: TieBreak::HalfUp,
        missing: None,
        big_mark: None,
        decimal_mark: ".".to_string(),
    }
}

impl Default for RoundingSpec {
    fn default() -> Self {
        create_default_spec()
    }
}

impl RoundingSpec {
    /// Same as `create_default_spec()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a decimal-places spec from an explicit rule list.
    ///
    /// Rules must start at 0, be contiguous, and end at infinity.
    /// Rules may carry their own tie-break; the others use `tie_break`.
    pub fn from_rules(rules: Vec<RoundingRule>, tie_break: TieBreak) -> Result<Self> {
        validate_rules(&rules)?;
        Ok(Self {
            mode: DigitsMode::Decimal,
            rules,
            tie_break,
            ..Self::default()
        })
    }

    /// Builder: set the tie-break used by every rule without its own override
    pub fn with_tie_break(mut self, mode: TieBreak) -> Self {
        self.tie_break = mode;
        self
    }

    /// Builder: pick decimal places by magnitude.
    ///
    /// `breaks[i]` is the exclusive upper bound of `|value|` for `digits[i]`.
    /// Breaks must be strictly increasing and end with `f64::INFINITY`.
    pub fn with_magnitude_rule(mut self, digits: &[u32], breaks: &[f64]) -> Result<Self> {
        self.rules = rules_from_breaks(digits, breaks)?;
        self.mode = DigitsMode::Decimal;
        debug!(rules = self.rules.len(), "rounding by magnitude");
        Ok(self)
    }

    /// Builder: a fixed number of decimal places for every value
    pub fn with_decimal_rule(mut self, digits: u32) -> Result<Self> {
        let rules = vec![RoundingRule::everywhere(digits)];
        validate_rules(&rules)?;
        self.rules = rules;
        self.mode = DigitsMode::Decimal;
        Ok(self)
    }

    /// Builder: a fixed number of significant figures for every value
    pub fn with_signif_rule(mut self, digits: u32) -> Result<Self> {
        let rules = vec![RoundingRule::everywhere(digits.max(1))];
        validate_rules(&rules)?;
        self.rules = rules;
        self.mode = DigitsMode::Significant;
        Ok(self)
    }

    /// Builder: render NaN, infinities and missing values as `marker` instead of failing
    pub fn with_missing_marker(mut self, marker: impl Into<String>) -> Self {
        self.missing = Some(marker.into());
        self
    }

    /// Builder: separate groups of three integer digits with `mark`
    pub fn with_big_mark(mut self, mark: impl Into<String>) -> Self {
        let mark = mark.into();
        self.big_mark = (!mark.is_empty()).then_some(mark);
        self
    }

    /// Builder: use `mark` instead of `.` between integer and fractional part
    pub fn with_decimal_mark(mut self, mark: impl Into<String>) -> Self {
        self.decimal_mark = mark.into();
        self
    }

    /// How rule digits are read.
    pub fn mode(&self) -> DigitsMode {
        self.mode
    }

    /// The rules, ordered by ascending upper bound.
    pub fn rules(&self) -> &[RoundingRule] {
        &self.rules
    }

    /// The spec-wide tie-break.
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Marker used for values that cannot be formatted, if pass-through is enabled.
    pub fn missing_marker(&self) -> Option<&str> {
        self.missing.as_deref()
    }

    /// Thousands separator, if any.
    pub fn big_mark(&self) -> Option<&str> {
        self.big_mark.as_deref()
    }

    /// Decimal separator.
    pub fn decimal_mark(&self) -> &str {
        &self.decimal_mark
    }

    /// The rule whose band contains `|value|`.
    ///
    /// NaN falls into the first rule, infinities into the last.
    pub fn rule_for(&self, value: f64) -> &RoundingRule {
        let magnitude = value.abs();
        let last = self.rules.len().saturating_sub(1);
        let idx = self.rules.partition_point(|r| r.upper <= magnitude);
        &self.rules[idx.min(last)]
    }

    /// The tie-break that applies to `rule`.
    pub fn tie_break_for(&self, rule: &RoundingRule) -> TieBreak {
        rule.tie_break.unwrap_or(self.tie_break)
    }

    /// Read a spec from TOML (see `SpecConfig` for the keys).
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SpecConfig = toml::from_str(source)?;
        Self::try_from(config)
    }

    /// The serializable description of this spec.
    pub fn to_config(&self) -> SpecConfig {
        SpecConfig::from(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableGlueError;

    fn magnitude_spec() -> RoundingSpec {
        RoundingSpec::new()
            .with_magnitude_rule(&[2, 1, 1, 0], &[1.0, 10.0, 100.0, f64::INFINITY])
            .unwrap()
    }

    #[test]
    fn test_default_spec() {
        let spec = create_default_spec();
        assert_eq!(spec.mode(), DigitsMode::Significant);
        assert_eq!(spec.rules().len(), 1);
        assert_eq!(spec.rules()[0].digits, 2);
        assert_eq!(spec.tie_break(), TieBreak::HalfUp);
        assert!(spec.missing_marker().is_none());
        assert_eq!(spec.decimal_mark(), ".");
    }

    #[test]
    fn test_builders_do_not_touch_original() {
        let base = create_default_spec();
        let even = base.clone().with_tie_break(TieBreak::HalfEven);
        assert_eq!(base.tie_break(), TieBreak::HalfUp);
        assert_eq!(even.tie_break(), TieBreak::HalfEven);
    }

    #[test]
    fn test_rule_for_magnitudes() {
        let spec = magnitude_spec();
        assert_eq!(spec.rule_for(0.0).digits, 2);
        assert_eq!(spec.rule_for(0.5).digits, 2);
        assert_eq!(spec.rule_for(-0.99).digits, 2);
        assert_eq!(spec.rule_for(1.0).digits, 1);
        assert_eq!(spec.rule_for(50.0).digits, 1);
        assert_eq!(spec.rule_for(-500.0).digits, 0);
        assert_eq!(spec.rule_for(1e300).digits, 0);
    }

    #[test]
    fn test_with_magnitude_rule_errors() {
        let base = RoundingSpec::new();
        let err = base
            .clone()
            .with_magnitude_rule(&[2, 1], &[1.0])
            .unwrap_err();
        assert!(matches!(err, TableGlueError::Config(_)));
        assert!(base
            .clone()
            .with_magnitude_rule(&[2, 1], &[10.0, 1.0])
            .is_err());
        assert!(base.with_magnitude_rule(&[2, 1], &[1.0, 10.0]).is_err());
    }

    #[test]
    fn test_tie_break_override_survives_global_change() {
        let rules = vec![
            RoundingRule::new(0.0, 10.0, 0).with_tie_break(TieBreak::HalfEven),
            RoundingRule::new(10.0, f64::INFINITY, 0),
        ];
        let spec = RoundingSpec::from_rules(rules, TieBreak::HalfUp)
            .unwrap()
            .with_tie_break(TieBreak::HalfUp);

        assert_eq!(spec.tie_break_for(spec.rule_for(2.5)), TieBreak::HalfEven);
        assert_eq!(spec.tie_break_for(spec.rule_for(12.5)), TieBreak::HalfUp);
    }

    #[test]
    fn test_signif_rule_clamps_to_one_digit() {
        let spec = RoundingSpec::new().with_signif_rule(0).unwrap();
        assert_eq!(spec.rules()[0].digits, 1);
    }

    #[test]
    fn test_empty_big_mark_disables_grouping() {
        let spec = RoundingSpec::new().with_big_mark(",").with_big_mark("");
        assert!(spec.big_mark().is_none());
    }
}
