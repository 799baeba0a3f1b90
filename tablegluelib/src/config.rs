//! Serializable description of a rounding specification.
//!
//! `SpecConfig` is what a `RoundingSpec` looks like on disk. Every key is
//! optional; missing keys fall back to `create_default_spec()`.
//!
//! ```toml
//! round_using = "magnitude"
//! digits = [2, 1, 0]
//! breaks = [1, 10]          # a trailing infinity may be omitted
//! round_half = "even"
//! missing = "--"
//! big_mark = ","
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TableGlueError;
use crate::round::{create_default_spec, DigitsMode, RoundingSpec, TieBreak};

/// Which builder a configuration maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundUsing {
    /// One decimal-places rule for every value
    Decimal,
    /// One significant-figures rule for every value
    #[default]
    Signif,
    /// Decimal places chosen by magnitude
    Magnitude,
}

/// Tie-break override for a single rule, addressed by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOverride {
    /// Rule index (0 = smallest magnitudes)
    pub rule: usize,
    /// Tie-break for that rule
    pub round_half: TieBreak,
}

/// On-disk form of a `RoundingSpec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecConfig {
    pub round_using: RoundUsing,
    pub digits: Vec<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub breaks: Vec<f64>,
    pub round_half: TieBreak,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub big_mark: Option<String>,
    pub decimal_mark: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<RuleOverride>,
}

impl Default for SpecConfig {
    fn default() -> Self {
        SpecConfig::from(create_default_spec())
    }
}

fn single_digit(config: &SpecConfig) -> Result<u32, TableGlueError> {
    match config.digits.as_slice() {
        [d] => Ok(*d),
        other => Err(TableGlueError::config(format!(
            "round_using = {:?} takes exactly one digit count, got {}",
            config.round_using,
            other.len()
        ))),
    }
}

impl TryFrom<SpecConfig> for RoundingSpec {
    type Error = TableGlueError;

    fn try_from(config: SpecConfig) -> Result<Self, Self::Error> {
        let base = RoundingSpec::new();
        let mut spec = match config.round_using {
            RoundUsing::Decimal => base.with_decimal_rule(single_digit(&config)?)?,
            RoundUsing::Signif => base.with_signif_rule(single_digit(&config)?)?,
            RoundUsing::Magnitude => {
                let mut breaks = config.breaks.clone();
                if breaks.len() + 1 == config.digits.len() {
                    breaks.push(f64::INFINITY);
                }
                base.with_magnitude_rule(&config.digits, &breaks)?
            }
        };

        for o in &config.overrides {
            let count = spec.rules.len();
            let rule = spec.rules.get_mut(o.rule).ok_or_else(|| {
                TableGlueError::config(format!(
                    "override for rule {} but only {} rules exist",
                    o.rule, count
                ))
            })?;
            rule.tie_break = Some(o.round_half);
        }

        spec.tie_break = config.round_half;
        spec.missing = config.missing;
        spec.big_mark = config.big_mark.filter(|m| !m.is_empty());
        spec.decimal_mark = config.decimal_mark;
        Ok(spec)
    }
}

impl From<RoundingSpec> for SpecConfig {
    fn from(spec: RoundingSpec) -> Self {
        let round_using = match (spec.mode, spec.rules.len()) {
            (DigitsMode::Significant, _) => RoundUsing::Signif,
            (DigitsMode::Decimal, 1) => RoundUsing::Decimal,
            (DigitsMode::Decimal, _) => RoundUsing::Magnitude,
        };

        let digits = spec.rules.iter().map(|r| r.digits).collect();
        // the closing infinity is implied, and JSON cannot carry it anyway
        let breaks = match round_using {
            RoundUsing::Magnitude => spec
                .rules
                .iter()
                .map(|r| r.upper)
                .filter(|u| u.is_finite())
                .collect(),
            _ => Vec::new(),
        };
        let overrides = spec
            .rules
            .iter()
            .enumerate()
            .filter_map(|(rule, r)| {
                r.tie_break.map(|round_half| RuleOverride { rule, round_half })
            })
            .collect();

        SpecConfig {
            round_using,
            digits,
            breaks,
            round_half: spec.tie_break,
            missing: spec.missing,
            big_mark: spec.big_mark,
            decimal_mark: spec.decimal_mark,
            overrides,
        }
    }
}
