//! Turning numbers into display strings.
//!
//! Rounding happens on a decimal representation of the value (the shortest
//! string that reads back as the same `f64`), so `2.675` is a true tie at two
//! decimals and `0.125` rounds the way it reads. Binary scaling (`x * 100.0`)
//! would see `2.67499999...` and always round those cases down.

use rust_decimal::prelude::*;
use tracing::warn;

use super::rule::{RoundingRule, TieBreak, MAX_DIGITS};
use super::spec::{DigitsMode, RoundingSpec};
use crate::error::TableGlueError;
use crate::Result;

impl RoundingSpec {
    /// Format a number using the rule that covers its magnitude.
    ///
    /// Non-finite values fail with `InvalidInput` unless a missing marker is set.
    pub fn format(&self, value: f64) -> Result<String> {
        if !value.is_finite() {
            return self.missing_or(value.to_string());
        }

        let rule = self.rule_for(value);
        let tie_break = self.tie_break_for(rule);
        let plain = match self.mode {
            DigitsMode::Decimal => round_decimal(value, rule.digits, tie_break),
            DigitsMode::Significant => round_significant(value, rule.digits, tie_break),
        };

        Ok(self.apply_marks(&plain))
    }

    /// Format an optional number; `None` is treated like a non-finite value.
    pub fn format_option(&self, value: Option<f64>) -> Result<String> {
        match value {
            Some(v) => self.format(v),
            None => self.missing_or("missing value".to_string()),
        }
    }

    /// Format every value, stopping at the first failure.
    pub fn format_all(&self, values: &[f64]) -> Result<Vec<String>> {
        values.iter().map(|&v| self.format(v)).collect()
    }

    fn missing_or(&self, what: String) -> Result<String> {
        match &self.missing {
            Some(marker) => Ok(marker.clone()),
            None => Err(TableGlueError::InvalidInput(what)),
        }
    }

    /// Swap in the configured decimal mark and thousands separator.
    fn apply_marks(&self, plain: &str) -> String {
        if self.big_mark.is_none() && self.decimal_mark == "." {
            return plain.to_string();
        }

        let (sign, unsigned) = match plain.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", plain),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (unsigned, None),
        };

        let mut out = String::with_capacity(plain.len() + 8);
        out.push_str(sign);
        match &self.big_mark {
            Some(mark) => out.push_str(&group_thousands(int_part, mark)),
            None => out.push_str(int_part),
        }
        if let Some(frac) = frac_part {
            out.push_str(&self.decimal_mark);
            out.push_str(frac);
        }
        out
    }
}

/// Round and render `value` with a single rule, reading its digits as decimal places.
pub fn format_with_rule(value: f64, rule: &RoundingRule, default: TieBreak) -> Result<String> {
    if !value.is_finite() {
        return Err(TableGlueError::InvalidInput(value.to_string()));
    }
    if rule.digits > MAX_DIGITS {
        return Err(TableGlueError::config(format!(
            "{} digits requested, at most {} are supported",
            rule.digits, MAX_DIGITS
        )));
    }
    Ok(round_decimal(
        value,
        rule.digits,
        rule.tie_break.unwrap_or(default),
    ))
}

fn strategy(tie_break: TieBreak) -> RoundingStrategy {
    match tie_break {
        TieBreak::HalfUp => RoundingStrategy::MidpointAwayFromZero,
        TieBreak::HalfEven => RoundingStrategy::MidpointNearestEven,
    }
}

/// Shortest decimal that reads back as `value`, if it fits in a `Decimal`.
fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
}

/// Render with exactly `places` digits after the point; `-0.00` becomes `0.00`.
///
/// `None` when the value cannot carry that many places.
fn render(mut value: Decimal, places: u32) -> Option<String> {
    if places > MAX_DIGITS {
        return None;
    }
    if value.is_zero() {
        value.set_sign_positive(true);
    }
    value.rescale(places);
    (value.scale() == places).then(|| value.to_string())
}

fn float_fallback(value: f64, places: u32) -> String {
    warn!(value, places, "value outside decimal range, using float formatting");
    let text = format!("{:.*}", places as usize, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}

pub(crate) fn round_decimal(value: f64, places: u32, tie_break: TieBreak) -> String {
    to_decimal(value)
        .and_then(|d| render(d.round_dp_with_strategy(places, strategy(tie_break)), places))
        .unwrap_or_else(|| float_fallback(value, places))
}

/// Split Rust's scientific notation (`"1.25e-3"`) into mantissa text and exponent.
fn split_scientific(sci: &str) -> Option<(&str, i32)> {
    let (mantissa, exp) = sci.split_once('e')?;
    Some((mantissa, exp.parse().ok()?))
}

/// The leading `digits` figures of a positive `value` after rounding, with the
/// power of ten of the first one.
///
/// Only the mantissa goes through `Decimal`, so the magnitude of `value` never
/// has to fit the decimal range.
fn significant_digits(value: f64, digits: u32, tie_break: TieBreak) -> Option<(String, i32)> {
    let sci = format!("{value:e}");
    let (mantissa, mut exp) = split_scientific(&sci)?;
    let places = digits - 1;
    let mut rounded = Decimal::from_str(mantissa)
        .ok()?
        .round_dp_with_strategy(places, strategy(tie_break));
    rounded.rescale(places);
    if rounded.scale() != places {
        return None;
    }

    let mut figures = rounded.mantissa().unsigned_abs().to_string();
    // 9.96 at two figures carries into 10.0
    if figures.len() > digits as usize {
        figures.truncate(digits as usize);
        exp += 1;
    }
    Some((figures, exp))
}

fn float_significant_digits(value: f64, digits: u32) -> Option<(String, i32)> {
    warn!(value, digits, "mantissa outside decimal range, using float formatting");
    let sci = format!("{:.*e}", (digits - 1) as usize, value);
    let (mantissa, exp) = split_scientific(&sci)?;
    Some((mantissa.replace('.', ""), exp))
}

/// Plain notation for `f.fff x 10^exp`, given the figures `ffff`.
fn expand_scientific(figures: &str, exp: i32) -> String {
    let len = figures.len() as i32;
    if exp >= len - 1 {
        format!("{figures}{}", "0".repeat((exp - len + 1) as usize))
    } else if exp >= 0 {
        let (int_part, frac_part) = figures.split_at(exp as usize + 1);
        format!("{int_part}.{frac_part}")
    } else {
        format!("0.{}{figures}", "0".repeat((-exp - 1) as usize))
    }
}

pub(crate) fn round_significant(value: f64, digits: u32, tie_break: TieBreak) -> String {
    let digits = digits.clamp(1, MAX_DIGITS);
    if value == 0.0 {
        return expand_scientific(&"0".repeat(digits as usize), 0);
    }

    let magnitude = value.abs();
    let Some((figures, exp)) = significant_digits(magnitude, digits, tie_break)
        .or_else(|| float_significant_digits(magnitude, digits))
    else {
        return float_fallback(value, 0);
    };

    let plain = expand_scientific(&figures, exp);
    if value < 0.0 {
        format!("-{plain}")
    } else {
        plain
    }
}

/// Insert `mark` between groups of three digits, counting from the right.
fn group_thousands(digits: &str, mark: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * mark.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(mark);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal_spec(digits: u32) -> RoundingSpec {
        RoundingSpec::new().with_decimal_rule(digits).unwrap()
    }

    #[test]
    fn test_half_even_ties() {
        let rule = RoundingRule::everywhere(0);
        assert_eq!(format_with_rule(2.5, &rule, TieBreak::HalfEven).unwrap(), "2");
        assert_eq!(format_with_rule(3.5, &rule, TieBreak::HalfEven).unwrap(), "4");
        assert_eq!(format_with_rule(-2.5, &rule, TieBreak::HalfEven).unwrap(), "-2");
        assert_eq!(format_with_rule(0.5, &rule, TieBreak::HalfEven).unwrap(), "0");
    }

    #[test]
    fn test_half_up_ties() {
        let rule = RoundingRule::everywhere(0);
        assert_eq!(format_with_rule(2.5, &rule, TieBreak::HalfUp).unwrap(), "3");
        assert_eq!(format_with_rule(-2.5, &rule, TieBreak::HalfUp).unwrap(), "-3");
        assert_eq!(format_with_rule(0.5, &rule, TieBreak::HalfUp).unwrap(), "1");
    }

    #[test]
    fn test_rule_override_beats_default() {
        let rule = RoundingRule::everywhere(0).with_tie_break(TieBreak::HalfEven);
        assert_eq!(format_with_rule(2.5, &rule, TieBreak::HalfUp).unwrap(), "2");
    }

    #[test]
    fn test_ties_that_binary_scaling_gets_wrong() {
        let up = decimal_spec(2);
        assert_eq!(up.format(2.675).unwrap(), "2.68");
        assert_eq!(up.format(1.005).unwrap(), "1.01");
        assert_eq!(up.format(0.125).unwrap(), "0.13");

        let even = decimal_spec(2).with_tie_break(TieBreak::HalfEven);
        assert_eq!(even.format(2.675).unwrap(), "2.68");
        assert_eq!(even.format(2.665).unwrap(), "2.66");
        assert_eq!(even.format(0.125).unwrap(), "0.12");
    }

    #[test]
    fn test_padding_to_digits() {
        let spec = decimal_spec(3);
        assert_eq!(spec.format(1.0).unwrap(), "1.000");
        assert_eq!(spec.format(-7.5).unwrap(), "-7.500");
        assert_eq!(spec.format(120.44).unwrap(), "120.440");
        assert_eq!(decimal_spec(0).format(12.0).unwrap(), "12");
    }

    #[test]
    fn test_negative_zero_is_unsigned() {
        assert_eq!(decimal_spec(2).format(-0.001).unwrap(), "0.00");
        assert_eq!(decimal_spec(1).format(-0.0).unwrap(), "0.0");
    }

    #[test]
    fn test_magnitude_rule_digits() {
        let spec = RoundingSpec::new()
            .with_magnitude_rule(&[2, 1, 1, 0], &[1.0, 10.0, 100.0, f64::INFINITY])
            .unwrap();
        assert_eq!(spec.format(0.5).unwrap(), "0.50");
        assert_eq!(spec.format(5.0).unwrap(), "5.0");
        assert_eq!(spec.format(50.0).unwrap(), "50.0");
        assert_eq!(spec.format(500.0).unwrap(), "500");
        assert_eq!(spec.format(-0.123).unwrap(), "-0.12");
    }

    #[test]
    fn test_significant_figures() {
        let spec = RoundingSpec::new();
        assert_eq!(spec.format(120.44).unwrap(), "120");
        assert_eq!(spec.format(5.2).unwrap(), "5.2");
        assert_eq!(spec.format(5.0).unwrap(), "5.0");
        assert_eq!(spec.format(0.012345).unwrap(), "0.012");
        assert_eq!(spec.format(1234.0).unwrap(), "1200");
        assert_eq!(spec.format(-1250.0).unwrap(), "-1300");
        assert_eq!(spec.format(0.0).unwrap(), "0.0");
    }

    #[test]
    fn test_significant_carry() {
        let spec = RoundingSpec::new();
        assert_eq!(spec.format(9.96).unwrap(), "10");
        assert_eq!(spec.format(0.0996).unwrap(), "0.10");
        assert_eq!(spec.format(99.6).unwrap(), "100");
    }

    #[test]
    fn test_significant_half_even() {
        let spec = RoundingSpec::new().with_tie_break(TieBreak::HalfEven);
        assert_eq!(spec.format(0.125).unwrap(), "0.12");
        assert_eq!(spec.format(1250.0).unwrap(), "1200");
        assert_eq!(spec.format(1350.0).unwrap(), "1400");
    }

    #[test]
    fn test_non_finite_rejected() {
        let spec = decimal_spec(2);
        assert!(matches!(
            spec.format(f64::NAN),
            Err(TableGlueError::InvalidInput(_))
        ));
        assert!(spec.format(f64::INFINITY).is_err());
        assert!(spec.format_option(None).is_err());
    }

    #[test]
    fn test_missing_marker_passthrough() {
        let spec = decimal_spec(2).with_missing_marker("NA");
        assert_eq!(spec.format(f64::NAN).unwrap(), "NA");
        assert_eq!(spec.format(f64::NEG_INFINITY).unwrap(), "NA");
        assert_eq!(spec.format_option(None).unwrap(), "NA");
        assert_eq!(spec.format_option(Some(1.0)).unwrap(), "1.00");
    }

    #[test]
    fn test_big_and_decimal_marks() {
        let spec = decimal_spec(2).with_big_mark(",");
        assert_eq!(spec.format(1234567.891).unwrap(), "1,234,567.89");
        assert_eq!(spec.format(-1234.5).unwrap(), "-1,234.50");
        assert_eq!(spec.format(123.0).unwrap(), "123.00");

        let european = decimal_spec(1).with_big_mark(".").with_decimal_mark(",");
        assert_eq!(european.format(12345.67).unwrap(), "12.345,7");
    }

    #[test]
    fn test_format_all() {
        let spec = decimal_spec(1);
        assert_eq!(
            spec.format_all(&[1.0, 2.25, 3.35]).unwrap(),
            vec!["1.0", "2.3", "3.4"]
        );
        assert!(spec.format_all(&[1.0, f64::NAN]).is_err());
    }

    fn decimals_of(text: &str) -> usize {
        text.split_once('.').map_or(0, |(_, frac)| frac.len())
    }

    #[test]
    fn test_large_values_fall_back() {
        assert!(to_decimal(1e30).is_none());

        let text = decimal_spec(0).format(1e30).unwrap();
        assert!(!text.contains('.'));
        assert_eq!(text.len(), 31);
        assert_eq!(text.parse::<f64>().unwrap(), 1e30);

        let text = decimal_spec(2).format(-1e30).unwrap();
        assert_eq!(decimals_of(&text), 2);
        assert_eq!(text.parse::<f64>().unwrap(), -1e30);
    }

    #[test]
    fn test_significant_outside_decimal_range() {
        let spec = RoundingSpec::new();
        let zeros = "0".repeat(28);
        assert_eq!(spec.format(1.234e-29).unwrap(), format!("0.{zeros}12"));
        assert_eq!(spec.format(6e-29).unwrap(), format!("0.{zeros}60"));
        assert_eq!(spec.format(-6e-29).unwrap(), format!("-0.{zeros}60"));
        assert_eq!(spec.format(8e28).unwrap(), format!("8{zeros}"));
        assert_eq!(spec.format(1.25e40).unwrap(), format!("13{}", "0".repeat(39)));
    }

    #[test]
    fn test_many_significant_figures() {
        let spec = RoundingSpec::new().with_signif_rule(28).unwrap();
        assert_eq!(
            spec.format(1e-5).unwrap(),
            format!("0.00001{}", "0".repeat(27))
        );

        let text = spec.format(123.456).unwrap();
        assert!(text.starts_with("123.456"));
        assert_eq!(decimals_of(&text), 25);
        assert_eq!(spec.format(0.0).unwrap(), format!("0.{}", "0".repeat(27)));
    }

    #[test]
    fn test_render_refuses_excess_places() {
        assert_eq!(render(Decimal::ONE, MAX_DIGITS + 1), None);
        assert_eq!(render(Decimal::ONE, 2).as_deref(), Some("1.00"));
    }

    #[test]
    fn test_expand_scientific() {
        assert_eq!(expand_scientific("12", 2), "120");
        assert_eq!(expand_scientific("12", 1), "12");
        assert_eq!(expand_scientific("125", 0), "1.25");
        assert_eq!(expand_scientific("12", -3), "0.0012");
        assert_eq!(expand_scientific("00", 0), "0.0");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1", ","), "1");
        assert_eq!(group_thousands("1234", ","), "1,234");
        assert_eq!(group_thousands("123456", " "), "123 456");
    }
}
