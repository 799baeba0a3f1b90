//! Rounding specifications and number formatting.
//!
//! - **RoundingRule**: a band of magnitudes and the digits used inside it
//! - **RoundingSpec**: an ordered set of rules plus tie-break and display options
//! - **format**: decimal-accurate rounding with fixed trailing-zero padding
//!
//! ## Example
//!
//! ```rust
//! use tablegluelib::round::{RoundingRule, TieBreak, format_with_rule};
//!
//! let rule = RoundingRule::everywhere(0);
//! assert_eq!(format_with_rule(2.5, &rule, TieBreak::HalfEven).unwrap(), "2");
//! assert_eq!(format_with_rule(2.5, &rule, TieBreak::HalfUp).unwrap(), "3");
//! ```

pub mod format;
pub mod rule;
pub mod spec;

pub use format::format_with_rule;
pub use rule::{RoundingRule, TieBreak, MAX_DIGITS};
pub use spec::{create_default_spec, DigitsMode, RoundingSpec};
