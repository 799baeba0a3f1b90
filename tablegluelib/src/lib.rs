//! # tablegluelib
//!
//! Rounding, templating and lookup for reporting table values in running text.
//!
//! ## Overview
//!
//! Manuscript tables and the prose around them should quote the same numbers,
//! rounded the same way. This library covers the steps between a table of
//! summary statistics and a sentence like "systolic blood pressure was
//! 120.4 (5.2) mm Hg among black women in 2013":
//!
//! - **RoundingSpec**: picks decimal places (or significant figures) by
//!   magnitude and rounds with an explicit tie-break rule
//! - **Templates**: `"{mean} ({sd})"` filled from named values, numbers going
//!   through the rounding spec
//! - **Table**: a flat table whose cells can be formatted and glued column-wise
//! - **NestedIndex**: the table turned into a tree keyed by grouping columns
//! - **Bracket helpers**: split `"120.4 (5.2)"` back into its two halves
//!
//! ## Features
//!
//! - **Decimal-accurate rounding**: ties are decided on the decimal value,
//!   never on binary scaling artefacts
//! - **Immutable specs**: builders return new values, safe to share across threads
//! - **Explicit lookups**: missing paths are errors, not silent nulls
//! - **Serializable**: specs load from TOML, indexes serialize to nested JSON
//!
//! ## Example
//!
//! ```rust
//! use tablegluelib::{bracket_drop, bracket_extract, build_index, CellValue, RoundingSpec, Table};
//!
//! let spec = RoundingSpec::new()
//!     .with_magnitude_rule(&[2, 1, 0], &[1.0, 100.0, f64::INFINITY])
//!     .unwrap();
//!
//! let table = Table::new(["exam", "sex", "race", "sbp", "sd"])
//!     .with_row([
//!         CellValue::text("2013"),
//!         CellValue::text("female"),
//!         CellValue::text("black"),
//!         CellValue::number(120.44),
//!         CellValue::number(5.21),
//!     ])
//!     .unwrap()
//!     .glue_column("sbp_sd", "{sbp} ({sd})", &spec)
//!     .unwrap();
//!
//! let index = build_index(&table, &["exam", "sex", "race"], &["sbp_sd"]).unwrap();
//! let value = index.value(&["2013", "female", "black"], "sbp_sd").unwrap();
//! assert_eq!(value, &CellValue::text("120 (5.2)"));
//!
//! let text = value.as_text().unwrap();
//! assert_eq!(bracket_drop(text).unwrap(), "120");
//! assert_eq!(bracket_extract(text).unwrap(), "5.2");
//! ```

pub mod bracket;
pub mod config;
pub mod error;
pub mod index;
pub mod round;
pub mod table;
pub mod template;

pub use bracket::{
    bracket_drop, bracket_drop_with, bracket_extract, bracket_extract_with, bracket_insert_left,
    bracket_insert_right, Brackets,
};
pub use config::{RoundUsing, RuleOverride, SpecConfig};
pub use error::TableGlueError;
pub use index::{build_index, build_index_with, DuplicatePolicy, IndexOptions, Leaf, NestedIndex};
pub use round::{
    create_default_spec, format_with_rule, DigitsMode, RoundingRule, RoundingSpec, TieBreak,
};
pub use table::{CellValue, Table};
pub use template::{render, Binding, Bindings, Template};

/// Result type for tablegluelib operations
pub type Result<T> = std::result::Result<T, TableGlueError>;
