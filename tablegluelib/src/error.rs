//! Error types for tablegluelib

use thiserror::Error;

/// Errors that can occur while formatting, templating or indexing table values
#[derive(Error, Debug)]
pub enum TableGlueError {
    /// Malformed rounding specification (digits, breaks, rules)
    #[error("invalid rounding specification: {0}")]
    Config(String),

    /// Rounding specification could not be read from TOML
    #[error("failed to parse rounding configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value that cannot be formatted (NaN, infinity, missing)
    #[error("cannot format {0}: value is not finite")]
    InvalidInput(String),

    /// Template marker with no binding
    #[error("no binding for template name '{0}'")]
    UnboundName(String),

    /// Template text that cannot be parsed
    #[error("invalid template at byte {position}: {message}")]
    Template { position: usize, message: String },

    /// Column referenced that the table does not have
    #[error("column not found: {0}")]
    MissingColumn(String),

    /// Row whose width differs from the table schema
    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Index lookup with a path segment that does not exist
    #[error("path not found: {}", .path.join(" > "))]
    PathNotFound { path: Vec<String> },

    /// Two rows map to the same index path and duplicates are rejected
    #[error("duplicate index path: {}", .path.join(" > "))]
    DuplicatePath { path: Vec<String> },

    /// Bracket helper applied to a string without a usable bracket group
    #[error("malformed bracketed string '{input}': {message}")]
    Format { input: String, message: String },
}

impl TableGlueError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        TableGlueError::Config(message.into())
    }

    pub(crate) fn format(input: &str, message: impl Into<String>) -> Self {
        TableGlueError::Format {
            input: input.to_string(),
            message: message.into(),
        }
    }
}
