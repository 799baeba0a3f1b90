//! Flat tables of summary values.
//!
//! A `Table` is the hand-off point between whatever produced the summaries
//! (means, SDs per group) and the presentation side: cells get formatted and
//! glued into strings here, then the table is turned into a `NestedIndex`.
//!
//! The data flow is:
//! 1. Summary table (numbers per group)
//! 2. Glued table (formatted strings, e.g. `"120.4 (5.2)"`)
//! 3. NestedIndex (lookup by group values)

use serde::{Deserialize, Serialize};

use crate::error::TableGlueError;
use crate::round::RoundingSpec;
use crate::template::{Bindings, Template};
use crate::Result;

/// A single table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// A numeric value
    Number(f64),
    /// A text value (labels, already formatted numbers)
    Text(String),
    /// No value
    #[default]
    Missing,
}

impl CellValue {
    /// Create a number cell
    pub fn number(value: f64) -> Self {
        CellValue::Number(value)
    }

    /// Create a text cell
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// The numeric value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text value, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this cell is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// The string used when this cell is part of an index path.
    ///
    /// Numbers use their shortest round-trip form (`2013.0` -> `"2013"`),
    /// missing cells become `"NA"`.
    pub fn key(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Missing => "NA".to_string(),
        }
    }

    /// Format through `spec`: numbers are rounded, text passes through.
    pub fn format(&self, spec: &RoundingSpec) -> Result<String> {
        match self {
            CellValue::Number(n) => spec.format(*n),
            CellValue::Text(s) => Ok(s.clone()),
            CellValue::Missing => spec.format_option(None),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(CellValue::Missing, CellValue::Number)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.key();

        // Respect width and alignment from the formatter
        if let Some(width) = f.width() {
            if f.align() == Some(std::fmt::Alignment::Left) {
                write!(f, "{:<width$}", s, width = width)
            } else {
                write!(f, "{:>width$}", s, width = width)
            }
        } else {
            write!(f, "{}", s)
        }
    }
}

/// Named columns and rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builder: append a row
    pub fn with_row<I, V>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.push_row(values.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    /// Append a row; it must have one value per column.
    pub fn push_row(&mut self, values: Vec<CellValue>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(TableGlueError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableGlueError::MissingColumn(name.to_string()))
    }

    /// All values of a column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Every column of `row` bound by name.
    fn row_bindings(&self, row: &[CellValue]) -> Bindings {
        let mut bindings = Bindings::new();
        for (name, value) in self.columns.iter().zip(row) {
            bindings.insert(name.clone(), value);
        }
        bindings
    }

    /// Render `template` once per row and store the result as text column `name`.
    ///
    /// Markers refer to column names. An existing column called `name` is
    /// replaced in place, otherwise the column is appended.
    pub fn glue_column(&self, name: &str, template: &str, spec: &RoundingSpec) -> Result<Table> {
        let template = Template::parse(template)?;
        for marker in template.names() {
            self.column_index(marker)?;
        }

        let glued = self
            .rows
            .iter()
            .map(|row| {
                template
                    .render(&self.row_bindings(row), spec)
                    .map(CellValue::Text)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.replace_or_append(name, glued))
    }

    /// Replace a column by its values formatted through `spec`.
    pub fn format_column(&self, name: &str, spec: &RoundingSpec) -> Result<Table> {
        let idx = self.column_index(name)?;
        let formatted = self
            .rows
            .iter()
            .map(|row| row[idx].format(spec).map(CellValue::Text))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.replace_or_append(name, formatted))
    }

    fn replace_or_append(&self, name: &str, values: Vec<CellValue>) -> Table {
        let mut table = self.clone();
        match table.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, value) in table.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                table.columns.push(name.to_string());
                for (row, value) in table.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        table
    }
}
