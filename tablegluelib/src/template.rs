//! Inline templates: `"{mean} ({sd})"` filled from named values.
//!
//! Numbers are formatted through a `RoundingSpec` before substitution, text
//! is inserted verbatim. `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TableGlueError;
use crate::round::RoundingSpec;
use crate::table::CellValue;
use crate::Result;

/// A value bound to a template name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    /// Formatted through the rounding spec
    Number(f64),
    /// Inserted as is
    Text(String),
    /// Rendered as the spec's missing marker
    Missing,
}

impl From<f64> for Binding {
    fn from(value: f64) -> Self {
        Binding::Number(value)
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Binding::Text(value.to_string())
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Binding::Text(value)
    }
}

impl From<Option<f64>> for Binding {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Binding::Missing, Binding::Number)
    }
}

impl From<&CellValue> for Binding {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Number(n) => Binding::Number(*n),
            CellValue::Text(s) => Binding::Text(s.clone()),
            CellValue::Missing => Binding::Missing,
        }
    }
}

impl Binding {
    fn render(&self, spec: &RoundingSpec) -> Result<String> {
        match self {
            Binding::Number(n) => spec.format(*n),
            Binding::Text(s) => Ok(s.clone()),
            Binding::Missing => spec.format_option(None),
        }
    }
}

/// Named values available to a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bindings {
    values: BTreeMap<String, Binding>,
}

impl Bindings {
    /// Create an empty set of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: bind `name` to `value`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Binding>) -> Self {
        self.insert(name, value);
        self
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Binding>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Marker { name: String, position: usize },
}

/// A parsed template, reusable across many sets of bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    pieces: Vec<Piece>,
}

impl Template {
    /// Parse `{name}` markers out of `source`.
    pub fn parse(source: &str) -> Result<Self> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' if chars.peek().is_some_and(|&(_, c)| c == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|&(_, c)| c == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(TableGlueError::Template {
                        position: pos,
                        message: "unmatched '}' (use '}}' for a literal brace)".to_string(),
                    });
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => break,
                            _ => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(TableGlueError::Template {
                            position: pos,
                            message: "unterminated '{'".to_string(),
                        });
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(TableGlueError::Template {
                            position: pos,
                            message: "empty marker '{}'".to_string(),
                        });
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Marker {
                        name: name.to_string(),
                        position: pos,
                    });
                }
                _ => literal.push(ch),
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Template {
            source: source.to_string(),
            pieces,
        })
    }

    /// The template text as given.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Marker names in order of appearance (repeats included).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Marker { name, .. } => Some(name.as_str()),
            Piece::Literal(_) => None,
        })
    }

    /// Substitute every marker.
    ///
    /// Fails with `UnboundName` for the first marker without a binding.
    pub fn render(&self, bindings: &Bindings, spec: &RoundingSpec) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Marker { name, .. } => {
                    let binding = bindings
                        .get(name)
                        .ok_or_else(|| TableGlueError::UnboundName(name.clone()))?;
                    out.push_str(&binding.render(spec)?);
                }
            }
        }
        Ok(out)
    }
}

impl std::str::FromStr for Template {
    type Err = TableGlueError;

    fn from_str(s: &str) -> Result<Self> {
        Template::parse(s)
    }
}

/// Parse `template` and render it in one step.
pub fn render(template: &str, bindings: &Bindings, spec: &RoundingSpec) -> Result<String> {
    Template::parse(template)?.render(bindings, spec)
}
