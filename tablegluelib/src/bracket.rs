//! Helpers for the parenthetical part of a formatted value.
//!
//! Table cells like `"120.4 (5.2)"` are handy in a table but in prose you
//! often want the two halves separately: `bracket_drop` keeps `"120.4"`,
//! `bracket_extract` keeps `"5.2"`.

use serde::{Deserialize, Serialize};

use crate::error::TableGlueError;
use crate::Result;

/// The pair of characters delimiting a bracket group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brackets {
    pub left: char,
    pub right: char,
}

impl Default for Brackets {
    fn default() -> Self {
        Self::round()
    }
}

impl Brackets {
    /// `(` and `)`
    pub fn round() -> Self {
        Self {
            left: '(',
            right: ')',
        }
    }

    /// `[` and `]`
    pub fn square() -> Self {
        Self {
            left: '[',
            right: ']',
        }
    }
}

/// Byte offsets of the first opening bracket and its matching closing bracket.
///
/// `Ok(None)` if there is no opening bracket at all. When `left` and `right`
/// are the same character groups do not nest.
fn find_group(s: &str, brackets: Brackets) -> Result<Option<(usize, usize)>> {
    let Some(open) = s.find(brackets.left) else {
        return Ok(None);
    };

    let mut depth = 0usize;
    for (offset, ch) in s[open..].char_indices() {
        if depth > 0 && ch == brackets.right {
            depth -= 1;
            if depth == 0 {
                return Ok(Some((open, open + offset)));
            }
        } else if ch == brackets.left {
            depth += 1;
        }
    }

    Err(TableGlueError::format(
        s,
        format!("'{}' is never closed by '{}'", brackets.left, brackets.right),
    ))
}

/// The text inside the first `(...)` group.
pub fn bracket_extract(s: &str) -> Result<String> {
    bracket_extract_with(s, Brackets::default())
}

/// `s` without its first `(...)` group and the space before it.
pub fn bracket_drop(s: &str) -> Result<String> {
    bracket_drop_with(s, Brackets::default())
}

/// Like `bracket_extract`, with custom brackets.
pub fn bracket_extract_with(s: &str, brackets: Brackets) -> Result<String> {
    match find_group(s, brackets)? {
        Some((open, close)) => Ok(s[open + brackets.left.len_utf8()..close].to_string()),
        None => Err(TableGlueError::format(
            s,
            format!("no '{}' found", brackets.left),
        )),
    }
}

/// Like `bracket_drop`, with custom brackets.
///
/// Strings without an opening bracket come back unchanged (minus trailing whitespace).
pub fn bracket_drop_with(s: &str, brackets: Brackets) -> Result<String> {
    let Some((open, close)) = find_group(s, brackets)? else {
        return Ok(s.trim_end().to_string());
    };

    let start = if s[..open].ends_with(' ') { open - 1 } else { open };
    let end = close + brackets.right.len_utf8();

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..start]);
    out.push_str(&s[end..]);
    Ok(out.trim_end().to_string())
}

/// Insert `text` right after the first opening bracket.
///
/// `bracket_insert_left("(1.2, 3.4)", "95% CI: ")` gives `"(95% CI: 1.2, 3.4)"`.
pub fn bracket_insert_left(s: &str, text: &str) -> Result<String> {
    let (open, _) = require_group(s, Brackets::default())?;
    let at = open + '('.len_utf8();
    Ok(format!("{}{}{}", &s[..at], text, &s[at..]))
}

/// Insert `text` right before the bracket closing the first group.
pub fn bracket_insert_right(s: &str, text: &str) -> Result<String> {
    let (_, close) = require_group(s, Brackets::default())?;
    Ok(format!("{}{}{}", &s[..close], text, &s[close..]))
}

fn require_group(s: &str, brackets: Brackets) -> Result<(usize, usize)> {
    find_group(s, brackets)?
        .ok_or_else(|| TableGlueError::format(s, format!("no '{}' found", brackets.left)))
}
