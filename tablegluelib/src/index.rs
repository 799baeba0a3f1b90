//! Nested lookup indexes for inline reporting.
//!
//! `build_index` turns a flat table into a tree with one level per grouping
//! column, so a value can be referenced in prose by the group it belongs to:
//!
//! ```rust
//! use tablegluelib::{build_index, CellValue, Table};
//!
//! let table = Table::new(["exam", "sex", "sbp"])
//!     .with_row([CellValue::text("2013"), CellValue::text("female"), CellValue::number(120.4)])
//!     .unwrap();
//! let index = build_index(&table, &["exam", "sex"], &["sbp"]).unwrap();
//!
//! let leaf = index.get(&["2013", "female"]).unwrap();
//! assert_eq!(leaf["sbp"], CellValue::number(120.4));
//! ```
//!
//! The grouping columns should identify rows uniquely. When they don't, the
//! last row for a path wins (`DuplicatePolicy::LastWins`, logged and recorded
//! in `NestedIndex::overwritten`) or construction fails
//! (`DuplicatePolicy::Error`).

use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::TableGlueError;
use crate::table::{CellValue, Table};
use crate::Result;

/// Value columns of one row, by column name.
pub type Leaf = BTreeMap<String, CellValue>;

/// What to do when two rows share a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Later rows overwrite earlier ones
    #[default]
    LastWins,
    /// Fail with `DuplicatePath`
    Error,
}

/// Options for `build_index_with`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Handling of rows that map to the same path
    pub duplicates: DuplicatePolicy,
}

impl IndexOptions {
    /// Default options (last write wins).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the duplicate policy
    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }
}

/// Inner node: children keyed by group value, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
struct Branch {
    order: Vec<String>,
    children: HashMap<String, Node>,
}

impl Branch {
    fn entry(&mut self, key: &str) -> &mut Node {
        if !self.children.contains_key(key) {
            self.order.push(key.to_string());
        }
        self.children
            .entry(key.to_string())
            .or_insert_with(|| Node::Branch(Branch::default()))
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.order
            .iter()
            .filter_map(|k| self.children.get(k).map(|node| (k.as_str(), node)))
    }
}

impl Serialize for Branch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for (key, node) in self.iter() {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum Node {
    Branch(Branch),
    Leaf(Leaf),
}

impl Node {
    /// Store `leaf` at `path`; returns true if a leaf was already there.
    fn insert(&mut self, path: &[String], leaf: Leaf) -> bool {
        let Some((head, rest)) = path.split_first() else {
            let replaced = matches!(self, Node::Leaf(_));
            *self = Node::Leaf(leaf);
            return replaced;
        };
        match self {
            Node::Branch(branch) => branch.entry(head).insert(rest, leaf),
            Node::Leaf(_) => {
                *self = Node::Branch(Branch::default());
                self.insert(path, leaf)
            }
        }
    }

    fn collect_leaves<'a>(
        &'a self,
        prefix: &mut Vec<String>,
        out: &mut Vec<(Vec<String>, &'a Leaf)>,
    ) {
        match self {
            Node::Leaf(leaf) => out.push((prefix.clone(), leaf)),
            Node::Branch(branch) => {
                for (key, child) in branch.iter() {
                    prefix.push(key.to_string());
                    child.collect_leaves(prefix, out);
                    prefix.pop();
                }
            }
        }
    }
}

/// A tree keyed by the values of the grouping columns, with leaves holding the value columns.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedIndex {
    group_columns: Vec<String>,
    value_columns: Vec<String>,
    root: Node,
    leaf_count: usize,
    overwritten: Vec<Vec<String>>,
}

impl Serialize for NestedIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

/// Build an index with the default options (last write wins).
pub fn build_index(
    table: &Table,
    group_columns: &[&str],
    value_columns: &[&str],
) -> Result<NestedIndex> {
    build_index_with(table, group_columns, value_columns, IndexOptions::default())
}

/// Build an index from `table`.
///
/// Rows are visited in table order. Each row's values for `group_columns`
/// (in the order given) form its path; the row's `value_columns` become the
/// leaf at that path. Repeated value columns are collapsed.
pub fn build_index_with(
    table: &Table,
    group_columns: &[&str],
    value_columns: &[&str],
    options: IndexOptions,
) -> Result<NestedIndex> {
    let group_idx = group_columns
        .iter()
        .map(|name| table.column_index(name))
        .collect::<Result<Vec<_>>>()?;

    let mut values: Vec<(String, usize)> = Vec::with_capacity(value_columns.len());
    for name in value_columns {
        let idx = table.column_index(name)?;
        if !values.iter().any(|(n, _)| n == name) {
            values.push((name.to_string(), idx));
        }
    }

    let mut root = if group_idx.is_empty() {
        Node::Leaf(Leaf::new())
    } else {
        Node::Branch(Branch::default())
    };
    let mut leaf_count = usize::from(group_idx.is_empty());
    let mut overwritten = Vec::new();

    for (row_no, row) in table.rows().iter().enumerate() {
        let path: Vec<String> = group_idx.iter().map(|&i| row[i].key()).collect();
        let leaf: Leaf = values
            .iter()
            .map(|(name, i)| (name.clone(), row[*i].clone()))
            .collect();

        let replaced = root.insert(&path, leaf);
        if !replaced {
            if !group_idx.is_empty() {
                leaf_count += 1;
            }
            continue;
        }
        // a root leaf starts out empty, so the first row is not a duplicate
        if group_idx.is_empty() && row_no == 0 {
            continue;
        }
        match options.duplicates {
            DuplicatePolicy::Error => return Err(TableGlueError::DuplicatePath { path }),
            DuplicatePolicy::LastWins => {
                warn!(
                    row = row_no,
                    path = %path.join(" > "),
                    "index path overwritten by a later row"
                );
                overwritten.push(path);
            }
        }
    }

    debug!(
        rows = table.len(),
        leaves = leaf_count,
        depth = group_idx.len(),
        "built nested index"
    );

    Ok(NestedIndex {
        group_columns: group_columns.iter().map(|s| s.to_string()).collect(),
        value_columns: values.into_iter().map(|(name, _)| name).collect(),
        root,
        leaf_count,
        overwritten,
    })
}

fn owned_path<S: AsRef<str>>(path: &[S]) -> Vec<String> {
    path.iter().map(|s| s.as_ref().to_string()).collect()
}

impl NestedIndex {
    fn node<S: AsRef<str>>(&self, path: &[S]) -> Result<&Node> {
        let mut node = &self.root;
        for segment in path {
            node = match node {
                Node::Branch(branch) => branch.children.get(segment.as_ref()),
                Node::Leaf(_) => None,
            }
            .ok_or_else(|| TableGlueError::PathNotFound {
                path: owned_path(path),
            })?;
        }
        Ok(node)
    }

    /// The leaf at `path`; the path must name one value per grouping column.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Result<&Leaf> {
        match self.node(path)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Branch(_) => Err(TableGlueError::PathNotFound {
                path: owned_path(path),
            }),
        }
    }

    /// A single value column at `path`.
    pub fn value<S: AsRef<str>>(&self, path: &[S], column: &str) -> Result<&CellValue> {
        self.get(path)?
            .get(column)
            .ok_or_else(|| TableGlueError::MissingColumn(column.to_string()))
    }

    /// Keys directly below `prefix`, in order of first appearance.
    pub fn keys<S: AsRef<str>>(&self, prefix: &[S]) -> Result<Vec<&str>> {
        match self.node(prefix)? {
            Node::Branch(branch) => Ok(branch.order.iter().map(String::as_str).collect()),
            Node::Leaf(_) => Err(TableGlueError::PathNotFound {
                path: owned_path(prefix),
            }),
        }
    }

    /// Every leaf with its full path, depth first in order of first appearance.
    pub fn leaves(&self) -> Vec<(Vec<String>, &Leaf)> {
        let mut out = Vec::with_capacity(self.leaf_count);
        self.root.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    /// Grouping columns, one per tree level.
    pub fn group_columns(&self) -> &[String] {
        &self.group_columns
    }

    /// Value columns stored in each leaf.
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// Number of tree levels above the leaves.
    pub fn depth(&self) -> usize {
        self.group_columns.len()
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Paths that were written more than once, one entry per extra write.
    pub fn overwritten(&self) -> &[Vec<String>] {
        &self.overwritten
    }
}
