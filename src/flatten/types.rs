use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One flattened output row: column key -> element text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RowRecord(BTreeMap<String, String>);

impl RowRecord {
    pub fn new() -> Self {
        RowRecord(BTreeMap::new())
    }

    /// Store a value, returning the one it replaced (if the key was already present)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RowRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RowRecord(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Union of every column key seen across all rows, kept in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnSet(BTreeSet<String>);

impl ColumnSet {
    pub fn new() -> Self {
        ColumnSet(BTreeSet::new())
    }

    /// Returns true if the key was not already a column
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.0.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Columns in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<K> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        ColumnSet(iter.into_iter().map(Into::into).collect())
    }
}

/// Result of flattening a document: the discovered columns plus one row per
/// direct child of the root, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatTable {
    pub columns: ColumnSet,
    pub rows: Vec<RowRecord>,
}

impl FlatTable {
    pub fn into_parts(self) -> (ColumnSet, Vec<RowRecord>) {
        (self.columns, self.rows)
    }
}

/// Which tag prefixes the keys of a row element's direct children
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TopLevelPrefix {
    /// The document root's tag, e.g. `root_name_1`
    #[default]
    DocumentRoot,
    /// The row element's own tag, e.g. `record_name_1`
    RowElement,
}

/// Configuration for the flattening pass
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Joins parent tag, child tag and sibling index into a column key
    pub separator: String,

    /// Prefix used for the first level below each row element
    pub top_level_prefix: TopLevelPrefix,

    /// Levels below each row element to capture (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            separator: String::from("_"),
            top_level_prefix: TopLevelPrefix::DocumentRoot,
            max_depth: None,
        }
    }
}
