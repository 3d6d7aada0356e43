// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Normalize a format name for comparison: trimmed and lower-cased.
pub fn normalize_format(format: &str) -> String {
    format.trim().to_ascii_lowercase()
}

/// Ordered mapping from source format to the ordered set of target formats.
///
/// Formats are case-folded on insert, sources keep first-seen order and each
/// source's targets are de-duplicated while keeping first-seen order.
///
/// # Example
/// ```
/// use local_converter::config::FormatTable;
///
/// let table = FormatTable::from_pairs(&[("JPG", &["png"]), ("png", &["jpg", "jpeg", "jpg"])]);
///
/// assert!(table.supports("jpg", "PNG"));
/// assert_eq!(table.targets_for("png"), ["jpg", "jpeg"]);
/// assert!(table.targets_for("gif").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatTable(Vec<(String, Vec<String>)>);

impl FormatTable {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a table from `(source, targets)` literals.
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let mut table = Self::new();
        for (source, targets) in pairs {
            for target in targets.iter() {
                table.insert(source, target);
            }
        }
        table
    }

    /// Add a single pair. Returns false when the pair was already present.
    pub fn insert(&mut self, source: &str, target: &str) -> bool {
        let source = normalize_format(source);
        let target = normalize_format(target);

        let targets = match self.0.iter().position(|(s, _)| *s == source) {
            Some(index) => &mut self.0[index].1,
            None => {
                self.0.push((source, Vec::new()));
                let last = self.0.len() - 1;
                &mut self.0[last].1
            }
        };

        if targets.contains(&target) {
            return false;
        }
        targets.push(target);
        true
    }

    /// Union another table into this one, keeping first-seen order.
    pub fn merge(&mut self, other: &FormatTable) {
        for (source, targets) in other.iter() {
            for target in targets {
                self.insert(source, target);
            }
        }
    }

    pub fn supports(&self, source: &str, target: &str) -> bool {
        let target = normalize_format(target);
        self.targets_for(source).iter().any(|t| *t == target)
    }

    /// Targets declared for `source`, empty when the source is unknown.
    pub fn targets_for(&self, source: &str) -> &[String] {
        let source = normalize_format(source);
        self.0
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, targets)| targets.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(s, t)| (s.as_str(), t.as_slice()))
    }

    /// Every `(source, target)` pair in table order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(s, targets)| targets.iter().map(move |t| (s.as_str(), t.as_str())))
    }

    /// Number of source formats.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FormatTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (source, targets) in &self.0 {
            map.serialize_entry(source, targets)?;
        }
        map.end()
    }
}
