//! Insertion-ordered label sets.

use serde::{Deserialize, Serialize};

use crate::render::escape_label_value;

/// An ordered mapping of label names to values.
///
/// Keys are unique. Insertion order is the render order, which keeps
/// exposition output byte-stable within a process run. Re-inserting an
/// existing key overwrites its value in place without changing its
/// position (new value wins; this is the documented override policy
/// for label branching).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    pairs: Vec<(String, String)>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Insert or overwrite a label. An existing key keeps its position.
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.pairs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.pairs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Union of `self` and `other`. `other`'s values win on collision;
    /// keys already present keep their position.
    pub fn merged(&self, other: &LabelSet) -> LabelSet {
        let mut out = self.clone();
        for (k, v) in other.iter() {
            out.insert(k, v);
        }
        out
    }

    /// Render as `{k1="v1",k2="v2"}` in insertion order, with value
    /// escaping. Empty sets render as the empty string.
    pub fn render(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let body = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
            .collect::<Vec<_>>()
            .join(",");
        format!("{{{body}}}")
    }

    /// Order-insensitive identity key, used to deduplicate child
    /// instances within a family. Not valid exposition output.
    pub fn canonical_key(&self) -> String {
        let mut pairs: Vec<&(String, String)> = self.pairs.iter().collect();
        pairs.sort();
        pairs
            .iter()
            .map(|(k, v)| format!("{k}\u{0}{v}"))
            .collect::<Vec<_>>()
            .join("\u{1}")
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for LabelSet {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut set = LabelSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_in_insertion_order() {
        let labels: LabelSet = [("status", "500"), ("endpoint", "/path")]
            .into_iter()
            .collect();
        assert_eq!(labels.render(), r#"{status="500",endpoint="/path"}"#);
    }

    #[test]
    fn empty_set_renders_nothing() {
        assert_eq!(LabelSet::new().render(), "");
    }

    #[test]
    fn values_are_escaped() {
        let labels: LabelSet = [("value", "\"")].into_iter().collect();
        assert_eq!(labels.render(), r#"{value="\""}"#);
    }

    #[test]
    fn reinsert_overwrites_in_place() {
        let mut labels: LabelSet = [("a", "1"), ("b", "2")].into_iter().collect();
        labels.insert("a", "3");
        assert_eq!(labels.render(), r#"{a="3",b="2"}"#);
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn merged_lets_new_labels_win() {
        let base: LabelSet = [("method", "get"), ("code", "200")].into_iter().collect();
        let extra: LabelSet = [("code", "404"), ("host", "a")].into_iter().collect();
        let merged = base.merged(&extra);
        assert_eq!(merged.render(), r#"{method="get",code="404",host="a"}"#);
    }

    #[test]
    fn canonical_key_ignores_insertion_order() {
        let a: LabelSet = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: LabelSet = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_ne!(a.render(), b.render());
    }
}
