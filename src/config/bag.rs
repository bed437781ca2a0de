//! Ordered string-to-string property map.

use indexmap::IndexMap;
use serde::Serialize;

/// An insertion-ordered set of `key = value` properties.
///
/// Writing a key that is already present replaces its value but keeps the
/// key at its original position, so iteration order only depends on the
/// order in which keys were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertyBag {
    entries: IndexMap<String, String>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the value of `key`, treating an empty value as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Copies every entry of `other` into `self`; `other` wins on collision.
    pub fn merge_from(&mut self, other: &PropertyBag) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Extracts the entries whose key starts with `prefix`, with the prefix removed.
    ///
    /// Entries whose key is exactly `prefix` are skipped since they would
    /// produce an empty key.
    pub fn with_prefix_stripped(&self, prefix: &str) -> PropertyBag {
        self.iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Splits a comma-separated property into trimmed, non-empty items.
    ///
    /// An absent key yields an empty list.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(parse_list).unwrap_or_default()
    }
}

/// Splits `value` on commas, trimming each item and dropping empty ones.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        bag.extend(iter);
        bag
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for PropertyBag {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for PropertyBag {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_keeps_position() {
        let mut bag = PropertyBag::new();
        bag.insert("a", "1");
        bag.insert("b", "2");
        bag.insert("a", "3");

        let entries: Vec<_> = bag.iter().collect();
        assert_eq!(entries, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut bag: PropertyBag = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        assert_eq!(bag.remove("b").as_deref(), Some("2"));

        let keys: Vec<_> = bag.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_with_prefix_stripped() {
        let bag: PropertyBag = [
            ("mod-a.sonar.language", "java"),
            ("mod-ab.sonar.language", "js"),
            ("mod-a.", "ignored"),
            ("sonar.modules", "mod-a"),
        ]
        .into_iter()
        .collect();

        let module = bag.with_prefix_stripped("mod-a.");
        assert_eq!(module.len(), 1);
        assert_eq!(module.get("sonar.language"), Some("java"));
    }

    #[test]
    fn test_list_trims_and_drops_empty_items() {
        let bag: PropertyBag = [("sonar.modules", " mod-a , mod-b ")].into_iter().collect();
        assert_eq!(bag.list("sonar.modules"), vec!["mod-a", "mod-b"]);

        assert_eq!(parse_list("a,,b, ,"), vec!["a", "b"]);
        assert_eq!(parse_list("  "), Vec::<String>::new());
        assert!(bag.list("missing").is_empty());
    }

    #[test]
    fn test_list_handles_line_breaks() {
        assert_eq!(parse_list("a,\n  b,\r\n\tc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_serializes_as_ordered_json_object() {
        let bag: PropertyBag = [("z", "1"), ("a", "2")].into_iter().collect();
        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);
    }

    #[test]
    fn test_get_non_empty() {
        let bag: PropertyBag = [("empty", ""), ("set", "x")].into_iter().collect();
        assert_eq!(bag.get_non_empty("empty"), None);
        assert_eq!(bag.get_non_empty("set"), Some("x"));
        assert_eq!(bag.get_non_empty("missing"), None);
    }
}
