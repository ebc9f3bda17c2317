//! Original path → revisioned path mapping produced by the version phase.
//!
//! Keys and values are stored in `/`-separated, lexically cleaned form so a
//! reference found in any text file can be matched by plain string suffix.
//! Iteration follows insertion order; that order is the tie-break when more
//! than one key ends with the same link.

use std::path::{MAIN_SEPARATOR, Path};

use rustc_hash::FxHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::utils::path::slash::to_map_key_with;

/// Asset map for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMap {
    entries: Vec<(String, String)>,
    index: FxHashMap<String, usize>,
}

impl AssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `original → revisioned` using the host path separator.
    pub fn insert(&mut self, original: &Path, revisioned: &Path) {
        self.insert_with_separator(
            &original.to_string_lossy(),
            &revisioned.to_string_lossy(),
            MAIN_SEPARATOR,
        );
    }

    /// Record an entry whose paths were produced with `separator`.
    ///
    /// Last writer wins for a repeated key; the key keeps its first position.
    pub fn insert_with_separator(&mut self, original: &str, revisioned: &str, separator: char) {
        let key = to_map_key_with(original, separator);
        let value = to_map_key_with(revisioned, separator);

        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Merge `other` into `self`, in `other`'s order.
    pub fn extend(&mut self, other: AssetMap) {
        for (key, value) in other.entries {
            // Already normalized, separator is irrelevant here.
            self.insert_with_separator(&key, &value, '/');
        }
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.index.get(original).map(|&i| self.entries[i].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First entry, in insertion order, whose key ends with `link`.
    pub fn find_by_suffix(&self, link: &str) -> Option<(&str, &str)> {
        if link.is_empty() {
            return None;
        }
        self.iter().find(|(key, _)| key.ends_with(link))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AssetMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_normalizes() {
        let mut map = AssetMap::new();
        map.insert(Path::new("./css/app.css"), Path::new("css/./app.a1b2c3d4.css"));
        assert_eq!(map.get("css/app.css"), Some("css/app.a1b2c3d4.css"));
    }

    #[test]
    fn test_backslash_entries_match_forward_slash_links() {
        let mut map = AssetMap::new();
        map.insert_with_separator(
            r"static\images\logo.png",
            r"static\images\logo.0badf00d.png",
            '\\',
        );

        let (key, value) = map.find_by_suffix("images/logo.png").unwrap();
        assert_eq!(key, "static/images/logo.png");
        assert_eq!(value, "static/images/logo.0badf00d.png");
    }

    #[test]
    fn test_last_writer_wins_keeps_position() {
        let mut map = AssetMap::new();
        map.insert(Path::new("a/app.css"), Path::new("a/app.1.css"));
        map.insert(Path::new("b/app.css"), Path::new("b/app.2.css"));
        map.insert(Path::new("a/app.css"), Path::new("a/app.3.css"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.find_by_suffix("app.css"), Some(("a/app.css", "a/app.3.css")));
    }

    #[test]
    fn test_find_by_suffix_is_string_suffix() {
        let mut map = AssetMap::new();
        map.insert(Path::new("dist/js/main.js"), Path::new("dist/js/main.ffff0000.js"));

        assert!(map.find_by_suffix("js/main.js").is_some());
        assert!(map.find_by_suffix("main.js").is_some());
        assert!(map.find_by_suffix("other.js").is_none());
        assert!(map.find_by_suffix("").is_none());
    }

    #[test]
    fn test_extend_and_serialize_in_order() {
        let mut first = AssetMap::new();
        first.insert(Path::new("b.css"), Path::new("b.2.css"));
        let mut second = AssetMap::new();
        second.insert(Path::new("a.css"), Path::new("a.1.css"));
        first.extend(second);

        let json = serde_json::to_string(&first).unwrap();
        assert_eq!(json, r#"{"b.css":"b.2.css","a.css":"a.1.css"}"#);
    }
}
