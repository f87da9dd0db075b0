//! Ordered, first-write-wins parameter sets.

use url::form_urlencoded;

/// Ordered key/value mapping where the earliest insert of a key wins.
///
/// Keys are case-sensitive. Iteration follows insertion order so canonical
/// URLs serialize deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(String, String)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query-string body, keeping the first value per key.
    pub fn from_query(raw: &str) -> Self {
        let mut set = Self::new();
        set.merge_query(raw);
        set
    }

    /// Inserts `value` under `key` unless the key is already present.
    ///
    /// Returns true when the pair was stored.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    /// Merges every pair of a query-string body; returns how many were new.
    pub fn merge_query(&mut self, raw: &str) -> usize {
        let mut inserted = 0_usize;
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            if self.insert_if_absent(key.into_owned(), value.into_owned()) {
                inserted = inserted.saturating_add(1);
            }
        }
        inserted
    }

    /// Merges a query-string body only when it looks like `key=value` data.
    ///
    /// Auxiliary sources (path extras, fragments) are frequently plain anchor
    /// names; those contribute nothing instead of bare keys.
    pub fn merge_tolerant(&mut self, raw: &str) -> usize {
        if !raw.contains('=') {
            return 0;
        }
        self.merge_query(raw)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Serializes as an `application/x-www-form-urlencoded` body.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert_if_absent(key, value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::ParameterSet;

    #[test]
    fn first_value_wins_within_one_source() {
        let set = ParameterSet::from_query("t=5s&t=9s&list=PL1");
        assert_eq!(set.get("t"), Some("5s"));
        assert_eq!(set.get("list"), Some("PL1"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn merge_keeps_earlier_sources() {
        let mut set = ParameterSet::from_query("t=5s");
        let inserted = set.merge_query("t=9s&index=2");
        assert_eq!(inserted, 1);
        assert_eq!(set.get("t"), Some("5s"));
        assert_eq!(set.get("index"), Some("2"));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let set = ParameterSet::from_query("T=1&t=2");
        assert_eq!(set.get("T"), Some("1"));
        assert_eq!(set.get("t"), Some("2"));
    }

    #[test]
    fn tolerant_merge_ignores_anchor_names() {
        let mut set = ParameterSet::new();
        assert_eq!(set.merge_tolerant("comments-section"), 0);
        assert!(set.is_empty());
        assert_eq!(set.merge_tolerant("t=30s"), 1);
        assert_eq!(set.get("t"), Some("30s"));
    }

    #[test]
    fn skips_empty_keys_and_decodes_values() {
        let set = ParameterSet::from_query("=orphan&q=a%20b+c");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("q"), Some("a b c"));
    }

    #[test]
    fn serializes_in_insertion_order() {
        let set: ParameterSet = [("v", "abc"), ("t", "5s"), ("list", "PL1")]
            .into_iter()
            .collect();
        assert_eq!(set.to_query_string(), "v=abc&t=5s&list=PL1");
    }
}
