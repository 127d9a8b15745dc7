//! Search criteria and their validation.
//!
//! A criteria mapping is a set of `key = value` pairs as they arrive from a
//! query string or a GraphQL input. Keys are checked against a fixed list of
//! book properties plus the keyword flags; values stay raw strings until the
//! query builder parses them.

use std::collections::BTreeMap;
use std::fmt;

/// Book properties usable as search criteria.
pub const BOOK_PROPERTIES: &[&str] = &[
    "id",
    "version",
    "isbn",
    "rating",
    "art",
    "preis",
    "rabatt",
    "lieferbar",
    "datum",
    "homepage",
    "titel",
];

/// Pseudo-criteria that test the keyword relation instead of a column.
pub const KEYWORD_FLAGS: &[&str] = &["javascript", "typescript"];

/// Caller-supplied search filter, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria(BTreeMap<String, String>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a criterion, replacing any previous value for `key`
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<BTreeMap<String, String>> for Criteria {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        )
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value:?}")?;
        }
        f.write_str("}")
    }
}

/// True if `key` names a property or a keyword flag.
pub fn is_known_key(key: &str) -> bool {
    BOOK_PROPERTIES.contains(&key) || KEYWORD_FLAGS.contains(&key)
}

/// True iff every key is known. One unknown key rejects the whole set.
pub fn validate_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> bool {
    keys.into_iter().all(is_known_key)
}

/// The keys of `criteria` that are neither properties nor keyword flags.
pub fn unknown_keys(criteria: &Criteria) -> Vec<String> {
    criteria
        .keys()
        .filter(|key| !is_known_key(key))
        .map(str::to_string)
        .collect()
}
