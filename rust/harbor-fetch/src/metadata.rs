use serde::Serialize;
use std::collections::{btree_map, BTreeMap};

/// The resolved locator (path or URL) of a fetched resource
pub const SOURCE_LOCATOR: &str = "harbor:source-locator";

/// The plugin id of the fetcher that produced a stream
pub const FETCHER: &str = "harbor:fetcher";

/// The size of a fetched resource in bytes, when known
pub const CONTENT_LENGTH: &str = "Content-Length";

/// A record of what is known about a resource, as an ordered mapping from
/// keys to one or more text values.
///
/// A [Metadata] is owned by the caller and lent to a fetch as `&mut`; fetches
/// only ever add or overwrite entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    /// Replace all values for `key` with a single `value`
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.entries.insert(key.into(), vec![value.into()]);
    }

    /// Append `value` to the values already recorded for `key`
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// The first value recorded for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<String>> {
        self.entries.iter()
    }

    /// Copy provider-supplied tags in verbatim; existing keys are overwritten
    pub fn set_all<'a, I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in tags {
            self.set(key.as_str(), value.as_str());
        }
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
