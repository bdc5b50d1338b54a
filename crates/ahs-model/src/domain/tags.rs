use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key/value tags attached to a cloud resource.
///
/// Keys are unique; inserting an existing key overwrites its value.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(pub BTreeMap<String, String>);

impl Tags {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Insert or overwrite a tag.
    ///
    /// Returns `self` for chaining.
    pub fn insert<K, V>(&mut self, key: K, val: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.insert(key.into(), val.into());
        self
    }

    /// Value of `key`, if present.
    ///
    /// # Examples
    /// ```
    /// use ahs_model::Tags;
    ///
    /// let tags: Tags = [("Name", "web"), ("team", "infra")].into_iter().collect();
    /// assert_eq!(tags.get("Name"), Some("web"));
    /// assert_eq!(tags.get("missing"), None);
    /// ```
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::Tags;

    #[test]
    fn insert_overwrites_existing_key() {
        let mut tags = Tags::new();
        tags.insert("Name", "web").insert("Name", "api");

        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("Name"), Some("api"));
    }

    #[test]
    fn collects_from_pairs() {
        let tags: Tags = [("Name", "web"), ("ahs:instance-id", "3")]
            .into_iter()
            .collect();

        assert_eq!(tags.get("ahs:instance-id"), Some("3"));
        assert!(tags.get("missing").is_none());
    }

    #[test]
    fn serializes_as_plain_map() {
        let tags: Tags = [("Name", "web")].into_iter().collect();
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"{"Name":"web"}"#);
    }
}
