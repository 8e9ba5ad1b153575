use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered mapping of language key to source text.
///
/// Used for reference solutions and starter code. Keys keep the order in which
/// the author declared them, which is also the order languages are validated in.
/// Serialized as a JSON object on the wire; duplicate keys are rejected.
#[derive(Clone, Debug, Default, Eq)]
pub struct LanguageMap(Vec<(String, String)>);

/// One `{language, code}` pair as stored in the database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct StoredEntry {
    language: String,
    code: String,
}

impl LanguageMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an entry. Returns `false` and leaves the map unchanged if the key exists.
    pub fn insert(&mut self, language: impl Into<String>, code: impl Into<String>) -> bool {
        let language = language.into();
        if self.get(&language).is_some() {
            return false;
        }
        self.0.push((language, code.into()));
        true
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == language)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as a JSON array of `{language, code}` objects, preserving order.
    ///
    /// JSONB columns do not keep object key order, so storage uses an array.
    pub fn to_stored_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.0
                .iter()
                .map(|(language, code)| {
                    serde_json::json!({ "language": language, "code": code })
                })
                .collect(),
        )
    }

    /// Decode the array form written by [`LanguageMap::to_stored_json`].
    pub fn from_stored_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let entries: Vec<StoredEntry> = serde_json::from_value(value.clone())?;
        let mut map = Self::new();
        for entry in entries {
            map.insert(entry.language, entry.code);
        }
        Ok(map)
    }
}

/// Equality ignores declaration order.
impl PartialEq for LanguageMap {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LanguageMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for LanguageMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct LanguageMapVisitor;

impl<'de> Visitor<'de> for LanguageMapVisitor {
    type Value = LanguageMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping language keys to source code")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = LanguageMap(Vec::with_capacity(access.size_hint().unwrap_or(0)));
        while let Some((language, code)) = access.next_entry::<String, String>()? {
            if !map.insert(language.clone(), code) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate language key '{language}'"
                )));
            }
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for LanguageMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LanguageMapVisitor)
    }
}
