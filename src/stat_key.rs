//! Interned stat names.
//!
//! A `StatKey` names a stat in the [`StatSystem`](crate::StatSystem)
//! registry. Backed by `Arc<str>`, so cloning a key never reallocates and
//! equality on shared keys is cheap.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::sync::Arc;

/// Interned name of a registered stat.
///
/// The engine never interprets key contents; `"hp"`, `"attack.melee"` and
/// `""` are all legal. Keys convert from string slices and owned strings.
///
/// # Examples
///
/// ```rust
/// use statflow::StatKey;
///
/// let hp = StatKey::new("hp");
/// let hp2: StatKey = "hp".into();
/// assert_eq!(hp, hp2);
/// assert_eq!(hp.as_str(), "hp");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatKey(Arc<str>);

impl StatKey {
    /// Create a key from anything string-like.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The key's textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StatKey {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for StatKey {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl Borrow<str> for StatKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StatKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StatKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StatKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(StatKey::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn keys_compare_by_content() {
        assert_eq!(StatKey::new("hp"), StatKey::from(String::from("hp")));
        assert_ne!(StatKey::new("hp"), StatKey::new("mp"));
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(StatKey::new("hp"), 1u32);
        // Borrow<str> lets callers look up without building a key.
        assert_eq!(map.get("hp"), Some(&1));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn display_is_raw_name() {
        assert_eq!(StatKey::new("attack.melee").to_string(), "attack.melee");
    }
}
