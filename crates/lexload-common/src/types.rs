//! Common type definitions for namespaced resource bundles.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Namespace that survives a registry-wide clear.
pub const COMMON_NAMESPACE: &str = "common";

/// Separator between namespace and language in the string form of a key.
pub const KEY_SEPARATOR: char = ':';

/// Identifies a bundle by its `(namespace, language)` pair.
///
/// Equality and hashing operate on the pair itself, so two distinct pairs
/// never share a table slot. The [`Display`](fmt::Display) form is
/// `"<namespace>:<language>"`, with `\` and `:` inside a component escaped
/// so the string form stays injective.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    namespace: String,
    language: String,
}

impl CacheKey {
    /// Creates a key for the given namespace and language.
    pub fn new(namespace: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            language: language.into(),
        }
    }

    /// Namespace component.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Language component.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, &self.namespace)?;
        write!(f, "{KEY_SEPARATOR}")?;
        write_escaped(f, &self.language)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, component: &str) -> fmt::Result {
    for c in component.chars() {
        if c == '\\' || c == KEY_SEPARATOR {
            write!(f, "\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

/// Derives the stable string key for a `(namespace, language)` pair.
///
/// ```
/// use lexload_common::cache_key;
///
/// assert_eq!(cache_key("foo", "en"), "foo:en");
/// assert_ne!(cache_key("a", "b:c"), cache_key("a:b", "c"));
/// ```
#[must_use]
pub fn cache_key(namespace: &str, language: &str) -> String {
    CacheKey::new(namespace, language).to_string()
}

/// Opaque resource payload fetched for a single `(namespace, language)` pair.
///
/// The content is never validated; the read helpers only exist so consumers
/// such as the bundle engine can resolve messages out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bundle(Value);

impl Bundle {
    /// Wraps an arbitrary JSON payload.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// An empty object bundle.
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }

    /// Borrows the raw payload.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the bundle, returning the raw payload.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Looks up a value by dotted path, e.g. `"menu.open"`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |node, segment| node.get(segment))
    }

    /// Looks up a string message by dotted path.
    #[must_use]
    pub fn message(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }
}

impl From<Value> for Bundle {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Default for Bundle {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("foo", "en"), "foo:en");
        assert_eq!(CacheKey::new("common", "de-DE").to_string(), "common:de-DE");
    }

    #[test]
    fn test_cache_key_separator_collision() {
        assert_ne!(cache_key("a", "b:c"), cache_key("a:b", "c"));
        assert_eq!(cache_key("a", "b:c"), "a:b\\:c");
        assert_eq!(cache_key("a:b", "c"), "a\\:b:c");
        assert_ne!(CacheKey::new("a", "b:c"), CacheKey::new("a:b", "c"));
    }

    #[test]
    fn test_cache_key_escapes_backslash() {
        assert_ne!(cache_key("a\\", "b"), cache_key("a", "\\b"));
    }

    #[test]
    fn test_bundle_lookup() {
        let bundle = Bundle::new(json!({
            "greeting": "hi",
            "menu": { "open": "Open", "count": 3 }
        }));

        assert_eq!(bundle.message("greeting"), Some("hi"));
        assert_eq!(bundle.message("menu.open"), Some("Open"));
        assert_eq!(bundle.message("menu.count"), None);
        assert!(bundle.get("menu.count").is_some());
        assert!(bundle.get("missing.path").is_none());
    }

    #[test]
    fn test_bundle_serde_is_transparent() {
        let bundle: Bundle = serde_json::from_str(r#"{"greeting":"hi"}"#).unwrap();
        assert_eq!(bundle.as_value(), &json!({"greeting": "hi"}));
        assert_eq!(serde_json::to_string(&bundle).unwrap(), r#"{"greeting":"hi"}"#);
    }

    proptest! {
        #[test]
        fn test_property_cache_key_deterministic(ns in ".{0,12}", lang in ".{0,12}") {
            prop_assert_eq!(cache_key(&ns, &lang), cache_key(&ns, &lang));
        }

        #[test]
        fn test_property_cache_key_injective(
            a in ("[a-z:\\\\]{0,6}", "[a-z:\\\\]{0,6}"),
            b in ("[a-z:\\\\]{0,6}", "[a-z:\\\\]{0,6}"),
        ) {
            if a != b {
                prop_assert_ne!(cache_key(&a.0, &a.1), cache_key(&b.0, &b.1));
            }
        }
    }
}
