//! Configuration - per-component config strings and runtime settings.
//!
//! Components declare options inline in markup with a small mini-syntax:
//!
//! ```text
//! <ul data-ui="list" data-config="limit: 10; order: desc">
//! ```
//!
//! [`ComponentConfig::parse`] turns that into a string map. No escaping,
//! nesting or type coercion; every value stays a string.
//!
//! [`RuntimeConfig`] holds the attribute names the runtime looks for and
//! the failure policy. It deserializes from JSON with every field optional.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Component Config
// =============================================================================

/// Parsed `key:value;key:value` options of one component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentConfig {
    entries: BTreeMap<String, String>,
}

impl ComponentConfig {
    /// Parse the mini-syntax.
    ///
    /// Splits on `;`, then on the first `:`. Keys and values are trimmed and
    /// the last value wins for duplicate keys. Segments without a `:` or with
    /// an empty key are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut entries = BTreeMap::new();

        for option in raw.split(';') {
            let Some((key, value)) = option.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), value.trim().to_string());
        }

        Self { entries }
    }

    /// Parse an optional attribute value; absent means empty.
    pub fn from_attribute(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
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
}

// =============================================================================
// Runtime Config
// =============================================================================

/// Markup attribute names the runtime reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    /// Marks a component root and names its definition.
    pub component: String,
    /// Channel the component subscribes to for pushes.
    pub channel: String,
    /// Inline config string.
    pub config: String,
    /// Marks a repeatable record region.
    pub scope: String,
    /// Marks a child to detach as a template.
    pub template: String,
    /// Rendered variant of a scope (`empty` is the placeholder variant).
    pub version: String,
    /// Marks a value-carrying node inside a scope.
    pub prop: String,
    /// Record identity.
    pub id: String,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            component: "data-ui".into(),
            channel: "data-channel".into(),
            config: "data-config".into(),
            scope: "data-scope".into(),
            template: "data-template".into(),
            version: "data-version".into(),
            prop: "data-prop".into(),
            id: "data-id".into(),
        }
    }
}

/// Version marker of a placeholder scope that must be replaced from a
/// template before instructions run.
pub const EMPTY_VERSION: &str = "empty";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub attributes: Attributes,
    /// Keep going after a node or subscriber fails, logging the failure.
    /// When false the first failure aborts the operation and is returned.
    pub isolate_failures: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            attributes: Attributes::default(),
            isolate_failures: true,
        }
    }
}

impl RuntimeConfig {
    /// Load settings from JSON. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let config = ComponentConfig::parse("a:1;b:2");
        assert_eq!(config.len(), 2);
        assert_eq!(config.get("a"), Some("1"));
        assert_eq!(config.get("b"), Some("2"));
    }

    #[test]
    fn test_parse_empty_and_absent() {
        assert!(ComponentConfig::parse("").is_empty());
        assert!(ComponentConfig::from_attribute(None).is_empty());
    }

    #[test]
    fn test_parse_last_wins() {
        let config = ComponentConfig::parse("a:1;a:2");
        assert_eq!(config.len(), 1);
        assert_eq!(config.get("a"), Some("2"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let config = ComponentConfig::parse("  a : 1 ");
        assert_eq!(config.get("a"), Some("1"));
    }

    #[test]
    fn test_parse_splits_on_first_colon() {
        let config = ComponentConfig::parse("url:http://example.com");
        assert_eq!(config.get("url"), Some("http://example.com"));
    }

    #[test]
    fn test_parse_skips_junk_segments() {
        let config = ComponentConfig::parse("a:1;;novalue; :x;b:");
        assert_eq!(config.get("a"), Some("1"));
        assert_eq!(config.get("b"), Some(""));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_runtime_config_defaults() {
        let config = RuntimeConfig::default();
        assert!(config.isolate_failures);
        assert_eq!(config.attributes.component, "data-ui");
        assert_eq!(config.attributes.scope, "data-scope");
    }

    #[test]
    fn test_runtime_config_from_json() {
        let config =
            RuntimeConfig::from_json(r#"{"isolate_failures": false, "attributes": {"component": "ui"}}"#)
                .unwrap();
        assert!(!config.isolate_failures);
        assert_eq!(config.attributes.component, "ui");
        // Untouched attributes keep their defaults
        assert_eq!(config.attributes.channel, "data-channel");
    }

    #[test]
    fn test_runtime_config_rejects_bad_json() {
        assert!(RuntimeConfig::from_json("{").is_err());
    }
}
