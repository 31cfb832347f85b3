//! Raw configuration sources
//!
//! A [`RawSource`] is an untyped string-keyed map supplying candidate option
//! values. One comes from the process environment, one from host parameters.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use anyhow::{Context, Result};

/// Where a raw source's values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Process environment; only prefixed keys are considered
    Environment,
    /// Host-supplied parameters; every key is considered
    Parameters,
}

/// An unordered string-keyed map of candidate option values
#[derive(Debug, Clone)]
pub struct RawSource {
    kind: SourceKind,
    values: BTreeMap<String, String>,
}

impl RawSource {
    /// An empty source of the given kind
    #[must_use]
    pub const fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
        }
    }

    /// Snapshot the current process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::environment_os(std::env::vars_os())
    }

    /// Build an environment source from OS strings.
    ///
    /// Keys that are not valid UTF-8 cannot name an option and are dropped.
    /// Values are converted lossily.
    pub fn environment_os<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        Self::environment(pairs.into_iter().filter_map(|(key, value)| {
            let key = key.into_string().ok()?;
            Some((key, value.to_string_lossy().into_owned()))
        }))
    }

    /// Build an environment source from key/value pairs
    pub fn environment<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::collect(SourceKind::Environment, pairs)
    }

    /// Build a host parameter source from key/value pairs
    pub fn parameters<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::collect(SourceKind::Parameters, pairs)
    }

    fn collect<I, K, V>(kind: SourceKind, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind,
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse host parameters from a flat TOML table.
    ///
    /// Scalar values are stringified (`true`, `1500`, `"text"` → `text`).
    /// Arrays and nested tables are rejected.
    pub fn parameters_from_toml(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content).context("Failed to parse parameters")?;
        let mut values = BTreeMap::new();
        for (key, value) in table {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Datetime(d) => d.to_string(),
                toml::Value::Array(_) | toml::Value::Table(_) => {
                    anyhow::bail!("Parameter '{key}' must be a scalar value")
                }
            };
            values.insert(key, text);
        }
        Ok(Self {
            kind: SourceKind::Parameters,
            values,
        })
    }

    /// Read host parameters from a TOML file
    pub fn parameters_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameters file: {}", path.display()))?;
        Self::parameters_from_toml(&content)
            .with_context(|| format!("in parameters file '{}'", path.display()))
    }

    /// Add or replace one entry
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Merge entries from another source; later entries win
    pub fn extend(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    /// Which kind of source this is
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Exact-key lookup
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// True when the exact key is present, whatever its value
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_environment_os_drops_non_utf8_keys() {
        use std::os::unix::ffi::OsStringExt;

        let source = RawSource::environment_os([
            (OsString::from_vec(b"BAD_\xff".to_vec()), OsString::from("x")),
            (OsString::from("QUACKERS_LOG_PREFIX"), OsString::from_vec(b"[\xfe]".to_vec())),
            (OsString::from("QUACKERS_SHOW_TOTALS"), OsString::from("yes")),
        ]);
        assert_eq!(source.kind(), SourceKind::Environment);
        assert_eq!(source.len(), 2);
        assert_eq!(source.get("QUACKERS_LOG_PREFIX"), Some("[\u{fffd}]"));
        assert_eq!(source.get("QUACKERS_SHOW_TOTALS"), Some("yes"));
    }

    #[test]
    fn test_parameters_from_pairs() {
        let source = RawSource::parameters([("PassLabel", "ok"), ("ShowTotals", "yes")]);
        assert_eq!(source.kind(), SourceKind::Parameters);
        assert_eq!(source.len(), 2);
        assert_eq!(source.get("PassLabel"), Some("ok"));
        assert_eq!(source.get("passlabel"), None);
    }

    #[test]
    fn test_environment_from_pairs() {
        let source = RawSource::environment([("QUACKERS_THEME", "darker")]);
        assert_eq!(source.kind(), SourceKind::Environment);
        assert!(source.contains("QUACKERS_THEME"));
    }

    #[test]
    fn test_parameters_from_toml_stringifies_scalars() {
        let source = RawSource::parameters_from_toml(
            r#"
PassLabel = "PASS"
show_totals = true
slow-test-threshold-ms = 1500
"#,
        )
        .unwrap();

        assert_eq!(source.get("PassLabel"), Some("PASS"));
        assert_eq!(source.get("show_totals"), Some("true"));
        assert_eq!(source.get("slow-test-threshold-ms"), Some("1500"));
    }

    #[test]
    fn test_parameters_from_toml_rejects_tables() {
        let err = RawSource::parameters_from_toml("[nested]\nkey = 1\n").unwrap_err();
        assert!(err.to_string().contains("scalar"));
    }

    #[test]
    fn test_parameters_from_toml_rejects_invalid_toml() {
        assert!(RawSource::parameters_from_toml("this is = = not toml").is_err());
    }

    #[test]
    fn test_parameters_from_path_missing_file() {
        let err = RawSource::parameters_from_path("/nonexistent/params.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read parameters file"));
    }

    #[test]
    fn test_extend_later_wins() {
        let mut source = RawSource::parameters([("a", "1"), ("b", "2")]);
        source.extend(RawSource::parameters([("b", "3")]));
        assert_eq!(source.get("a"), Some("1"));
        assert_eq!(source.get("b"), Some("3"));
    }
}
