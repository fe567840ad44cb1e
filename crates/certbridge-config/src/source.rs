//! Property source trait and the in-memory and environment implementations

use std::collections::HashMap;

/// A named provider of string properties
///
/// Sources are queried in priority order by [`crate::PropertySources`]; a
/// source that does not know a key returns `None` and the next one is asked.
pub trait PropertySource: Send + Sync {
    /// Name shown in logs and diagnostics
    fn name(&self) -> &str;

    /// Look up a raw (unresolved) value
    fn get_property(&self, key: &str) -> Option<String>;

    fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }
}

/// Fixed key/value pairs, used for command-line overrides
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    name: String,
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PropertySource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Process environment with relaxed binding
///
/// A key is looked up verbatim first, then in its upper-case form with `.`
/// and `-` replaced by `_`. `cert.contents` is therefore satisfied by
/// `CERT_CONTENTS`.
#[derive(Debug, Clone)]
pub struct EnvironmentSource {
    vars: HashMap<String, String>,
}

impl EnvironmentSource {
    pub const NAME: &'static str = "systemEnvironment";

    /// Snapshot the current process environment
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Build from explicit variables (useful in tests)
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn env_name(key: &str) -> String {
        key.chars()
            .map(|c| match c {
                '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect()
    }
}

impl PropertySource for EnvironmentSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .or_else(|| self.vars.get(&Self::env_name(key)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source_lookup() {
        let source = MapSource::new("commandLineArgs").with("server.port", "9090");

        assert_eq!(source.name(), "commandLineArgs");
        assert_eq!(source.get_property("server.port"), Some("9090".to_string()));
        assert!(source.get_property("server.address").is_none());
        assert!(source.contains_property("server.port"));
    }

    #[test]
    fn test_env_relaxed_binding() {
        let env = EnvironmentSource::from_vars([("CERT_CONTENTS", "pem")]);
        assert_eq!(env.get_property("cert.contents"), Some("pem".to_string()));
    }

    #[test]
    fn test_env_exact_name_wins() {
        let env = EnvironmentSource::from_vars([
            ("cert.contents", "exact"),
            ("CERT_CONTENTS", "relaxed"),
        ]);
        assert_eq!(env.get_property("cert.contents"), Some("exact".to_string()));
    }

    #[test]
    fn test_env_mixed_case_key() {
        let env =
            EnvironmentSource::from_vars([("TIBCO_EMS_SSLTRUSTEDCERTIFICATE", "/tmp/x.pem")]);
        assert_eq!(
            env.get_property("tibco.ems.SSLTrustedCertificate"),
            Some("/tmp/x.pem".to_string())
        );
    }

    #[test]
    fn test_env_name_mapping() {
        assert_eq!(EnvironmentSource::env_name("server.port"), "SERVER_PORT");
        assert_eq!(EnvironmentSource::env_name("a-b.c"), "A_B_C");
    }
}
