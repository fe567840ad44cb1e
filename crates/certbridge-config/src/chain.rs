//! Ordered property source chain with placeholder resolution

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::ConfigError;
use crate::source::PropertySource;

/// Matches `${key}` and `${key:default}`
fn placeholder_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid")
    })
}

/// Property sources in priority order (index 0 wins)
#[derive(Default)]
pub struct PropertySources {
    sources: Vec<Box<dyn PropertySource>>,
}

impl fmt::Debug for PropertySources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySources")
            .field("sources", &self.names())
            .finish()
    }
}

impl PropertySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source with the highest priority
    pub fn add_first(&mut self, source: impl PropertySource + 'static) {
        debug!("Adding property source '{}' first", source.name());
        self.sources.insert(0, Box::new(source));
    }

    /// Add a source with the lowest priority
    pub fn add_last(&mut self, source: impl PropertySource + 'static) {
        debug!("Adding property source '{}' last", source.name());
        self.sources.push(Box::new(source));
    }

    /// Source names, highest priority first
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sources.iter().any(|s| s.contains_property(key))
    }

    /// First raw value for `key` along with the name of the source that had it
    pub fn find(&self, key: &str) -> Option<(&str, String)> {
        self.sources
            .iter()
            .find_map(|s| s.get_property(key).map(|v| (s.name(), v)))
    }

    /// Resolved value for `key`, or `None` if no source defines it
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let Some((source, raw)) = self.find(key) else {
            return Ok(None);
        };
        debug!("Property '{}' found in '{}'", key, source);

        let mut stack = vec![key.to_string()];
        self.resolve_value(key, &raw, &mut stack).map(Some)
    }

    /// Resolved value for `key`, failing if it is not defined
    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)?
            .ok_or_else(|| ConfigError::MissingProperty(key.to_string()))
    }

    /// Like [`require`](Self::require) but also rejects an empty value
    pub fn require_non_empty(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.require(key)?;
        if value.is_empty() {
            return Err(ConfigError::EmptyProperty(key.to_string()));
        }
        Ok(value)
    }

    pub fn get_or(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// Parse a value, falling back to `default` when the key is absent
    pub fn get_parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key)? {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(default),
        }
    }

    fn resolve_value(
        &self,
        key: &str,
        value: &str,
        stack: &mut Vec<String>,
    ) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(value.len());
        let mut last = 0;

        for cap in placeholder_pattern().captures_iter(value) {
            let (Some(whole), Some(expr)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            result.push_str(&value[last..whole.start()]);

            let (name, default) = match expr.as_str().split_once(':') {
                Some((name, default)) => (name.trim(), Some(default)),
                None => (expr.as_str().trim(), None),
            };

            if stack.iter().any(|k| k == name) {
                return Err(ConfigError::CircularPlaceholder(name.to_string()));
            }

            match self.find(name) {
                Some((_, raw)) => {
                    stack.push(name.to_string());
                    let resolved = self.resolve_value(name, &raw, stack)?;
                    stack.pop();
                    result.push_str(&resolved);
                }
                None => match default {
                    Some(default) => result.push_str(default),
                    None => {
                        return Err(ConfigError::UnresolvablePlaceholder {
                            key: key.to_string(),
                            placeholder: name.to_string(),
                        })
                    }
                },
            }

            last = whole.end();
        }

        result.push_str(&value[last..]);
        Ok(result)
    }
}
