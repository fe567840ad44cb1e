//! `.properties` file support
//!
//! Supports the common subset of the format: `key=value` or `key: value`
//! entries, `#` and `!` comment lines, and a trailing backslash to continue
//! a value on the next line. Backslash escapes (`\\`, `\=`, `\:`, `\ `,
//! `\t`, `\n`, `\r`) are decoded in both keys and values.

use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;
use crate::source::PropertySource;

/// Properties parsed from a `.properties` document
#[derive(Debug, Clone)]
pub struct PropertiesSource {
    name: String,
    values: HashMap<String, String>,
}

impl PropertiesSource {
    /// Parse properties from a string
    pub fn parse(name: impl Into<String>, content: &str) -> Self {
        let mut values = HashMap::new();
        let mut pending = String::new();
        let mut continuing = false;

        for raw in content.lines() {
            let line = raw.trim_start();

            if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            // An even run of trailing backslashes is a sequence of escaped backslashes
            let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
            if trailing % 2 == 1 {
                pending.push_str(&line[..line.len() - 1]);
                continuing = true;
                continue;
            }

            pending.push_str(line);
            continuing = false;
            let entry = std::mem::take(&mut pending);
            if let Some((key, value)) = split_entry(&entry) {
                values.insert(key, value);
            }
        }

        // Dangling continuation at end of input
        if !pending.is_empty() {
            if let Some((key, value)) = split_entry(&pending) {
                values.insert(key, value);
            }
        }

        Self {
            name: name.into(),
            values,
        }
    }

    /// Load properties from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let source = Self::parse(format!("file [{}]", path.display()), &content);
        debug!("Loaded {} properties from {}", source.len(), path.display());

        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PropertySource for PropertiesSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Split `key=value` / `key: value` at the first unescaped separator
fn split_entry(entry: &str) -> Option<(String, String)> {
    let chars = decode_escapes(entry);
    let idx = chars
        .iter()
        .position(|&(c, escaped)| !escaped && (c == '=' || c == ':'));
    let (key, value) = match idx {
        Some(i) => (&chars[..i], &chars[i + 1..]),
        None => (&chars[..], &[][..]),
    };

    let key = trim_unescaped(key);
    if key.is_empty() {
        return None;
    }

    Some((key, trim_unescaped(value)))
}

/// Decode backslash escapes, marking which characters were escaped
fn decode_escapes(text: &str) -> Vec<(char, bool)> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push((c, false));
            continue;
        }
        match chars.next() {
            Some('t') => out.push(('\t', true)),
            Some('n') => out.push(('\n', true)),
            Some('r') => out.push(('\r', true)),
            Some(other) => out.push((other, true)),
            None => {}
        }
    }

    out
}

/// Trim surrounding whitespace that was not written as an escape
fn trim_unescaped(chars: &[(char, bool)]) -> String {
    let blank = |&(c, escaped): &(char, bool)| !escaped && c.is_whitespace();
    let start = chars.iter().position(|c| !blank(c)).unwrap_or(chars.len());
    let end = chars.iter().rposition(|c| !blank(c)).map_or(start, |i| i + 1);

    chars[start..end].iter().map(|&(c, _)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_entries() {
        let props = PropertiesSource::parse(
            "test",
            r#"
# comment
! also a comment
SSLTrustedCertificate=${tibco.ems.SSLTrustedCertificate}
server.port: 9090
  spaced.key   =   spaced value
"#,
        );

        assert_eq!(props.len(), 3);
        assert_eq!(
            props.get_property("SSLTrustedCertificate"),
            Some("${tibco.ems.SSLTrustedCertificate}".to_string())
        );
        assert_eq!(props.get_property("server.port"), Some("9090".to_string()));
        assert_eq!(props.get_property("spaced.key"), Some("spaced value".to_string()));
    }

    #[test]
    fn test_parse_line_continuation() {
        let props = PropertiesSource::parse("test", "greeting=hello \\\n    world\nnext=1\n");

        assert_eq!(props.get_property("greeting"), Some("hello world".to_string()));
        assert_eq!(props.get_property("next"), Some("1".to_string()));
    }

    #[test]
    fn test_escaped_trailing_backslash_ends_entry() {
        let props = PropertiesSource::parse("test", "path=C:\\\\certs\\\\\nnext=1\n");

        assert_eq!(props.get_property("path"), Some("C:\\certs\\".to_string()));
        assert_eq!(props.get_property("next"), Some("1".to_string()));
    }

    #[test]
    fn test_parse_escape_sequences() {
        let props = PropertiesSource::parse(
            "test",
            "key\\ with\\ space=a\\=b\\:c\npadded=value\\ \ntabbed=x\\ty\n",
        );

        assert_eq!(props.get_property("key with space"), Some("a=b:c".to_string()));
        assert_eq!(props.get_property("padded"), Some("value ".to_string()));
        assert_eq!(props.get_property("tabbed"), Some("x\ty".to_string()));
    }

    #[test]
    fn test_parse_key_without_value() {
        let props = PropertiesSource::parse("test", "flag\n");
        assert_eq!(props.get_property("flag"), Some(String::new()));
    }

    #[test]
    fn test_value_may_contain_separator() {
        let props = PropertiesSource::parse("test", "url=http://localhost:8080/\n");
        assert_eq!(
            props.get_property("url"),
            Some("http://localhost:8080/".to_string())
        );
    }

    #[test]
    fn test_load_from_file() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("application.properties");
        std::fs::write(&path, "server.port=8181\n").unwrap();

        let props = PropertiesSource::load(&path).unwrap();
        assert!(props.name().contains("application.properties"));
        assert_eq!(props.get_property("server.port"), Some("8181".to_string()));
    }

    #[test]
    fn test_load_missing_file() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let result = PropertiesSource::load(&temp_dir.path().join("missing.properties"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
