use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required property '{0}' is not defined")]
    MissingProperty(String),

    #[error("Required property '{0}' is empty")]
    EmptyProperty(String),

    #[error("Could not resolve placeholder '{placeholder}' in value of '{key}'")]
    UnresolvablePlaceholder { key: String, placeholder: String },

    #[error("Circular placeholder reference '{0}'")]
    CircularPlaceholder(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to read properties file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
