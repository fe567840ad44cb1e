//! Layered configuration for certbridge
//!
//! Configuration is an ordered list of named property sources. Lookups walk
//! the list from highest to lowest priority and return the first answer, so a
//! source appended last only acts as a fallback. Values may reference other
//! keys with `${key}` or `${key:default}` placeholders.

pub mod chain;
pub mod error;
pub mod properties;
pub mod source;

pub use chain::PropertySources;
pub use error::ConfigError;
pub use properties::PropertiesSource;
pub use source::{EnvironmentSource, MapSource, PropertySource};
