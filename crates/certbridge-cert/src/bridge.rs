//! Startup hook that turns configured certificate content into a file path
//!
//! [`install`] reads `cert.contents` from the configuration chain, writes it
//! to a temp file and appends a [`TrustFileSource`] as the lowest-priority
//! source. Any source earlier in the chain that defines
//! `tibco.ems.SSLTrustedCertificate` keeps precedence over the generated path.

use certbridge_config::{ConfigError, PropertySource, PropertySources};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::trust_file::{TrustFile, TrustFileError};

/// Certificate content to materialize
pub const CERT_CONTENTS_KEY: &str = "cert.contents";

/// Location of the generated trust file
pub const TRUST_FILE_LOCATION_KEY: &str = "tibco.ems.SSLTrustedCertificate";

/// Key defined in the bundled properties that refers to the location above
pub const INDIRECT_TRUST_FILE_KEY: &str = "SSLTrustedCertificate";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Certificate configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    TrustFile(#[from] TrustFileError),
}

/// Fallback source answering only [`TRUST_FILE_LOCATION_KEY`]
#[derive(Debug, Clone)]
pub struct TrustFileSource {
    location: String,
}

impl TrustFileSource {
    pub const NAME: &'static str = "trustFileLocation";

    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl PropertySource for TrustFileSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn get_property(&self, key: &str) -> Option<String> {
        (key == TRUST_FILE_LOCATION_KEY).then(|| self.location.clone())
    }
}

/// Materialize the configured certificate in the OS temp directory
pub fn install(sources: &mut PropertySources) -> Result<TrustFile, BridgeError> {
    install_in(sources, &std::env::temp_dir())
}

/// Materialize the configured certificate inside `dir`
pub fn install_in(sources: &mut PropertySources, dir: &Path) -> Result<TrustFile, BridgeError> {
    let contents = sources.require_non_empty(CERT_CONTENTS_KEY)?;

    let trust_file = TrustFile::materialize_in(dir, &contents)?;
    sources.add_last(TrustFileSource::new(trust_file.location()));

    info!(
        "Registered '{}' fallback -> {}",
        TRUST_FILE_LOCATION_KEY,
        trust_file.path().display()
    );

    Ok(trust_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use certbridge_config::MapSource;

    #[test]
    fn test_source_answers_single_key() {
        let source = TrustFileSource::new("/tmp/TibcoCert123.pem");

        assert_eq!(
            source.get_property(TRUST_FILE_LOCATION_KEY),
            Some("/tmp/TibcoCert123.pem".to_string())
        );
        assert!(source.get_property(CERT_CONTENTS_KEY).is_none());
        assert!(source.get_property(INDIRECT_TRUST_FILE_KEY).is_none());
        assert!(!source.contains_property("anything.else"));
    }

    #[test]
    fn test_install_appends_last() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = PropertySources::new();
        sources.add_last(MapSource::new("commandLineArgs").with(CERT_CONTENTS_KEY, "pem"));

        install_in(&mut sources, dir.path()).unwrap();

        assert_eq!(sources.names(), vec!["commandLineArgs", TrustFileSource::NAME]);
    }

    #[test]
    fn test_install_missing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = PropertySources::new();

        let result = install_in(&mut sources, dir.path());
        assert!(matches!(
            result,
            Err(BridgeError::Config(ConfigError::MissingProperty(_)))
        ));
        assert!(sources.is_empty());
    }
}
