//! Trust certificate materialization
//!
//! Writes certificate content held in configuration to a temporary `.pem`
//! file at startup and publishes the file's path back into the configuration
//! chain as a fallback source, for clients that only accept a trust
//! certificate as a filesystem path.

pub mod bridge;
pub mod certificate;
pub mod trust_file;

pub use bridge::{
    install, install_in, BridgeError, TrustFileSource, CERT_CONTENTS_KEY,
    INDIRECT_TRUST_FILE_KEY, TRUST_FILE_LOCATION_KEY,
};
pub use certificate::{
    certificate_der, decode_certificate, CertificateError, CertificateSummary, ExtensionSummary,
};
pub use trust_file::{TrustFile, TrustFileError};
