//! X.509 decoding for display
//!
//! Accepts a single certificate in PEM or DER form and renders its
//! human-readable summary. Nothing here validates the certificate.

use rustls::pki_types::CertificateDer;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use x509_parser::der_parser::oid::Oid;
use x509_parser::extensions::GeneralName;
use x509_parser::objects::{oid2sn, oid_registry};
use x509_parser::prelude::{FromDer, X509Certificate};

/// Certificate decoding errors
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("Certificate data is empty")]
    Empty,

    #[error("No certificate found in PEM data")]
    NoCertificate,

    #[error("Invalid PEM data: {0}")]
    Pem(String),

    #[error("Failed to parse X.509 certificate: {0}")]
    Parse(String),
}

/// Extract the first certificate as DER
///
/// PEM input is recognised by its `-----BEGIN ` armor; anything else is
/// taken to already be DER.
pub fn certificate_der(bytes: &[u8]) -> Result<CertificateDer<'static>, CertificateError> {
    if bytes.is_empty() {
        return Err(CertificateError::Empty);
    }

    if !looks_like_pem(bytes) {
        return Ok(CertificateDer::from(bytes.to_vec()));
    }

    rustls_pemfile::certs(&mut &bytes[..])
        .next()
        .ok_or(CertificateError::NoCertificate)?
        .map_err(|e| CertificateError::Pem(e.to_string()))
}

fn looks_like_pem(bytes: &[u8]) -> bool {
    const ARMOR: &[u8] = b"-----BEGIN ";
    bytes.windows(ARMOR.len()).any(|w| w == ARMOR)
}

/// Decode a single certificate into its display summary
pub fn decode_certificate(bytes: &[u8]) -> Result<CertificateSummary, CertificateError> {
    let der = certificate_der(bytes)?;
    let (_, cert) = X509Certificate::from_der(der.as_ref())
        .map_err(|e| CertificateError::Parse(e.to_string()))?;

    Ok(CertificateSummary::from_x509(&cert))
}

/// An extension present in the certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSummary {
    pub oid: String,
    pub critical: bool,
}

/// Owned, printable view of a decoded certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    /// X.509 version number as shown to humans (1, 2 or 3)
    pub version: u32,
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    pub not_before: String,
    pub not_after: String,
    pub subject_alt_names: Vec<String>,
    pub extensions: Vec<ExtensionSummary>,
}

impl CertificateSummary {
    fn from_x509(cert: &X509Certificate<'_>) -> Self {
        let subject_alt_names = match cert.subject_alternative_name() {
            Ok(Some(san)) => san
                .value
                .general_names
                .iter()
                .map(describe_general_name)
                .collect(),
            _ => Vec::new(),
        };

        let extensions = cert
            .extensions()
            .iter()
            .map(|ext| ExtensionSummary {
                oid: describe_oid(&ext.oid),
                critical: ext.critical,
            })
            .collect();

        Self {
            version: cert.version().0 + 1,
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.raw_serial_as_string(),
            signature_algorithm: describe_oid(&cert.signature_algorithm.algorithm),
            public_key_algorithm: describe_oid(&cert.public_key().algorithm.algorithm),
            not_before: cert.validity().not_before.to_string(),
            not_after: cert.validity().not_after.to_string(),
            subject_alt_names,
            extensions,
        }
    }
}

impl fmt::Display for CertificateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        writeln!(f, "  Version: V{}", self.version)?;
        writeln!(f, "  Subject: {}", self.subject)?;
        writeln!(f, "  Signature Algorithm: {}", self.signature_algorithm)?;
        writeln!(f, "  Key: {}", self.public_key_algorithm)?;
        writeln!(
            f,
            "  Validity: [From: {}, To: {}]",
            self.not_before, self.not_after
        )?;
        writeln!(f, "  Issuer: {}", self.issuer)?;
        writeln!(f, "  SerialNumber: [{}]", self.serial)?;

        if !self.subject_alt_names.is_empty() {
            writeln!(
                f,
                "  SubjectAlternativeNames: [{}]",
                self.subject_alt_names.join(", ")
            )?;
        }

        if !self.extensions.is_empty() {
            writeln!(f, "  Extensions:")?;
            for ext in &self.extensions {
                writeln!(f, "    {} critical={}", ext.oid, ext.critical)?;
            }
        }

        write!(f, "]")
    }
}

/// Short name with dotted OID, or just the dotted form when unknown
fn describe_oid(oid: &Oid<'_>) -> String {
    match oid2sn(oid, oid_registry()) {
        Ok(name) => format!("{} ({})", name, oid.to_id_string()),
        Err(_) => oid.to_id_string(),
    }
}

fn describe_general_name(name: &GeneralName<'_>) -> String {
    match name {
        GeneralName::DNSName(dns) => format!("DNS:{}", dns),
        GeneralName::RFC822Name(email) => format!("email:{}", email),
        GeneralName::URI(uri) => format!("URI:{}", uri),
        GeneralName::IPAddress(bytes) => match ip_from_bytes(bytes) {
            Some(ip) => format!("IP:{}", ip),
            None => format!("IP:{:02x?}", bytes),
        },
        other => format!("{:?}", other),
    }
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        return Some(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        return Some(IpAddr::V6(Ipv6Addr::from(octets)));
    }
    None
}
