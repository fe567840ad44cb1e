//! The generated trust certificate file

use rustls::RootCertStore;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::certificate::{certificate_der, CertificateError};

/// Trust file errors
#[derive(Debug, Error)]
pub enum TrustFileError {
    #[error("Certificate content is empty")]
    EmptyContents,

    #[error("Failed to create temporary trust file: {0}")]
    Create(#[source] std::io::Error),

    #[error("Failed to write trust file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read trust file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error("Failed to add certificate to trust store: {0}")]
    TrustStore(String),
}

/// A certificate written to disk for path-based consumers
///
/// The file is not removed when this value is dropped; it lives in the OS
/// temp directory for the remaining lifetime of the process and beyond.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustFile {
    path: PathBuf,
}

impl TrustFile {
    pub const PREFIX: &'static str = "TibcoCert";
    pub const SUFFIX: &'static str = ".pem";

    /// Write `contents` to a new file in the OS temp directory
    pub fn materialize(contents: &str) -> Result<Self, TrustFileError> {
        Self::materialize_in(&std::env::temp_dir(), contents)
    }

    /// Write `contents` to a new uniquely named file inside `dir`
    ///
    /// All bytes are flushed and synced before this returns.
    pub fn materialize_in(dir: &Path, contents: &str) -> Result<Self, TrustFileError> {
        if contents.is_empty() {
            return Err(TrustFileError::EmptyContents);
        }

        let temp = tempfile::Builder::new()
            .prefix(Self::PREFIX)
            .suffix(Self::SUFFIX)
            .tempfile_in(dir)
            .map_err(TrustFileError::Create)?;

        let (file, path) = temp.keep().map_err(|e| TrustFileError::Create(e.error))?;
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map_err(TrustFileError::Create)?
                .join(path)
        };

        write_all(file, contents.as_bytes()).map_err(|source| TrustFileError::Write {
            path: path.display().to_string(),
            source,
        })?;

        info!(
            "Wrote {} bytes of certificate content to {}",
            contents.len(),
            path.display()
        );

        Ok(Self { path })
    }

    /// Refer to an existing trust file, e.g. a location resolved from config
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path as a configuration value
    pub fn location(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Read the file as text and join its lines without a separator
    ///
    /// `\n`, `\r\n` and a lone `\r` all end a line.
    pub async fn read_joined_lines(&self) -> Result<String, TrustFileError> {
        let bytes = self.read_bytes().await?;
        Ok(String::from_utf8_lossy(&bytes)
            .split(|c: char| c == '\r' || c == '\n')
            .collect())
    }

    /// Read the raw file bytes
    pub async fn read_bytes(&self) -> Result<Vec<u8>, TrustFileError> {
        debug!("Reading trust file {}", self.path.display());
        fs::read(&self.path)
            .await
            .map_err(|source| TrustFileError::Read {
                path: self.path.display().to_string(),
                source,
            })
    }

    /// Load the certificate into a rustls root store
    pub fn root_store(&self) -> Result<RootCertStore, TrustFileError> {
        let bytes = std::fs::read(&self.path).map_err(|source| TrustFileError::Read {
            path: self.path.display().to_string(),
            source,
        })?;

        let der = certificate_der(&bytes)?;
        let mut store = RootCertStore::empty();
        store
            .add(der)
            .map_err(|e| TrustFileError::TrustStore(e.to_string()))?;

        Ok(store)
    }
}

fn write_all(file: File, bytes: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}
