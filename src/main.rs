//! certbridge - Trust certificate bridge
//!
//! Writes a certificate supplied through configuration to a temp file and
//! publishes its path, then serves a debug page on localhost.

use anyhow::{Context, Result};
use certbridge_api::{DebugServer, DebugServerConfig, DebugState};
use certbridge_cert::TRUST_FILE_LOCATION_KEY;
use certbridge_config::{EnvironmentSource, MapSource, PropertiesSource, PropertySources};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Properties compiled into the binary
const BUNDLED_PROPERTIES: &str = include_str!("../application.properties");

/// certbridge - Expose a configured trust certificate as a file path
#[derive(Parser, Debug)]
#[command(name = "certbridge")]
#[command(about = "certbridge - Expose a configured trust certificate as a file path")]
#[command(version)]
#[command(long_version = concat!(env!("GIT_TAG"), "\nCommit: ", env!("GIT_HASH"), "\nBuilt: ", env!("BUILD_TIME")))]
#[command(long_about = r#"
Writes the certificate held in `cert.contents` to a temporary .pem file and
publishes its absolute path as `tibco.ems.SSLTrustedCertificate`, unless a
higher-priority source already defines that key. A debug page echoing the
certificate is served on http://localhost:8080/ by default.

EXAMPLES:
  # Certificate from the environment
  CERT_CONTENTS="$(cat ca.pem)" certbridge

  # Override the port and point at an external properties file
  certbridge --config ./application.properties -D server.port=9090

ENVIRONMENT VARIABLES:
  CERT_CONTENTS       Certificate text (PEM or DER)
  SERVER_PORT         Debug endpoint port
  SERVER_ADDRESS      Debug endpoint bind address
  CERTBRIDGE_CONFIG   External properties file
    "#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// External .properties file, ranked above the bundled defaults
    #[arg(long, env = "CERTBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Property override with the highest priority (repeatable)
    #[arg(short = 'D', long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    overrides: Vec<(String, String)>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }

    Ok((key.to_string(), value.to_string()))
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Assemble the configuration chain, highest priority first
fn build_sources(
    overrides: &[(String, String)],
    env: EnvironmentSource,
    config: Option<&PathBuf>,
) -> Result<PropertySources> {
    let mut sources = PropertySources::new();

    if !overrides.is_empty() {
        let mut args = MapSource::new("commandLineArgs");
        for (key, value) in overrides {
            args.insert(key.clone(), value.clone());
        }
        sources.add_last(args);
    }

    sources.add_last(env);

    if let Some(path) = config {
        let file = PropertiesSource::load(path)
            .with_context(|| format!("Failed to load properties file {:?}", path))?;
        sources.add_last(file);
    }

    sources.add_last(PropertiesSource::parse(
        "classpath [application.properties]",
        BUNDLED_PROPERTIES,
    ));

    Ok(sources)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut sources = build_sources(
        &cli.overrides,
        EnvironmentSource::from_env(),
        cli.config.as_ref(),
    )?;
    info!("Property sources: {:?}", sources.names());

    // Must complete before anything binds
    let trust_file = certbridge_cert::install(&mut sources)
        .context("Failed to materialize trust certificate")?;

    match trust_file.root_store() {
        Ok(store) => info!("Trust store loaded with {} certificate(s)", store.len()),
        Err(e) => warn!(
            "{} does not hold a usable trust certificate: {}",
            trust_file.location(),
            e
        ),
    }

    let state = DebugState::from_sources(&sources)
        .context("Failed to resolve debug endpoint configuration")?;
    if state.trust_file_location != trust_file.location() {
        warn!(
            "'{}' is defined by a higher-priority source: {}",
            TRUST_FILE_LOCATION_KEY, state.trust_file_location
        );
    }

    let address = sources.get_or("server.address", DebugServerConfig::DEFAULT_ADDRESS)?;
    let port = sources.get_parsed("server.port", DebugServerConfig::DEFAULT_PORT)?;

    let server = DebugServer::new(DebugServerConfig::new(&address, port), state);
    server.start_with_shutdown(shutdown_signal()).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    info!("certbridge starting...");

    if let Err(e) = run(cli).await {
        error!("certbridge failed: {:#}", e);
        return Err(e);
    }

    info!("certbridge stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use certbridge_cert::{CERT_CONTENTS_KEY, INDIRECT_TRUST_FILE_KEY};
    use certbridge_config::PropertySource;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("server.port=9090").unwrap(),
            ("server.port".to_string(), "9090".to_string())
        );
        assert_eq!(
            parse_key_val("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_key_val("no-separator").is_err());
        assert!(parse_key_val("=value").is_err());
    }

    #[test]
    fn test_bundled_properties() {
        let bundled = PropertiesSource::parse("bundled", BUNDLED_PROPERTIES);

        assert_eq!(
            bundled.get_property(INDIRECT_TRUST_FILE_KEY),
            Some(format!("${{{}}}", TRUST_FILE_LOCATION_KEY))
        );
        assert_eq!(bundled.get_property("server.port"), Some("8080".to_string()));
    }

    #[test]
    fn test_source_order() {
        let overrides = vec![("server.port".to_string(), "9999".to_string())];
        let env =
            EnvironmentSource::from_vars([("SERVER_PORT", "7777"), ("CERT_CONTENTS", "pem")]);

        let sources = build_sources(&overrides, env, None).unwrap();

        assert_eq!(
            sources.names(),
            vec![
                "commandLineArgs",
                EnvironmentSource::NAME,
                "classpath [application.properties]"
            ]
        );
        assert_eq!(sources.get_parsed::<u16>("server.port", 0).unwrap(), 9999);
        assert_eq!(sources.require(CERT_CONTENTS_KEY).unwrap(), "pem");
    }

    #[test]
    fn test_env_beats_bundled_defaults() {
        let env = EnvironmentSource::from_vars([("SERVER_PORT", "7777")]);
        let sources = build_sources(&[], env, None).unwrap();

        assert_eq!(sources.get_parsed::<u16>("server.port", 0).unwrap(), 7777);
        assert_eq!(sources.require("server.address").unwrap(), "localhost");
    }

    #[test]
    fn test_missing_config_file_fails() {
        let missing = PathBuf::from("/nonexistent/certbridge/application.properties");
        let env = EnvironmentSource::from_vars(Vec::<(String, String)>::new());

        assert!(build_sources(&[], env, Some(&missing)).is_err());
    }

    #[test]
    fn test_startup_fails_without_certificate() {
        let env = EnvironmentSource::from_vars(Vec::<(String, String)>::new());
        let mut sources = build_sources(&[], env, None).unwrap();

        assert!(certbridge_cert::install(&mut sources).is_err());
        assert!(DebugState::from_sources(&sources).is_err());
    }
}
