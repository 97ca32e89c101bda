//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::config::schema::{Environment, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Deployment settings that take precedence over the config file.
///
/// Each one can be given as a flag or through the environment variable the
/// deployment already uses.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Upstream GraphQL endpoint.
    #[arg(long, env = "GRAPHQL_SERVER_URI")]
    pub upstream_uri: Option<String>,

    /// Shared secret sent to the upstream.
    #[arg(long, env = "GRAPHQL_SERVER_SECRET", hide_env_values = true)]
    pub upstream_secret: Option<String>,

    /// Redis address used by the response cache.
    #[arg(long, env = "REDIS_HOST")]
    pub cache_host: Option<String>,

    /// Port to listen on (all interfaces).
    #[arg(long, env = "SERVER_PORT")]
    pub port: Option<u16>,

    /// Environment name; only "production" is recognized, anything else is dev.
    #[arg(long = "env", env = "ENV")]
    pub environment: Option<String>,

    /// Caching is enabled only by the literal value "true".
    #[arg(long, env = "ENABLE_CACHE")]
    pub enable_cache: Option<String>,
}

impl Overrides {
    /// Apply the overrides on top of a base configuration.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(uri) = &self.upstream_uri {
            config.upstream.uri = uri.clone();
        }
        if let Some(secret) = &self.upstream_secret {
            config.upstream.secret = secret.clone();
        }
        if let Some(host) = &self.cache_host {
            config.cache.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{}", port);
        }
        if let Some(env) = &self.environment {
            config.environment = Environment::from_name(env);
        }
        if let Some(flag) = &self.enable_cache {
            config.cache.enabled = flag == "true";
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the startup configuration: optional file, then overrides, then validation.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Outcome of looking for a `.env` file. `Ok(None)` means there was none.
pub type DotenvOutcome = Result<Option<PathBuf>, dotenv::Error>;

/// Load variables from a `.env` file in the working directory, if there is one.
///
/// Runs before logging is configured, so the outcome is returned for
/// [`log_dotenv`] to report once a subscriber is installed.
pub fn load_dotenv() -> DotenvOutcome {
    dotenv_outcome(dotenv::dotenv())
}

pub fn log_dotenv(outcome: &DotenvOutcome) {
    match outcome {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }
}

fn dotenv_outcome(result: dotenv::Result<PathBuf>) -> DotenvOutcome {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
            [upstream]
            uri = "http://127.0.0.1:8080/v1/graphql"
            secret = "from-file"
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.upstream.secret, "from-file");
    }

    #[test]
    fn test_overrides_win() {
        let file = write_config(
            r#"
            [upstream]
            uri = "http://file-host/v1/graphql"

            [cache]
            enabled = true
            "#,
        );

        let overrides = Overrides {
            upstream_uri: Some("https://env-host/v1/graphql".into()),
            port: Some(9000),
            environment: Some("production".into()),
            enable_cache: Some("yes".into()),
            ..Default::default()
        };

        let config = load(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.upstream.uri, "https://env-host/v1/graphql");
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert!(config.environment.is_production());
        // Only the literal "true" enables caching.
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_load_without_file() {
        let overrides = Overrides {
            upstream_uri: Some("http://hasura:8080/v1/graphql".into()),
            enable_cache: Some("true".into()),
            cache_host: Some("redis:6379".into()),
            ..Default::default()
        };

        let config = load(None, &overrides).unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.host, "redis:6379");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = load(None, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("upstream.uri"));
    }

    #[test]
    fn test_parse_error() {
        let file = write_config("[upstream\nuri = ");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_dotenv_is_not_an_error() {
        let missing = dotenv::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(dotenv_outcome(Err(missing)), Ok(None)));
    }

    #[test]
    fn test_malformed_dotenv_is_reported() {
        let malformed = dotenv::Error::LineParse("=no-key".into(), 0);
        assert!(matches!(
            dotenv_outcome(Err(malformed)),
            Err(dotenv::Error::LineParse(_, 0))
        ));
    }

    #[test]
    fn test_loaded_dotenv_path_is_kept() {
        let path = PathBuf::from("/srv/proxy/.env");
        assert_eq!(dotenv_outcome(Ok(path.clone())).unwrap(), Some(path));
    }
}
