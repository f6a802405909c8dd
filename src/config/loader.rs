//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => write!(f, "Invalid value '{}' for {}", value, var),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_file(path)?,
        None => ServiceConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay deployment environment variables onto `config`.
///
/// Recognised: `DB_USER`, `DB_NAME`, `DB_HOST`, `DB_PORT`, `DB_READ_HOST`,
/// `DB_READ_PORT`, `DB_PASSWORD_SECRET` and `PORT`. Empty values are ignored.
pub fn apply_env_overrides<F>(mut config: ServiceConfig, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(user) = get("DB_USER") {
        config.database.user = user;
    }
    if let Some(name) = get("DB_NAME") {
        config.database.name = name;
    }
    if let Some(host) = get("DB_HOST") {
        config.database.host = host;
    }
    if let Some(port) = get("DB_PORT") {
        config.database.port = parse_port("DB_PORT", port)?;
    }
    if let Some(host) = get("DB_READ_HOST") {
        config.database.read_host = Some(host);
    }
    if let Some(port) = get("DB_READ_PORT") {
        config.database.read_port = Some(parse_port("DB_READ_PORT", port)?);
    }
    if let Some(secret) = get("DB_PASSWORD_SECRET") {
        config.secrets.password_name = Some(secret);
    }
    if let Some(port) = get("PORT") {
        let port = parse_port("PORT", port)?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    Ok(config)
}

fn parse_port(var: &'static str, value: String) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(port) => Ok(port),
        Err(_) => Err(ConfigError::Env { var, value }),
    }
}
