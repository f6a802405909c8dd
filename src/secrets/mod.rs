//! Credential retrieval.
//!
//! The database password is fetched by name from a provider selected in
//! config. Providers never log secret values.

pub mod env;
pub mod file;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{SecretSource, SecretsConfig};

pub use env::EnvSecretProvider;
pub use file::FileSecretProvider;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret '{0}' not found")]
    Missing(String),

    #[error("secret '{name}' is empty")]
    Empty { name: String },

    #[error("failed to read secret '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fetch a credential by name.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<String, SecretError>;
}

/// Build the provider configured in `[secrets]`.
pub fn provider_from_config(config: &SecretsConfig) -> Arc<dyn SecretProvider> {
    match config.provider {
        SecretSource::Env => Arc::new(EnvSecretProvider),
        SecretSource::File => Arc::new(FileSecretProvider::new(&config.dir)),
    }
}

/// Fetch the database password if one is configured.
pub async fn database_password(
    config: &SecretsConfig,
    provider: &dyn SecretProvider,
) -> Result<Option<String>, SecretError> {
    let Some(name) = config.password_name.as_deref() else {
        tracing::info!("No database password secret configured");
        return Ok(None);
    };

    let password = provider.fetch(name).await?;
    tracing::info!(secret = name, "Fetched database password");
    Ok(Some(password))
}

pub(crate) fn non_empty(name: &str, value: String) -> Result<String, SecretError> {
    if value.is_empty() {
        Err(SecretError::Empty { name: name.to_string() })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl SecretProvider for Fixed {
        async fn fetch(&self, name: &str) -> Result<String, SecretError> {
            self.0
                .map(String::from)
                .ok_or_else(|| SecretError::Missing(name.to_string()))
        }
    }

    #[tokio::test]
    async fn test_no_password_configured() {
        let config = SecretsConfig::default();
        assert_eq!(database_password(&config, &Fixed(None)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_password_fetched_by_name() {
        let config = SecretsConfig {
            password_name: Some("db-password".into()),
            ..SecretsConfig::default()
        };

        assert_eq!(
            database_password(&config, &Fixed(Some("hunter2"))).await.unwrap().as_deref(),
            Some("hunter2")
        );
        let err = database_password(&config, &Fixed(None)).await.unwrap_err();
        assert_eq!(err.to_string(), "secret 'db-password' not found");
    }
}
