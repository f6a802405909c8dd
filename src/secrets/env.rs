//! Secrets from environment variables.

use async_trait::async_trait;

use crate::secrets::{non_empty, SecretError, SecretProvider};

/// Reads the secret `name` from the environment variable of the same name.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn fetch(&self, name: &str) -> Result<String, SecretError> {
        let value = std::env::var(name).map_err(|_| SecretError::Missing(name.to_string()))?;
        non_empty(name, value)
    }
}
