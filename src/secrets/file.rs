//! Secrets from a mounted directory, one file per secret.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::secrets::{non_empty, SecretError, SecretProvider};

/// Reads `<dir>/<name>`. A single trailing newline is stripped.
#[derive(Debug, Clone)]
pub struct FileSecretProvider {
    dir: PathBuf,
}

impl FileSecretProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl SecretProvider for FileSecretProvider {
    async fn fetch(&self, name: &str) -> Result<String, SecretError> {
        let path = self.dir.join(name);
        let mut value = match tokio::fs::read_to_string(&path).await {
            Ok(value) => value,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SecretError::Missing(name.to_string()))
            }
            Err(source) => {
                return Err(SecretError::Io {
                    name: name.to_string(),
                    source,
                })
            }
        };

        if value.ends_with('\n') {
            value.pop();
            if value.ends_with('\r') {
                value.pop();
            }
        }
        non_empty(name, value)
    }
}
