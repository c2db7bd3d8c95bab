//! Configuration loader for policy and hasher settings. The JSON document uses
//! the same property names operators already know (`minLength`, `blacklist`,
//! `whitelist`, ...) and every field falls back to a safe default.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::crypto::digest::{CredentialHasher, HashError};
use crate::crypto::entropy::SecureTokenSource;
use crate::crypto::tokens::{OneTimeCodeGenerator, TokenError};
use crate::policy::{PasswordPolicy, PolicyError, PolicySettings};

const DEFAULT_ALGORITHM: &str = "SHA-256";
const DEFAULT_CODE_LENGTH: i64 = 6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("password policy rejected: {0}")]
    Policy(#[from] PolicyError),
    #[error("hasher rejected: {0}")]
    Hasher(#[from] HashError),
    #[error("one-time code settings rejected: {0}")]
    Token(#[from] TokenError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityConfig {
    pub password_policy: PolicySettings,
    pub hash_algorithm: String,
    pub code_length: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            password_policy: PolicySettings::default(),
            hash_algorithm: DEFAULT_ALGORITHM.to_string(),
            code_length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl SecurityConfig {
    pub fn build_policy(&self) -> Result<PasswordPolicy, ConfigError> {
        Ok(PasswordPolicy::new(&self.password_policy)?)
    }

    pub fn build_hasher(&self) -> Result<CredentialHasher, ConfigError> {
        Ok(CredentialHasher::new(&self.hash_algorithm)?)
    }

    pub fn build_code_generator(
        &self,
        source: Arc<dyn SecureTokenSource>,
    ) -> Result<OneTimeCodeGenerator, ConfigError> {
        Ok(OneTimeCodeGenerator::with_length(source, self.code_length)?)
    }
}

/// Loads the JSON configuration file. Values are only parsed here; they are
/// validated when the components are built.
pub fn load_config(path: impl AsRef<Path>) -> Result<SecurityConfig, ConfigError> {
    let path = path.as_ref();
    let raw_json = fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{e}")))?;
    let config: SecurityConfig =
        serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(format!("{e}")))?;
    debug!(path = %path.display(), algorithm = %config.hash_algorithm, "loaded security config");
    Ok(config)
}
