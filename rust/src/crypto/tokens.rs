//! Short-lived random tokens: URL-safe anti-forgery tokens for web forms and
//! numeric one-time codes for out-of-band verification. Neither generator
//! tracks issued values; callers enforce single use.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;
use tracing::debug;

use super::entropy::{shared_source, EntropyError, SecureTokenSource};

const TOKEN_BYTES: usize = 32;
const DEFAULT_CODE_LENGTH: usize = 6;
pub const MAX_CODE_LENGTH: usize = 64;
const DIGITS: &[u8; 10] = b"0123456789";
/// Largest multiple of ten that fits in a byte; draws at or above it are
/// rejected so `byte % 10` stays uniform.
const DIGIT_REJECT_AT: u8 = 250;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("one-time code length must be between 0 and {MAX_CODE_LENGTH} (got {0})")]
    InvalidLength(i64),
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

/// Produces 256-bit anti-forgery tokens encoded as 43 URL-safe characters.
#[derive(Clone)]
pub struct AntiForgeryTokenGenerator {
    source: Arc<dyn SecureTokenSource>,
}

impl AntiForgeryTokenGenerator {
    pub fn new(source: Arc<dyn SecureTokenSource>) -> Self {
        Self { source }
    }

    pub fn generate(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.source.fill_bytes(&mut bytes)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl Default for AntiForgeryTokenGenerator {
    fn default() -> Self {
        Self::new(shared_source())
    }
}

/// Produces fixed-length decimal codes, each digit drawn independently.
#[derive(Clone)]
pub struct OneTimeCodeGenerator {
    source: Arc<dyn SecureTokenSource>,
    required_length: usize,
}

impl OneTimeCodeGenerator {
    /// Builds a generator for codes of `required_length` digits. Lengths from
    /// configuration outside `0..=MAX_CODE_LENGTH` are rejected.
    pub fn with_length(
        source: Arc<dyn SecureTokenSource>,
        required_length: i64,
    ) -> Result<Self, TokenError> {
        let required_length = usize::try_from(required_length)
            .ok()
            .filter(|&len| len <= MAX_CODE_LENGTH)
            .ok_or(TokenError::InvalidLength(required_length))?;
        Ok(Self {
            source,
            required_length,
        })
    }

    pub fn new(source: Arc<dyn SecureTokenSource>) -> Self {
        Self {
            source,
            required_length: DEFAULT_CODE_LENGTH,
        }
    }

    pub fn required_length(&self) -> usize {
        self.required_length
    }

    pub fn generate(&self) -> Result<String, TokenError> {
        let mut code = String::with_capacity(self.required_length);
        // Most draws are accepted, so one byte per missing digit is usually enough.
        let mut pool = Vec::new();
        while code.len() < self.required_length {
            pool.resize(self.required_length - code.len(), 0);
            self.source.fill_bytes(&mut pool)?;
            for &byte in pool.iter().filter(|&&b| b < DIGIT_REJECT_AT) {
                if code.len() == self.required_length {
                    break;
                }
                code.push(DIGITS[usize::from(byte % 10)] as char);
            }
        }
        debug!(length = self.required_length, "generated one-time code");
        Ok(code)
    }
}

impl Default for OneTimeCodeGenerator {
    fn default() -> Self {
        Self::new(shared_source())
    }
}
