//! Secure random byte source shared by the token generators and the hasher.
//! Production code draws from the operating system generator; tests can swap
//! in a seeded source through the same trait object.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum EntropyError {
    #[error("secure random source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies cryptographically secure random bytes. Implementations must be
/// safe to share across threads for the lifetime of the process.
pub trait SecureTokenSource: Send + Sync {
    /// Fills `dest` completely with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), EntropyError>;

    /// Returns `n` freshly drawn random bytes.
    fn next_bytes(&self, n: usize) -> Result<Vec<u8>, EntropyError> {
        let mut bytes = vec![0u8; n];
        self.fill_bytes(&mut bytes)?;
        Ok(bytes)
    }
}

/// Operating system CSPRNG. Stateless, so concurrent draws need no locking.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsTokenSource;

impl SecureTokenSource for OsTokenSource {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            error!(error = %e, "operating system entropy source failed");
            EntropyError::Unavailable(format!("{e}"))
        })
    }
}

/// Deterministic source for tests and reproducible fixtures. Never use it to
/// produce real credentials or tokens.
pub struct SeededTokenSource {
    rng: Mutex<StdRng>,
}

impl SeededTokenSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl SecureTokenSource for SeededTokenSource {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| EntropyError::Unavailable("seeded generator lock poisoned".to_string()))?;
        rng.fill_bytes(dest);
        Ok(())
    }
}

static SHARED_SOURCE: Lazy<Arc<dyn SecureTokenSource>> = Lazy::new(|| Arc::new(OsTokenSource));

/// Process-wide OS-backed source, created on first use and never torn down.
pub fn shared_source() -> Arc<dyn SecureTokenSource> {
    Arc::clone(&SHARED_SOURCE)
}
