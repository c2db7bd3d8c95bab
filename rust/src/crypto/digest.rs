//! Salted message-digest hashing for credentials kept in an external store.
//!
//! Two input layouts exist and they are not interchangeable:
//! - storage hashes `utf8(password) || raw_salt_bytes`
//! - comparison hashes `utf8(password + base64_salt_text)`
//!
//! A password stored with [`CredentialHasher::hash_for_storage`] therefore does
//! not reproduce its hash through [`CredentialHasher::hash_for_comparison`].
//! Both layouts are kept unchanged;
//! [`CredentialHasher::verify_stored`] recomputes the storage layout and is the
//! path to use when checking a login against a stored record.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use constant_time_eq::constant_time_eq;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::entropy::{shared_source, EntropyError, SecureTokenSource};

const SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("stored salt is not valid base64: {0}")]
    InvalidSalt(String),
    #[error("stored hash is not valid base64: {0}")]
    InvalidHash(String),
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

/// Digest functions accepted by [`CredentialHasher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DigestAlgorithm {
    Sha1 = 0,
    Sha224 = 1,
    Sha256 = 2,
    Sha384 = 3,
    Sha512 = 4,
    Sha512_224 = 5,
    Sha512_256 = 6,
}

impl DigestAlgorithm {
    pub const ALL: [DigestAlgorithm; 7] = [
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha224,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::Sha512_224,
        DigestAlgorithm::Sha512_256,
    ];

    /// Canonical name, e.g. `SHA-256`.
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha224 => "SHA-224",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
            DigestAlgorithm::Sha512_224 => "SHA-512/224",
            DigestAlgorithm::Sha512_256 => "SHA-512/256",
        }
    }

    /// Digest size in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha224 | DigestAlgorithm::Sha512_224 => 28,
            DigestAlgorithm::Sha256 | DigestAlgorithm::Sha512_256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
            DigestAlgorithm::Sha512_224 => Sha512_224::digest(data).to_vec(),
            DigestAlgorithm::Sha512_256 => Sha512_256::digest(data).to_vec(),
        }
    }

    /// Decodes a tag written by [`CredentialHasher`], which only ever stores
    /// `algorithm as u8` for a parsed algorithm.
    fn from_tag(tag: u8) -> Self {
        match Self::try_from(tag) {
            Ok(algorithm) => algorithm,
            Err(_) => unreachable!("credential hasher stored invalid algorithm tag {tag}"),
        }
    }
}

impl TryFrom<u8> for DigestAlgorithm {
    type Error = HashError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(tag))
            .copied()
            .ok_or_else(|| HashError::UnsupportedAlgorithm(format!("tag {tag}")))
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = HashError;

    /// Case-insensitive; the hyphen after `SHA` is optional and bare `SHA`
    /// means SHA-1.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().to_ascii_uppercase().replacen("SHA-", "SHA", 1);
        match normalized.as_str() {
            "SHA" | "SHA1" => Ok(DigestAlgorithm::Sha1),
            "SHA224" => Ok(DigestAlgorithm::Sha224),
            "SHA256" => Ok(DigestAlgorithm::Sha256),
            "SHA384" => Ok(DigestAlgorithm::Sha384),
            "SHA512" => Ok(DigestAlgorithm::Sha512),
            "SHA512/224" => Ok(DigestAlgorithm::Sha512_224),
            "SHA512/256" => Ok(DigestAlgorithm::Sha512_256),
            _ => Err(HashError::UnsupportedAlgorithm(name.to_string())),
        }
    }
}

/// Hash and salt persisted for one credential, both standard padded base64.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCredential {
    pub hash: String,
    pub salt: String,
}

/// Salted digest hasher. The algorithm may be switched at runtime; each call
/// reads it once, so a concurrent switch never mixes algorithms within one
/// hash.
pub struct CredentialHasher {
    algorithm: AtomicU8,
    source: Arc<dyn SecureTokenSource>,
}

impl CredentialHasher {
    /// Builds a hasher backed by the process-wide entropy source.
    pub fn new(algorithm: &str) -> Result<Self, HashError> {
        Self::with_source(algorithm, shared_source())
    }

    pub fn with_source(
        algorithm: &str,
        source: Arc<dyn SecureTokenSource>,
    ) -> Result<Self, HashError> {
        let algorithm = parse_algorithm(algorithm)?;
        Ok(Self {
            algorithm: AtomicU8::new(algorithm as u8),
            source,
        })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::from_tag(self.algorithm.load(Ordering::Acquire))
    }

    /// Switches the digest for all later calls. An unknown name leaves the
    /// current algorithm in place.
    pub fn set_algorithm(&self, name: &str) -> Result<(), HashError> {
        let algorithm = parse_algorithm(name)?;
        let previous = self.algorithm.swap(algorithm as u8, Ordering::AcqRel);
        debug!(
            from = %DigestAlgorithm::from_tag(previous),
            to = %algorithm,
            "credential hasher algorithm changed"
        );
        Ok(())
    }

    /// Draws a fresh salt and hashes `utf8(raw_password) || salt`. Call once per
    /// credential, when it is created or changed.
    pub fn hash_for_storage(&self, raw_password: &str) -> Result<StoredCredential, HashError> {
        let algorithm = self.algorithm();
        let mut salt = [0u8; SALT_LEN];
        self.source.fill_bytes(&mut salt)?;

        let hash = storage_digest(algorithm, raw_password, &salt);
        let stored = StoredCredential {
            hash: STANDARD.encode(hash),
            salt: STANDARD.encode(salt),
        };
        salt.zeroize();
        Ok(stored)
    }

    /// Hashes the string `raw_password + stored_salt` where `stored_salt` is the
    /// base64 text exactly as persisted. See the module docs: this does not
    /// reproduce a hash made by [`Self::hash_for_storage`].
    pub fn hash_for_comparison(&self, raw_password: &str, stored_salt: &str) -> String {
        let algorithm = self.algorithm();
        let mut input = String::with_capacity(raw_password.len() + stored_salt.len());
        input.push_str(raw_password);
        input.push_str(stored_salt);

        let hash = algorithm.digest(input.as_bytes());
        input.zeroize();
        STANDARD.encode(hash)
    }

    /// Recomputes the storage layout for `raw_password` against a stored record
    /// and compares the digests in constant time.
    pub fn verify_stored(
        &self,
        raw_password: &str,
        stored: &StoredCredential,
    ) -> Result<bool, HashError> {
        let algorithm = self.algorithm();
        let mut salt = STANDARD
            .decode(stored.salt.as_bytes())
            .map_err(|e| HashError::InvalidSalt(format!("{e}")))?;
        let expected = STANDARD
            .decode(stored.hash.as_bytes())
            .map_err(|e| HashError::InvalidHash(format!("{e}")))?;

        let actual = storage_digest(algorithm, raw_password, &salt);
        salt.zeroize();
        Ok(constant_time_eq(&actual, &expected))
    }
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

fn parse_algorithm(name: &str) -> Result<DigestAlgorithm, HashError> {
    name.parse().map_err(|err| {
        warn!(algorithm = name, "rejected unsupported digest algorithm");
        err
    })
}

fn storage_digest(algorithm: DigestAlgorithm, raw_password: &str, salt: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(raw_password.len() + salt.len());
    input.extend_from_slice(raw_password.as_bytes());
    input.extend_from_slice(salt);
    let hash = algorithm.digest(&input);
    input.zeroize();
    hash
}
