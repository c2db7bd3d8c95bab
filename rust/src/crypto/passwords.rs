//! Self-describing credential hashing built around Argon2id.
//! The output is a PHC string carrying the salt and cost parameters, so a
//! single text column is enough to verify later logins. It replaces the older
//! delimited `hash:salt:iterations:algorithm` PBKDF2-SHA512 layout.

use argon2::password_hash::SaltString;
use argon2::{password_hash, Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 3;
const PARALLELISM: u32 = 1;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password to hash cannot be empty or blank")]
    EmptyPassword,
    #[error("hash set cannot be empty or blank")]
    EmptyHashSet,
    #[error("hash set is malformed: {0}")]
    MalformedHashSet(String),
    #[error("argon2 hashing failed: {0}")]
    HashingFailed(String),
}

fn argon2_config() -> Result<Argon2<'static>, password_hash::Error> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `raw_password` with a fresh salt and returns the PHC hash set.
/// Run the password through a policy check before calling this.
pub fn hash_credential(raw_password: &str) -> Result<String, CredentialError> {
    if raw_password.trim().is_empty() {
        return Err(CredentialError::EmptyPassword);
    }

    let secret = Zeroizing::new(raw_password.as_bytes().to_vec());
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = argon2_config().map_err(|e| CredentialError::HashingFailed(format!("{e}")))?;
    let hash_set = argon2
        .hash_password(&secret, &salt)
        .map_err(|e| CredentialError::HashingFailed(format!("{e}")))?
        .to_string();
    debug!("hashed credential with argon2id");
    Ok(hash_set)
}

/// Checks `raw_password` against a stored hash set. A wrong password is
/// `Ok(false)`; a hash set that cannot be parsed is an error.
pub fn verify_credential(raw_password: &str, hash_set: &str) -> Result<bool, CredentialError> {
    if raw_password.trim().is_empty() {
        return Err(CredentialError::EmptyPassword);
    }
    if hash_set.trim().is_empty() {
        return Err(CredentialError::EmptyHashSet);
    }

    let parsed = PasswordHash::new(hash_set)
        .map_err(|e| CredentialError::MalformedHashSet(format!("{e}")))?;
    let argon2 = argon2_config().map_err(|e| CredentialError::HashingFailed(format!("{e}")))?;
    let secret = Zeroizing::new(raw_password.as_bytes().to_vec());

    match argon2.verify_password(&secret, &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CredentialError::HashingFailed(format!("{e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::{hash_credential, verify_credential, CredentialError};

    #[test]
    fn hashes_and_verifies_credentials() {
        let hash_set = hash_credential("Samplepass1").expect("hashing should succeed");
        assert!(hash_set.starts_with("$argon2id$"));
        assert!(verify_credential("Samplepass1", &hash_set).unwrap());
        assert!(!verify_credential("invalid", &hash_set).unwrap());
    }

    #[test]
    fn hash_set_embeds_argon2_parameters() {
        let hash_set = hash_credential("Samplepass1").unwrap();
        let fields: Vec<&str> = hash_set.split('$').collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[1], "argon2id");
        assert_eq!(fields[2], "v=19");
        assert_eq!(fields[3], "m=19456,t=3,p=1");
        assert!(!hash_set.contains(':'));
    }

    #[test]
    fn salts_every_hash_set() {
        let a = hash_credential("Samplepass1").unwrap();
        let b = hash_credential("Samplepass1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_blank_passwords() {
        assert!(matches!(hash_credential(""), Err(CredentialError::EmptyPassword)));
        assert!(matches!(hash_credential("   "), Err(CredentialError::EmptyPassword)));
        assert!(matches!(
            verify_credential("", "$argon2id$v=19$m=19456,t=3,p=1$c2FsdA$aGFzaA"),
            Err(CredentialError::EmptyPassword)
        ));
    }

    #[test]
    fn rejects_empty_or_malformed_hash_sets() {
        assert!(matches!(
            verify_credential("dummy", ""),
            Err(CredentialError::EmptyHashSet)
        ));
        assert!(matches!(
            verify_credential("dummy", "not-a-phc-string"),
            Err(CredentialError::MalformedHashSet(_))
        ));
    }
}
