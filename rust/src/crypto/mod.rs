//! Cryptographic primitives for the credential lifecycle: the shared entropy
//! source, random security tokens, salted digest hashing, and Argon2id hash
//! sets. Each submodule owns a single concern.

pub mod digest;
pub mod entropy;
pub mod passwords;
pub mod tokens;
