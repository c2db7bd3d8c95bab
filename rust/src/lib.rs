//! Security primitives for an application's credential lifecycle: salted
//! password hashing, password policy checks, anti-forgery tokens, and
//! one-time codes. Storage, transport, and session handling stay with the
//! caller.

pub mod config;
pub mod crypto;
pub mod policy;
pub mod sanitize;
