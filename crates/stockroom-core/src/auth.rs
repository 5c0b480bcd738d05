//! # PIN Credentials
//!
//! Operators log in with a short numeric PIN. The store keeps only a one-way
//! digest: SHA-256 of the raw PIN bytes, lowercase hex (64 characters).
//!
//! ## Assurance Level
//! The PIN space is small on purpose (counter convenience), so a stolen
//! digest is easy to brute-force. The digest format is part of the on-disk
//! contract: changing it would lock out every existing user, including the
//! bootstrap admin.
//!
//! ## Bootstrap Credential
//! When the `users` table is empty the store creates one admin with the
//! well-known PIN [`BOOTSTRAP_PIN`]. Operators must rotate it after first
//! login.

use sha2::{Digest, Sha256};

/// Name of the admin created on an empty database.
pub const BOOTSTRAP_ADMIN_NAME: &str = "Admin";

/// PIN of the bootstrap admin. Publicly documented.
pub const BOOTSTRAP_PIN: &str = "1234";

/// `hash_pin(BOOTSTRAP_PIN)`, as written by earlier versions of the store.
pub const BOOTSTRAP_PIN_HASH: &str =
    "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4";

/// Hashes a raw PIN into its stored form.
///
/// ## Example
/// ```rust
/// use stockroom_core::auth::{hash_pin, BOOTSTRAP_PIN_HASH};
///
/// assert_eq!(hash_pin("1234"), BOOTSTRAP_PIN_HASH);
/// ```
pub fn hash_pin(raw_pin: &str) -> String {
    hex::encode(Sha256::digest(raw_pin.as_bytes()))
}
