use sha2::{Digest, Sha256};

/// Turns plaintext passwords into the digests kept in the accounts table.
///
/// The ledger only ever compares digests, so swapping in a stronger algorithm
/// means implementing this trait and migrating the stored hashes.
pub trait PasswordHasher {
    fn hash(&self, password: &str) -> String;

    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        self.hash(password) == stored_hash
    }
}

/// Lowercase hex SHA-256 of the UTF-8 password.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl PasswordHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}
