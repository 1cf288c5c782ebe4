//! Secret generation and hashing
//!
//! Secrets are raw bytes from the OS random source, rendered with the
//! RFC 4648 base32 alphabet without padding. Only the sha256 digest of the
//! rendered plaintext is ever persisted.

use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Random bytes behind every bearer token
pub const TOKEN_BYTES: usize = 16;
/// Random bytes behind every trusted-client API key
pub const API_KEY_BYTES: usize = 32;
/// Encoded length of a bearer token plaintext
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

/// Generate `len` random bytes and encode them as unpadded base32
pub fn generate_secret(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    BASE32_NOPAD.encode(&bytes)
}

/// Hash a plaintext secret for storage and lookup
pub fn hash_secret(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cheap shape check run before any store lookup
pub fn is_well_formed_token(plaintext: &str) -> bool {
    plaintext.len() == TOKEN_PLAINTEXT_LEN
        && plaintext
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
}
