//! Cryptographic primitives for token and key handling

pub mod keys;
pub mod password;
