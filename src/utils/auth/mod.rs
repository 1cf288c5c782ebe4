//! Authentication and security utilities

pub mod crypto;

pub use crypto::keys::{generate_secret, hash_secret, is_well_formed_token};
pub use crypto::password::{hash_password, verify_password};
