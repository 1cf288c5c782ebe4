//! Opaque bearer tokens
//!
//! Tokens are 26-character base32 strings. Only their sha256 hash is stored;
//! access and refresh tokens are always issued as a pair.

mod issuer;
mod types;

pub use issuer::TokenIssuer;
pub use types::{IssuedToken, TokenPair, TokenRecord, TokenScope, TokenState};
