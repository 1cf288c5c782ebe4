//! # greenlight
//!
//! Request admission and authorization core for an HTTP API.
//!
//! ## Features
//!
//! - **Paired bearer tokens**: opaque 26-character access and refresh tokens,
//!   stored only as sha256 hashes, with single-use refresh rotation
//! - **Hierarchical RBAC**: roles inherit from a single parent, permission
//!   sets are cached per user, and resource-scoped grants cover one object
//! - **Admission control**: per-key token buckets keyed by caller address or
//!   trusted-client id, with idle eviction
//! - **Authorization gate**: authenticate, admit, then check the requirement,
//!   yielding one allow-or-deny decision per request
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use greenlight::auth::{AuthSystem, PermissionRequirement, RequestCredentials};
//! use greenlight::storage::MemoryStore;
//! use greenlight::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> greenlight::Result<()> {
//!     let config = Config::default();
//!     let auth = AuthSystem::new(&config.auth, &config.rate_limit, Arc::new(MemoryStore::new()));
//!
//!     let credentials = RequestCredentials::anonymous("203.0.113.9");
//!     let decision = auth
//!         .gate()
//!         .authorize(&credentials, Some(&PermissionRequirement::global("movies:read")))
//!         .await?;
//!     println!("allowed: {}", decision.is_allowed());
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use auth::{AuthSystem, AuthorizationGate, Decision, DenyReason};
pub use config::Config;
pub use utils::error::{GatewayError, Result};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
