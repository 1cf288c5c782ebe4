//! Trusted clients: registered machine callers with their own quotas

mod manager;
mod types;

pub use manager::TrustedClientManager;
pub use types::{
    CreateTrustedClientRequest, MAX_NAME_BYTES, NewTrustedClient, TrustedClient,
    TrustedClientLog, TrustedClientWithKey, UpdateTrustedClientRequest,
};
