mod connection;
mod permission_ops;
mod role_ops;
mod store;
mod token_ops;
mod trusted_client_ops;
mod types;
mod user_ops;

pub use types::{DatabaseBackendType, SeaOrmStore};
