//! HTTP server implementation
//!
//! This module provides the actix-web application, the admission middleware
//! and the administrative routes.

pub mod builder;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use server::HttpServer;
pub use state::AppState;
