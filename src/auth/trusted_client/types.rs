//! Trusted client types

use crate::core::rate_limiter::BucketParams;
use crate::utils::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest accepted client name, in bytes
pub const MAX_NAME_BYTES: usize = 500;

/// Registered machine caller with its own admission quota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustedClient {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Hex sha256 of the API key, never serialized
    #[serde(skip)]
    pub api_key_hash: String,
    pub rate_limit_rps: f64,
    pub rate_limit_burst: u32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

impl TrustedClient {
    pub fn bucket_params(&self) -> BucketParams {
        BucketParams::new(self.rate_limit_rps, self.rate_limit_burst)
    }
}

/// Fields needed to insert a trusted client
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrustedClient {
    pub name: String,
    pub description: String,
    pub api_key_hash: String,
    pub rate_limit_rps: f64,
    pub rate_limit_burst: u32,
    pub enabled: bool,
}

/// Administrator request to register a client
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrustedClientRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rate_limit_rps: f64,
    pub rate_limit_burst: u32,
    #[serde(default = "crate::config::models::default_true")]
    pub enabled: bool,
}

impl CreateTrustedClientRequest {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_quota(self.rate_limit_rps, self.rate_limit_burst)
    }
}

/// Partial update; unset fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTrustedClientRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rate_limit_rps: Option<f64>,
    pub rate_limit_burst: Option<u32>,
    pub enabled: Option<bool>,
    /// Version the caller last read
    pub version: Option<i32>,
}

/// Returned once at creation or key regeneration
#[derive(Debug, Clone, Serialize)]
pub struct TrustedClientWithKey {
    pub client: TrustedClient,
    pub api_key: String,
}

/// One audited request made by a trusted client
#[derive(Debug, Clone, PartialEq)]
pub struct TrustedClientLog {
    pub client_id: i64,
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GatewayError::validation("name must be provided"));
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(GatewayError::validation(format!(
            "name must not be more than {} bytes long",
            MAX_NAME_BYTES
        )));
    }
    Ok(())
}

/// Rate and burst must be positive, and burst must cover at least one
/// second of steady-state traffic
pub(crate) fn validate_quota(rps: f64, burst: u32) -> Result<()> {
    if !(rps > 0.0) || !rps.is_finite() {
        return Err(GatewayError::validation("rate_limit_rps must be greater than zero"));
    }
    if burst == 0 {
        return Err(GatewayError::validation("rate_limit_burst must be greater than zero"));
    }
    if (burst as f64) < rps {
        return Err(GatewayError::configuration_violation(
            "rate_limit_burst must be greater than or equal to rate_limit_rps",
        ));
    }
    Ok(())
}
