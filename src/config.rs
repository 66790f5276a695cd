//! Configuration management for Arkvault

use serde::Deserialize;
use std::env;

use crate::pricing::PlanConfig;
use crate::session::types::DEFAULT_GRANT_TTL_SECS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub grants: GrantConfig,
    pub plan: PlanConfig,
    pub endowment: EndowmentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Minio,
    R2,
    S3,
    B2,
}

/// Upload-grant parameters
#[derive(Debug, Clone, Deserialize)]
pub struct GrantConfig {
    /// Signed-URL lifetime in seconds. Long enough for a realistic upload,
    /// short enough to bound exposure of a leaked URL.
    pub ttl_secs: u64,

    /// Object-key namespace all vault uploads live under
    pub namespace: String,
}

/// Endowment conversion parameters
#[derive(Debug, Clone, Deserialize)]
pub struct EndowmentConfig {
    /// Fixed USD-per-unit conversion rate used when locking endowments
    pub usd_per_unit: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                provider: StorageProvider::Minio,
                endpoint: "http://localhost:9000".to_string(),
                bucket: "vaults".to_string(),
                access_key: "admin".to_string(),
                secret_key: "password123".to_string(),
                region: Some("us-east-1".to_string()),
            },
            grants: GrantConfig {
                ttl_secs: DEFAULT_GRANT_TTL_SECS,
                namespace: "vaults".to_string(),
            },
            plan: PlanConfig::default(),
            endowment: EndowmentConfig {
                usd_per_unit: 2500.0,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            storage: StorageConfig {
                provider: match env::var("S3_PROVIDER")
                    .unwrap_or_else(|_| "minio".to_string())
                    .as_str()
                {
                    "r2" => StorageProvider::R2,
                    "s3" => StorageProvider::S3,
                    "b2" => StorageProvider::B2,
                    _ => StorageProvider::Minio,
                },
                endpoint: env::var("S3_ENDPOINT")?,
                bucket: env::var("S3_BUCKET")?,
                access_key: env::var("S3_ACCESS_KEY")?,
                secret_key: env::var("S3_SECRET_KEY")?,
                region: env::var("S3_REGION").ok(),
            },
            grants: GrantConfig {
                ttl_secs: parse_env("GRANT_TTL_SECS", defaults.grants.ttl_secs),
                namespace: env::var("VAULT_NAMESPACE")
                    .unwrap_or_else(|_| defaults.grants.namespace.clone()),
            },
            plan: PlanConfig {
                name: env::var("PLAN_NAME").unwrap_or_else(|_| defaults.plan.name.clone()),
                tokenization_fee_per_gb: parse_env(
                    "PLAN_TOKENIZATION_FEE_PER_GB",
                    defaults.plan.tokenization_fee_per_gb,
                ),
                storage_fee_per_gb_year: parse_env(
                    "PLAN_STORAGE_FEE_PER_GB_YEAR",
                    defaults.plan.storage_fee_per_gb_year,
                ),
                escrow_years: parse_env("PLAN_ESCROW_YEARS", defaults.plan.escrow_years),
            },
            endowment: EndowmentConfig {
                usd_per_unit: parse_env("ENDOWMENT_USD_PER_UNIT", defaults.endowment.usd_per_unit),
            },
        })
    }
}

/// Parse an env var, falling back to the default on absence or parse failure
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
