use serde::Deserialize;
use std::env;

use crate::error::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl ServiceConfig {
    /// Load configuration from the environment, reading `.env` first.
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenvy::dotenv().ok();

        Ok(ServiceConfig {
            service_name: get_env("SERVICE_NAME", Some("restaurant-service"))?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: get_env("LOG_LEVEL", Some("info"))?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"))?
                    .parse()
                    .map_err(|e| {
                        ServiceError::Config(anyhow::anyhow!(
                            "DATABASE_MAX_CONNECTIONS must be an integer: {e}"
                        ))
                    })?,
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"))?
                    .parse()
                    .map_err(|e| {
                        ServiceError::Config(anyhow::anyhow!(
                            "DATABASE_MIN_CONNECTIONS must be an integer: {e}"
                        ))
                    })?,
            },
        })
    }
}

/// Read an env var, falling back to `default` when one is provided.
fn get_env(key: &str, default: Option<&str>) -> Result<String, ServiceError> {
    match env::var(key) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => match default {
            Some(d) => Ok(d.to_string()),
            None => Err(ServiceError::Config(anyhow::anyhow!(
                "missing required environment variable {key}"
            ))),
        },
    }
}
