use crate::ledger::ReturnCreditPolicy;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct BackofficeConfig {
    pub common: core_config::Config,
    pub database: DatabaseConfig,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub return_credit_policy: ReturnCreditPolicy,
    /// Console origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: Option<Secret<String>>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    /// In-process store; state is lost on restart.
    Memory,
}

impl BackofficeConfig {
    pub fn load() -> Result<Self, AppError> {
        // Common config handles .env and the APP__ prefix
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: DatabaseBackend = get_env("DATABASE_BACKEND", Some("postgres"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        if is_prod && backend == DatabaseBackend::Memory {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_BACKEND=memory is not allowed in production"
            )));
        }
        let url = match backend {
            DatabaseBackend::Postgres => Some(Secret::new(get_env("DATABASE_URL", None, is_prod)?)),
            DatabaseBackend::Memory => None,
        };

        Ok(BackofficeConfig {
            common,
            database: DatabaseConfig {
                backend,
                url,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 1)?,
            },
            service_name: get_env("SERVICE_NAME", Some("backoffice-service"), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            return_credit_policy: get_env("RETURN_CREDIT_POLICY", Some("track_only"), false)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), false)?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    /// In-process configuration for tests and local runs.
    pub fn in_memory(port: u16) -> Self {
        BackofficeConfig {
            common: core_config::Config {
                port,
                environment: "test".to_string(),
            },
            database: DatabaseConfig {
                backend: DatabaseBackend::Memory,
                url: None,
                max_connections: 1,
                min_connections: 0,
            },
            service_name: "backoffice-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            return_credit_policy: ReturnCreditPolicy::default(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl std::str::FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
            "memory" => Ok(DatabaseBackend::Memory),
            _ => Err(format!("Invalid database backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env(key: &str, default: u32) -> Result<u32, AppError> {
    match env::var(key) {
        Ok(val) => val.parse().map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} must be a number, got {}", key, val))
        }),
        Err(_) => Ok(default),
    }
}
