use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://ptreddy-95.github.io";

#[derive(Debug, Clone, Deserialize)]
pub struct ProductConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub cors: CorsConfig,
    pub seed_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    /// Absent in dev when `MONGO_URI` is unset; the connector reports this as a
    /// connection failure.
    pub uri: Option<Secret<String>>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub enum CorsPolicy {
    Any,
    AllowList(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub policy: CorsPolicy,
}

impl ProductConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let environment: Environment = get_env("ENVIRONMENT", Some("dev"), false)?.parse()?;
        let is_prod = environment == Environment::Prod;

        let config = ProductConfig {
            common: common_config,
            environment,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            mongodb: MongoConfig {
                uri: if is_prod {
                    Some(Secret::new(get_env("MONGO_URI", None, true)?))
                } else {
                    env::var("MONGO_URI").ok().map(Secret::new)
                },
                database: env::var("MONGO_DATABASE").ok().filter(|s| !s.is_empty()),
            },
            cors: CorsConfig {
                policy: CorsPolicy::parse(&get_env(
                    "ALLOWED_ORIGINS",
                    Some(DEFAULT_ALLOWED_ORIGIN),
                    false,
                )?),
            },
            seed_on_startup: get_env("SEED_ON_STARTUP", Some("true"), false)?
                .parse()
                .map_err(|e: std::str::ParseBoolError| {
                    AppError::ConfigError(anyhow::anyhow!("SEED_ON_STARTUP: {}", e))
                })?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.environment == Environment::Prod && self.cors.policy == CorsPolicy::Any {
            tracing::warn!("Wildcard CORS origin configured in production");
        }

        if let CorsPolicy::AllowList(origins) = &self.cors.policy {
            if origins.is_empty() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "ALLOWED_ORIGINS must name at least one origin or '*'"
                )));
            }
        }

        Ok(())
    }
}

impl CorsPolicy {
    /// A single `*` entry selects the wildcard policy; anything else is an
    /// allow-list.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if origins.iter().any(|o| o == "*") {
            CorsPolicy::Any
        } else {
            CorsPolicy::AllowList(origins)
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid environment: {}",
                s
            ))),
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
