use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

/// Listener settings shared by every service. Read from an optional
/// `configuration` file and `APP__*` variables, e.g. `APP__PORT=8080`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_source(config)
    }

    fn from_source(config: Cfg) -> Result<Self, AppError> {
        let config: Self = config.try_deserialize()?;
        config.bind_addr()?;
        Ok(config)
    }

    /// The socket address to listen on. `host` must be an IP literal.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        let ip: IpAddr = self.host.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid APP__HOST '{}': {}", self.host, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_all_interfaces_port_5000() {
        let config = Config::from_source(Cfg::builder().build().unwrap()).unwrap();
        assert_eq!(config.bind_addr().unwrap(), "0.0.0.0:5000".parse().unwrap());
    }

    #[test]
    fn overrides_are_applied() {
        let source = Cfg::builder()
            .set_override("host", "127.0.0.1")
            .unwrap()
            .set_override("port", 8081)
            .unwrap()
            .build()
            .unwrap();

        let config = Config::from_source(source).unwrap();
        assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:8081".parse().unwrap());
    }

    #[test]
    fn hostname_is_rejected() {
        let source = Cfg::builder()
            .set_override("host", "localhost")
            .unwrap()
            .build()
            .unwrap();

        assert!(matches!(
            Config::from_source(source),
            Err(AppError::ConfigError(_))
        ));
    }
}
