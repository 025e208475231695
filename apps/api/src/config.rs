//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                                  | Default          |
//! |-------------------------------------------|------------------|
//! | `CULTURAFT_BIND_ADDR`                     | `0.0.0.0`        |
//! | `PORT`                                    | `5000`           |
//! | `CULTURAFT_DB_PATH`                       | `./culturaft.db` |
//! | `CULTURAFT_DB_MAX_CONNECTIONS`            | `5`              |
//! | `CULTURAFT_FREE_SHIPPING_THRESHOLD_CENTS` | `15000`          |
//! | `CULTURAFT_FLAT_SHIPPING_CENTS`           | `1200`           |
//! | `CULTURAFT_CORS_ORIGINS`                  | any origin       |
//! | `CULTURAFT_EXPOSE_ERRORS`                 | `false`          |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use culturaft_core::{Money, ShippingPolicy};
use culturaft_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: IpAddr,

    pub port: u16,

    /// SQLite database file
    pub db_path: String,

    pub db_max_connections: u32,

    /// Orders with a subtotal strictly above this ship free
    pub free_shipping_threshold_cents: i64,

    /// Charged when the caller quotes no shipping and the threshold isn't met
    pub flat_shipping_cents: i64,

    /// Allowed CORS origins; empty means any
    pub cors_origins: Vec<String>,

    /// Return database error text to clients (development only)
    pub expose_errors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
            db_path: "./culturaft.db".to_string(),
            db_max_connections: 5,
            free_shipping_threshold_cents: ShippingPolicy::DEFAULT_FREE_THRESHOLD_CENTS,
            flat_shipping_cents: ShippingPolicy::DEFAULT_FLAT_FEE_CENTS,
            cors_origins: Vec::new(),
            expose_errors: false,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            bind_addr: parse_or(&lookup, "CULTURAFT_BIND_ADDR", defaults.bind_addr)?,
            port: parse_or(&lookup, "PORT", defaults.port)?,
            db_path: lookup("CULTURAFT_DB_PATH")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.db_path),
            db_max_connections: parse_or(
                &lookup,
                "CULTURAFT_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            free_shipping_threshold_cents: parse_or(
                &lookup,
                "CULTURAFT_FREE_SHIPPING_THRESHOLD_CENTS",
                defaults.free_shipping_threshold_cents,
            )?,
            flat_shipping_cents: parse_or(
                &lookup,
                "CULTURAFT_FLAT_SHIPPING_CENTS",
                defaults.flat_shipping_cents,
            )?,
            cors_origins: lookup("CULTURAFT_CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            expose_errors: parse_or(&lookup, "CULTURAFT_EXPOSE_ERRORS", defaults.expose_errors)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "CULTURAFT_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.free_shipping_threshold_cents < 0 {
            return Err(ConfigError::InvalidValue(
                "CULTURAFT_FREE_SHIPPING_THRESHOLD_CENTS".to_string(),
            ));
        }
        if config.flat_shipping_cents < 0 {
            return Err(ConfigError::InvalidValue(
                "CULTURAFT_FLAT_SHIPPING_CENTS".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy::new(
            Money::from_cents(self.free_shipping_threshold_cents),
            Money::from_cents(self.flat_shipping_cents),
        )
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path).max_connections(self.db_max_connections)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        _ => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.db_path, "./culturaft.db");
        assert_eq!(config.shipping_policy(), ShippingPolicy::default());
        assert!(!config.expose_errors);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("CULTURAFT_BIND_ADDR", "127.0.0.1"),
            ("CULTURAFT_FLAT_SHIPPING_CENTS", "900"),
            ("CULTURAFT_CORS_ORIGINS", "https://shop.example, https://admin.example,"),
            ("CULTURAFT_EXPOSE_ERRORS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.flat_shipping_cents, 900);
        assert_eq!(
            config.cors_origins,
            vec!["https://shop.example", "https://admin.example"]
        );
        assert!(config.expose_errors);
    }

    #[test]
    fn test_invalid_values() {
        let err = ApiConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for PORT");

        assert!(ApiConfig::from_lookup(lookup(&[("CULTURAFT_DB_MAX_CONNECTIONS", "0")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("CULTURAFT_FLAT_SHIPPING_CENTS", "-1")])).is_err());
    }
}
