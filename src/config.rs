// config.rs
use crate::scraper::{AcquisitionConfig, LiveSiteConfig};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub schema_path: String,
    pub bind_addr: SocketAddr,
    pub max_workers: usize,
    pub live_scraper: bool,
    pub webdriver_url: String,
    pub browser_binary: Option<String>,
    pub headless: bool,
    pub early_stop_threshold: usize,
    pub page_cap: usize,
    pub scrape_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "real_estate.sqlite3".into(),
            schema_path: "sql/schema.sql".into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_workers: 8,
            live_scraper: true,
            webdriver_url: "http://localhost:9515".into(),
            browser_binary: None,
            headless: true,
            early_stop_threshold: 3,
            page_cap: 20,
            scrape_timeout: Duration::from_secs(180),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, defaulting every unset variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Self {
            database_path: lookup("DATABASE_PATH").unwrap_or(defaults.database_path),
            schema_path: lookup("SCHEMA_PATH").unwrap_or(defaults.schema_path),
            bind_addr: parsed(&lookup, "BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            max_workers: parsed(&lookup, "MAX_WORKERS")?.unwrap_or(defaults.max_workers),
            live_scraper: flag(&lookup, "LIVE_SCRAPER")?.unwrap_or(defaults.live_scraper),
            webdriver_url: lookup("WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
            browser_binary: lookup("BROWSER_BINARY").filter(|b| !b.trim().is_empty()),
            headless: flag(&lookup, "HEADLESS")?.unwrap_or(defaults.headless),
            early_stop_threshold: parsed(&lookup, "EARLY_STOP_THRESHOLD")?
                .unwrap_or(defaults.early_stop_threshold),
            page_cap: parsed(&lookup, "PAGE_CAP")?.unwrap_or(defaults.page_cap),
            scrape_timeout: parsed(&lookup, "SCRAPE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.scrape_timeout),
        })
    }

    pub fn acquisition(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            early_stop_threshold: self.early_stop_threshold,
        }
    }

    pub fn live_site(&self) -> LiveSiteConfig {
        LiveSiteConfig {
            page_cap: self.page_cap,
            ..LiveSiteConfig::default()
        }
    }
}

fn parsed<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
    }
}

fn flag<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid {
                var,
                value,
                reason: "expected true or false".into(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.database_path, "real_estate.sqlite3");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.early_stop_threshold, 3);
        assert_eq!(config.page_cap, 20);
        assert!(config.live_scraper);
        assert!(config.browser_binary.is_none());
        assert_eq!(config.scrape_timeout, Duration::from_secs(180));
    }

    #[test]
    fn overrides_are_read() {
        let config = from_pairs(&[
            ("LIVE_SCRAPER", "off"),
            ("EARLY_STOP_THRESHOLD", "5"),
            ("PAGE_CAP", "10"),
            ("BROWSER_BINARY", "/usr/bin/brave"),
            ("SCRAPE_TIMEOUT_SECS", "30"),
        ])
        .unwrap();

        assert!(!config.live_scraper);
        assert_eq!(config.acquisition().early_stop_threshold, 5);
        assert_eq!(config.live_site().page_cap, 10);
        assert_eq!(config.live_site().selector_threshold, 2);
        assert_eq!(config.browser_binary.as_deref(), Some("/usr/bin/brave"));
        assert_eq!(config.scrape_timeout, Duration::from_secs(30));
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = from_pairs(&[("MAX_WORKERS", "many")]).unwrap_err();
        assert!(err.to_string().starts_with("MAX_WORKERS has invalid value 'many'"));

        let err = from_pairs(&[("HEADLESS", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "HEADLESS", .. }));
    }
}
