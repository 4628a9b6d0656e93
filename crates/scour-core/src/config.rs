use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_PROXY_LIST_URL: &str =
    "https://api.proxyscrape.com/v2/?request=displayproxies&protocol=http";

/// Pipeline settings, sourced from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub rate_limit_delay: Duration,
    pub flaresolverr_url: String,
    pub cache_expiration: Duration,
    /// `None` disables proxy rotation.
    pub proxy_list_url: Option<String>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            rate_limit_delay: Duration::from_millis(2500),
            flaresolverr_url: "http://localhost:8191/v1".into(),
            cache_expiration: Duration::from_secs(3600),
            proxy_list_url: Some(DEFAULT_PROXY_LIST_URL.into()),
            log_level: "info".into(),
        }
    }
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// - `REQUEST_TIMEOUT` seconds (default 30)
    /// - `MAX_RETRIES` (default 3)
    /// - `RATE_LIMIT_DELAY` seconds, fractional allowed (default 2.5)
    /// - `FLARESOLVERR_URL` (default `http://localhost:8191/v1`)
    /// - `CACHE_EXPIRATION` seconds (default 3600)
    /// - `PROXY_LIST_URL` (default proxyscrape; empty disables proxies)
    /// - `LOG_LEVEL` (default `info`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let request_timeout = match lookup("REQUEST_TIMEOUT") {
            None => defaults.request_timeout,
            Some(raw) => {
                let secs: u64 = parse_var("REQUEST_TIMEOUT", &raw)?;
                if secs == 0 {
                    return Err(AppError::ConfigError(
                        "REQUEST_TIMEOUT must be at least 1".into(),
                    ));
                }
                Duration::from_secs(secs)
            }
        };

        let max_retries = match lookup("MAX_RETRIES") {
            None => defaults.max_retries,
            Some(raw) => parse_var("MAX_RETRIES", &raw)?,
        };

        let rate_limit_delay = match lookup("RATE_LIMIT_DELAY") {
            None => defaults.rate_limit_delay,
            Some(raw) => {
                let secs: f64 = parse_var("RATE_LIMIT_DELAY", &raw)?;
                Duration::try_from_secs_f64(secs).map_err(|_| {
                    AppError::ConfigError(format!(
                        "Invalid RATE_LIMIT_DELAY '{raw}': must be a non-negative number"
                    ))
                })?
            }
        };

        let cache_expiration = match lookup("CACHE_EXPIRATION") {
            None => defaults.cache_expiration,
            Some(raw) => Duration::from_secs(parse_var("CACHE_EXPIRATION", &raw)?),
        };

        let proxy_list_url = match lookup("PROXY_LIST_URL") {
            None => defaults.proxy_list_url,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(raw.trim().to_string()),
        };

        Ok(Self {
            request_timeout,
            max_retries,
            rate_limit_delay,
            flaresolverr_url: lookup("FLARESOLVERR_URL").unwrap_or(defaults.flaresolverr_url),
            cache_expiration,
            proxy_list_url,
            log_level: lookup("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or(defaults.log_level),
        })
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, AppError> {
    raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!("Invalid {name} '{raw}': expected a number"))
    })
}
