use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub openweather_lang: String,
    pub openweather_units: String,
    pub current_cache_ttl: Duration,
    pub forecast_cache_ttl: Duration,
    pub http_timeout: Duration,
    pub bind_addr: String,
}

impl Config {
    /// Defaults for everything except the API key.
    pub fn new(openweather_api_key: impl Into<String>) -> Self {
        Config {
            openweather_api_key: openweather_api_key.into(),
            openweather_base_url: "https://api.openweathermap.org".to_string(),
            openweather_lang: "ru".to_string(),
            openweather_units: "metric".to_string(),
            current_cache_ttl: Duration::from_secs(5 * 60),
            forecast_cache_ttl: Duration::from_secs(60 * 60),
            http_timeout: Duration::from_secs(30),
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::new(
            env::var("OPENWEATHER_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENWEATHER_API_KEY not set"))?,
        );

        Ok(Config {
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or(defaults.openweather_base_url),
            openweather_lang: env::var("OPENWEATHER_LANG").unwrap_or(defaults.openweather_lang),
            openweather_units: env::var("OPENWEATHER_UNITS")
                .unwrap_or(defaults.openweather_units),
            current_cache_ttl: secs_from_env("CURRENT_CACHE_TTL_SECS", defaults.current_cache_ttl)?,
            forecast_cache_ttl: secs_from_env(
                "FORECAST_CACHE_TTL_SECS",
                defaults.forecast_cache_ttl,
            )?,
            http_timeout: secs_from_env("HTTP_TIMEOUT_SECS", defaults.http_timeout)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            openweather_api_key: defaults.openweather_api_key,
        })
    }
}

fn secs_from_env(name: &str, default: Duration) -> anyhow::Result<Duration> {
    match env::var(name) {
        Ok(raw) => parse_secs(&raw).ok_or_else(|| {
            anyhow::anyhow!("{} must be a whole number of seconds, got {:?}", name, raw)
        }),
        Err(_) => Ok(default),
    }
}

fn parse_secs(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}
