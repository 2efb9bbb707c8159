//! App state: the cache engine and server config.

use std::fmt::Display;
use std::str::FromStr;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value;

use ttlkv_cache::{CacheConfig, ExpiringCache};
use ttlkv_core::constants::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_ENTRIES, DEFAULT_SWEEP_INTERVAL};
use ttlkv_core::error::{Result, TtlkvError};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Capacity bound of the cache (0 = unbounded)
    pub max_entries: usize,
    /// Time between background sweeps
    pub sweep_interval: Duration,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ApiConfig {
    /// Reads the configuration from the environment, loading `.env` first.
    ///
    /// Unset variables fall back to defaults; set but unparseable ones are errors.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let sweep_ms = env_or(
            "TTLKV_SWEEP_INTERVAL_MS",
            defaults.sweep_interval.as_millis() as u64,
        )?;

        Ok(Self {
            max_entries: env_or("TTLKV_MAX_ENTRIES", defaults.max_entries)?,
            sweep_interval: Duration::from_millis(sweep_ms),
            max_body_bytes: env_or("TTLKV_MAX_BODY_BYTES", defaults.max_body_bytes)?,
        })
    }

    /// Engine configuration derived from this server configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_max_entries(self.max_entries)
            .with_sweep_interval(self.sweep_interval)
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| TtlkvError::ConfigError(format!("{name}={raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Shared state handed to every request handler.
pub struct AppState {
    /// Server configuration
    pub config: ApiConfig,
    /// The cache engine; values are arbitrary JSON
    pub cache: ExpiringCache<Value>,
    /// Wall-clock start time
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl AppState {
    /// Builds the state and starts the cache's background sweeper.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let cache = ExpiringCache::with_config(config.cache_config())?;

        Ok(Self {
            config,
            cache,
            started_at: Utc::now(),
            started: Instant::now(),
        })
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default_when_unset() {
        let value: usize = env_or("TTLKV_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_env_or_parses_value() {
        std::env::set_var("TTLKV_TEST_PARSE_VARIABLE", " 17 ");
        let value: usize = env_or("TTLKV_TEST_PARSE_VARIABLE", 42).unwrap();
        assert_eq!(value, 17);
    }

    #[test]
    fn test_env_or_rejects_garbage() {
        std::env::set_var("TTLKV_TEST_GARBAGE_VARIABLE", "lots");
        let result: Result<usize> = env_or("TTLKV_TEST_GARBAGE_VARIABLE", 42);
        assert!(matches!(result, Err(TtlkvError::ConfigError(_))));
    }

    #[test]
    fn test_cache_config_mirrors_api_config() {
        let config = ApiConfig {
            max_entries: 5,
            sweep_interval: Duration::from_millis(250),
            ..ApiConfig::default()
        };
        let cache_config = config.cache_config();
        assert_eq!(cache_config.max_entries, 5);
        assert_eq!(cache_config.sweep_interval, Duration::from_millis(250));
        assert!(cache_config.background_sweep);
    }

    #[tokio::test]
    async fn test_state_starts_sweeper() {
        let state = AppState::new(ApiConfig::default()).unwrap();
        assert!(state.cache.is_sweeping());
        assert!(state.cache.is_empty());
        state.cache.shutdown().await;
    }
}
