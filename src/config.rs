use dotenvy::dotenv;
use eyre::{Result, WrapErr, eyre};
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;

const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_CACHE_MAX_SIZE: usize = 100_000;
const DEFAULT_RESPONSE_LIMIT: i64 = 25;
const DEFAULT_RESPONSE_LIMIT_MAX: i64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub token_cache_max_size: NonZeroUsize,
    pub response_limit_default: i64,
    pub response_limit_max: i64,
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid value for {}: '{}'", key, value)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").wrap_err("Missing DATABASE_URL")?;

        let token_cache_max_size = env_or("TOKEN_CACHE_MAX_SIZE", DEFAULT_TOKEN_CACHE_MAX_SIZE)?;
        let token_cache_max_size = NonZeroUsize::new(token_cache_max_size)
            .ok_or_else(|| eyre!("TOKEN_CACHE_MAX_SIZE must be greater than zero"))?;

        let response_limit_default = env_or("RESPONSE_LIMIT_DEFAULT", DEFAULT_RESPONSE_LIMIT)?;
        let response_limit_max = env_or("RESPONSE_LIMIT_MAX", DEFAULT_RESPONSE_LIMIT_MAX)?;
        if response_limit_default <= 0 || response_limit_max < response_limit_default {
            return Err(eyre!(
                "Response limits must satisfy 0 < RESPONSE_LIMIT_DEFAULT ({}) <= RESPONSE_LIMIT_MAX ({})",
                response_limit_default,
                response_limit_max
            ));
        }

        Ok(Config {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
            database_acquire_timeout_secs: env_or(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS,
            )?,
            token_cache_max_size,
            response_limit_default,
            response_limit_max,
        })
    }

    /// Resolve a caller supplied page size against the configured bounds.
    pub fn effective_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.response_limit_default)
            .min(self.response_limit_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            database_url: "postgres://localhost/mirror_node".to_string(),
            database_max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            database_acquire_timeout_secs: DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS,
            token_cache_max_size: NonZeroUsize::new(DEFAULT_TOKEN_CACHE_MAX_SIZE).unwrap(),
            response_limit_default: 25,
            response_limit_max: 100,
        }
    }

    #[test]
    fn effective_limit_defaults_and_clamps() {
        let cfg = config();
        assert_eq!(cfg.effective_limit(None), 25);
        assert_eq!(cfg.effective_limit(Some(10)), 10);
        assert_eq!(cfg.effective_limit(Some(1000)), 100);
        // Non-positive values pass through so the query builder can reject them.
        assert_eq!(cfg.effective_limit(Some(0)), 0);
    }

    #[test]
    fn acquire_timeout_falls_back_to_default() {
        let unset = "TOKEN_RELATIONSHIPS_TEST_UNSET_ACQUIRE_TIMEOUT";
        assert_eq!(env_or(unset, DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS).unwrap(), 30);

        let key = "TOKEN_RELATIONSHIPS_TEST_ACQUIRE_TIMEOUT";
        // SAFETY: the key is unique to this test.
        unsafe { env::set_var(key, " 45 ") };
        assert_eq!(env_or(key, DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS).unwrap(), 45);

        unsafe { env::set_var(key, "soon") };
        assert!(env_or(key, DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS).is_err());
    }
}
