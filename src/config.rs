use crate::logging::{log, obj, v_str, Domain, Level};

/// Development-only signing key; a warning is logged when it is in use.
const DEV_TOKEN_SECRET: &str = "coastwatch-dev-secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub sqlite_path: String,
    pub token_secret: String,
    pub token_ttl_secs: i64,
    pub feed_capacity: usize,
    pub feed_simulate: bool,
    pub feed_interval_secs: u64,
    /// Load the built-in reports and posts into an empty database/feed.
    pub seed_sample: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key).as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        let token_secret = std::env::var("TOKEN_SECRET").unwrap_or_else(|_| {
            log(
                Level::Warn,
                Domain::System,
                "config",
                obj(&[("msg", v_str("TOKEN_SECRET not set, using development key"))]),
            );
            DEV_TOKEN_SECRET.to_string()
        });
        Self {
            port: env_or("PORT", 5000),
            sqlite_path: std::env::var("SQLITE_PATH").unwrap_or_else(|_| "./coastwatch.sqlite".to_string()),
            token_secret,
            token_ttl_secs: env_or("TOKEN_TTL_SECS", 60 * 60 * 12),
            feed_capacity: env_or("FEED_CAPACITY", 50),
            feed_simulate: env_flag("FEED_SIMULATE", false),
            feed_interval_secs: env_or("FEED_INTERVAL_SECS", 10),
            seed_sample: env_flag("SEED_SAMPLE", true),
        }
    }

    /// In-memory database, fixed secret, no simulation. Used by tests.
    pub fn ephemeral() -> Self {
        Self {
            port: 0,
            sqlite_path: ":memory:".to_string(),
            token_secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
            feed_capacity: 50,
            feed_simulate: false,
            feed_interval_secs: 10,
            seed_sample: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ephemeral_defaults() {
        let cfg = Config::ephemeral();
        assert_eq!(cfg.sqlite_path, ":memory:");
        assert_eq!(cfg.feed_capacity, 50);
        assert!(!cfg.feed_simulate);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("COASTWATCH_TEST_PORT", "not-a-port");
        assert_eq!(env_or::<u16>("COASTWATCH_TEST_PORT", 42), 42);
        std::env::set_var("COASTWATCH_TEST_PORT", "8080");
        assert_eq!(env_or::<u16>("COASTWATCH_TEST_PORT", 42), 8080);
    }
}
