use std::{env, fmt::Display, str::FromStr};

pub struct Config {
    pub bind_port: u16,
    pub database_url: String,
    /// Hard cap for the `limit` query parameter on paginated listings.
    pub page_size_limit: i64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            bind_port: try_load("BIND_PORT", "8080"),
            database_url: require("DATABASE_URL"),
            page_size_limit: try_load("PAGE_SIZE_LIMIT", "100"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            log::warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn require(key: &str) -> String {
    env::var(key)
        .map_err(|_| {
            log::warn!("Required environment variable {key} not found");
        })
        .expect("Environment misconfigured!")
}
