use std::env;

use crate::error::ConsoleError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub default_page_size: u32,
    pub event_buffer_size: usize,
    pub dialog_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConsoleError> {
        let _ = dotenvy::dotenv();

        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000/api".to_string())
            .trim_end_matches('/')
            .to_string();
        if api_base_url.is_empty() {
            return Err(ConsoleError::Config("API_BASE_URL cannot be empty".to_string()));
        }

        let default_page_size = parse_or_default("DEFAULT_PAGE_SIZE", 50)?;
        if default_page_size == 0 {
            return Err(ConsoleError::Config("DEFAULT_PAGE_SIZE must be > 0".to_string()));
        }

        let dialog_ttl_secs = parse_or_default("DIALOG_TTL_SECS", 900)?;
        if dialog_ttl_secs == 0 {
            return Err(ConsoleError::Config("DIALOG_TTL_SECS must be > 0".to_string()));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_base_url,
            api_token: env::var("API_TOKEN").ok().filter(|token| !token.trim().is_empty()),
            default_page_size,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            dialog_ttl_secs,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, ConsoleError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| ConsoleError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
