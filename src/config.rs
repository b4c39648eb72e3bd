use crate::water::DEFAULT_WATER_URL;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8083;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("WEER_API_KEY not set (pass --weer-api-key or set the environment variable)")]
    MissingApiKey,
    #[error("invalid water-level url '{0}'")]
    InvalidWaterUrl(String),
}

/// Settings for `zonnetijden serve`.
#[derive(Clone, Debug)]
pub struct Config {
    pub weer_api_key: String,
    pub host: String,
    pub port: u16,
    pub water_url: String,
}

impl Config {
    pub fn new(
        weer_api_key: Option<String>,
        host: String,
        port: u16,
        water_url: String,
    ) -> Result<Self, ConfigError> {
        let weer_api_key = weer_api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        if !(water_url.starts_with("http://") || water_url.starts_with("https://")) {
            return Err(ConfigError::InvalidWaterUrl(water_url));
        }
        Ok(Self { weer_api_key, host, port, water_url })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
