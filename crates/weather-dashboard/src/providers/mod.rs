use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::config::RuntimeConfig;
use crate::model::{CurrentWeather, ForecastBundle};

pub mod tomorrow_io;

/// Source of current conditions and forecast timelines for a free-text location.
pub trait WeatherApi: Send + Sync {
    /// `Ok(None)` means the provider answered with an unusable shape.
    fn fetch_current(&self, city: &str) -> Result<Option<CurrentWeather>, ProviderError>;
    fn fetch_forecast(&self, city: &str) -> Result<ForecastBundle, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct HttpWeatherApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpWeatherApi {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ProviderError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, ProviderError> {
        let api_key = config.require_api_key()?;
        Self::new(
            config.api_base_url.clone(),
            api_key,
            Duration::from_secs(config.http_timeout_secs),
        )
    }
}

impl WeatherApi for HttpWeatherApi {
    fn fetch_current(&self, city: &str) -> Result<Option<CurrentWeather>, ProviderError> {
        tomorrow_io::fetch_current(&self.client, &self.base_url, &self.api_key, city)
            .map_err(|error| error.with_provider(tomorrow_io::PROVIDER_NAME))
    }

    fn fetch_forecast(&self, city: &str) -> Result<ForecastBundle, ProviderError> {
        tomorrow_io::fetch_forecast(&self.client, &self.base_url, &self.api_key, city)
            .map_err(|error| error.with_provider(tomorrow_io::PROVIDER_NAME))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    #[error("missing weather API key: set TOMORROW_IO_API_KEY")]
    MissingApiKey,
}

impl ProviderError {
    pub fn with_provider(self, provider: &'static str) -> Self {
        match self {
            ProviderError::Transport(message) => {
                ProviderError::Transport(format!("{provider}: {message}"))
            }
            ProviderError::Http { status, message } => ProviderError::Http {
                status,
                message: format!("{provider}: {message}"),
            },
            ProviderError::InvalidResponse(message) => {
                ProviderError::InvalidResponse(format!("{provider}: {message}"))
            }
            ProviderError::MissingApiKey => ProviderError::MissingApiKey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_prefixes_provider_name() {
        let error = ProviderError::Http {
            status: 429,
            message: "rate limit".to_string(),
        }
        .with_provider("tomorrow_io");

        assert_eq!(
            error,
            ProviderError::Http {
                status: 429,
                message: "tomorrow_io: rate limit".to_string()
            }
        );
    }

    #[test]
    fn provider_missing_key_is_not_prefixed() {
        assert_eq!(
            ProviderError::MissingApiKey.with_provider("tomorrow_io"),
            ProviderError::MissingApiKey
        );
    }

    #[test]
    fn provider_from_config_requires_api_key() {
        let config = RuntimeConfig::from_pairs(Vec::<(String, String)>::new());
        let error = HttpWeatherApi::from_config(&config).expect_err("must fail");
        assert_eq!(error, ProviderError::MissingApiKey);
    }
}
