use std::collections::HashMap;
use std::path::PathBuf;

use crate::providers::ProviderError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.tomorrow.io/v4/weather";
pub const DEFAULT_CITY: &str = "Hyderabad";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

pub const API_KEY_ENV: &str = "TOMORROW_IO_API_KEY";
pub const API_KEY_ALIAS_ENV: &str = "WEATHER_API_KEY";
pub const API_BASE_URL_ENV: &str = "WEATHER_API_BASE_URL";
pub const FAVORITES_URL_ENV: &str = "FAVORITES_STORE_URL";
pub const DEFAULT_CITY_ENV: &str = "WEATHER_DEFAULT_CITY";
pub const REPORT_DIR_ENV: &str = "WEATHER_REPORT_DIR";
pub const HTTP_TIMEOUT_SECS_ENV: &str = "WEATHER_HTTP_TIMEOUT_SECS";
const HOME_ENV: &str = "HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub favorites_url: Option<String>,
    pub default_city: String,
    pub report_dir: PathBuf,
    pub http_timeout_secs: u64,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            api_key: non_empty(&map, API_KEY_ENV).or_else(|| non_empty(&map, API_KEY_ALIAS_ENV)),
            api_base_url: non_empty(&map, API_BASE_URL_ENV)
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            favorites_url: non_empty(&map, FAVORITES_URL_ENV).map(|value| normalize_store_url(&value)),
            default_city: non_empty(&map, DEFAULT_CITY_ENV)
                .unwrap_or_else(|| DEFAULT_CITY.to_string()),
            report_dir: resolve_report_dir(&map),
            http_timeout_secs: resolve_timeout_secs(&map),
        }
    }

    pub fn require_api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)
    }
}

fn non_empty(env_map: &HashMap<String, String>, key: &str) -> Option<String> {
    env_map
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn normalize_store_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    trimmed
        .strip_suffix(".json")
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}

fn resolve_report_dir(env_map: &HashMap<String, String>) -> PathBuf {
    let home = env_map.get(HOME_ENV).map(String::as_str);
    non_empty(env_map, REPORT_DIR_ENV)
        .map(|value| expand_home_path(&value, home))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn expand_home_path(raw: &str, home: Option<&str>) -> String {
    let trimmed = raw.trim();
    let Some(home) = home.map(str::trim).filter(|value| !value.is_empty()) else {
        return trimmed.to_string();
    };

    let home = home.trim_end_matches('/');
    let mut expanded = trimmed.replace("$HOME", home);

    if expanded == "~" {
        expanded = home.to_string();
    } else if let Some(rest) = expanded.strip_prefix("~/") {
        expanded = format!("{home}/{rest}");
    }

    expanded
}

fn resolve_timeout_secs(env_map: &HashMap<String, String>) -> u64 {
    non_empty(env_map, HTTP_TIMEOUT_SECS_ENV)
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_without_environment() {
        let config = RuntimeConfig::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(config.api_key, None);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.favorites_url, None);
        assert_eq!(config.default_city, "Hyderabad");
        assert_eq!(config.report_dir, PathBuf::from("."));
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
    }

    #[test]
    fn config_prefers_primary_api_key_over_alias() {
        let config = RuntimeConfig::from_pairs(vec![
            (API_KEY_ALIAS_ENV, "alias-key"),
            (API_KEY_ENV, "primary-key"),
        ]);
        assert_eq!(config.api_key.as_deref(), Some("primary-key"));
    }

    #[test]
    fn config_uses_alias_when_primary_blank() {
        let config =
            RuntimeConfig::from_pairs(vec![(API_KEY_ENV, "  "), (API_KEY_ALIAS_ENV, "alias-key")]);
        assert_eq!(config.api_key.as_deref(), Some("alias-key"));
    }

    #[test]
    fn config_missing_api_key_is_reported() {
        let config = RuntimeConfig::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(config.require_api_key(), Err(ProviderError::MissingApiKey));
    }

    #[test]
    fn config_strips_json_suffix_from_favorites_url() {
        let config = RuntimeConfig::from_pairs(vec![(
            FAVORITES_URL_ENV,
            "https://example.firebaseio.com/cities.json",
        )]);
        assert_eq!(
            config.favorites_url.as_deref(),
            Some("https://example.firebaseio.com/cities")
        );
    }

    #[test]
    fn config_expands_home_prefix_for_report_dir() {
        let config = RuntimeConfig::from_pairs(vec![
            (HOME_ENV, "/tmp/home"),
            (REPORT_DIR_ENV, "~/reports"),
        ]);
        assert_eq!(config.report_dir, PathBuf::from("/tmp/home/reports"));
    }

    #[test]
    fn config_falls_back_when_timeout_invalid() {
        let config = RuntimeConfig::from_pairs(vec![(HTTP_TIMEOUT_SECS_ENV, "0")]);
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);

        let config = RuntimeConfig::from_pairs(vec![(HTTP_TIMEOUT_SECS_ENV, "abc")]);
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);

        let config = RuntimeConfig::from_pairs(vec![(HTTP_TIMEOUT_SECS_ENV, "3")]);
        assert_eq!(config.http_timeout_secs, 3);
    }

    #[test]
    fn config_trims_trailing_slash_on_api_base() {
        let config =
            RuntimeConfig::from_pairs(vec![(API_BASE_URL_ENV, "http://127.0.0.1:9000/v4/weather/")]);
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000/v4/weather");
    }
}
