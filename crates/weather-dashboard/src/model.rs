use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub city: String,
    pub temperature: f64,
    pub description: String,
    pub humidity: f64,
    pub wind_speed: f64,
    /// Probability on a 0-100 scale, not a measured depth.
    pub precipitation: f64,
    pub cloud_cover: f64,
    pub uv_index: f64,
    pub weather_code: i32,
    pub weather_icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyForecast {
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub cloud_cover: f64,
    pub uv_index: f64,
    pub description: String,
    pub weather_code: i32,
    pub weather_icon: String,
}

impl HourlyForecast {
    pub fn parsed_time(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: String,
    pub temperature: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub cloud_cover: f64,
    pub uv_index: f64,
    pub description: String,
    pub weather_code: i32,
    pub weather_icon: String,
}

impl DailyForecast {
    pub fn parsed_date(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastBundle {
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteCity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Temperature,
    Precipitation,
    Wind,
    Humidity,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Precipitation => "precipitation",
            Self::Wind => "wind",
            Self::Humidity => "humidity",
        }
    }

    pub fn value_of(self, hour: &HourlyForecast) -> f64 {
        match self {
            Self::Temperature => hour.temperature,
            Self::Precipitation => hour.precipitation,
            Self::Wind => hour.wind_speed,
            Self::Humidity => hour.humidity,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "48h")]
    TwoDays,
    /// Seven days sampled every sixth hour.
    #[serde(rename = "7d")]
    Week,
}

impl TimeRange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::TwoDays => "48h",
            Self::Week => "7d",
        }
    }
}

pub fn normalize_city(raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyCity);
    }
    Ok(value.to_string())
}

pub fn normalize_favorite_id(raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() || value.contains('/') {
        return Err(ValidationError::InvalidFavoriteId(raw.to_string()));
    }
    Ok(value.to_string())
}

/// Tomorrow.io returns at most 120 hourly points.
pub const MAX_FORECAST_HOURS: usize = 120;

pub fn validate_hour_count(value: usize) -> Result<usize, ValidationError> {
    if value == 0 || value > MAX_FORECAST_HOURS {
        return Err(ValidationError::InvalidHourCount {
            value,
            max: MAX_FORECAST_HOURS,
        });
    }
    Ok(value)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("city must not be empty")]
    EmptyCity,
    #[error("invalid favorite id: {0:?}")]
    InvalidFavoriteId(String),
    #[error("hour count must be between 1 and {max}, got {value}")]
    InvalidHourCount { value: usize, max: usize },
}
