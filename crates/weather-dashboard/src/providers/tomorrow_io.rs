use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{CurrentWeather, DailyForecast, ForecastBundle, HourlyForecast};
use crate::weather_code;

use super::ProviderError;

pub const PROVIDER_NAME: &str = "tomorrow_io";
const API_KEY_HEADER: &str = "apikey";
const UNITS: &str = "metric";

#[derive(Debug, Serialize)]
struct LocationQuery<'a> {
    location: &'a str,
    units: &'a str,
}

#[derive(Debug, Deserialize)]
struct RealtimeResponse {
    data: Option<RealtimeData>,
    location: Option<ResponseLocation>,
}

#[derive(Debug, Deserialize)]
struct RealtimeData {
    values: Option<WeatherValues>,
}

#[derive(Debug, Deserialize)]
struct ResponseLocation {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    timelines: Option<Timelines>,
}

#[derive(Debug, Deserialize)]
struct Timelines {
    hourly: Option<Vec<TimelineEntry>>,
    daily: Option<Vec<TimelineEntry>>,
}

#[derive(Debug, Deserialize)]
struct TimelineEntry {
    #[serde(default)]
    time: String,
    #[serde(default)]
    values: WeatherValues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherValues {
    temperature: Option<f64>,
    temperature_avg: Option<f64>,
    temperature_min: Option<f64>,
    temperature_max: Option<f64>,
    humidity: Option<f64>,
    humidity_avg: Option<f64>,
    precipitation_probability: Option<f64>,
    precipitation_probability_avg: Option<f64>,
    wind_speed: Option<f64>,
    wind_speed_avg: Option<f64>,
    cloud_cover: Option<f64>,
    cloud_cover_avg: Option<f64>,
    uv_index: Option<f64>,
    uv_index_avg: Option<f64>,
    weather_code: Option<f64>,
    weather_code_max: Option<f64>,
}

impl WeatherValues {
    fn code(&self) -> i32 {
        weather_code::normalize_code(self.weather_code.or(self.weather_code_max))
    }
}

/// Average field, then plain field, then zero.
fn averaged(avg: Option<f64>, plain: Option<f64>) -> f64 {
    avg.or(plain).unwrap_or(0.0)
}

pub fn fetch_current(
    client: &Client,
    base_url: &str,
    api_key: &str,
    city: &str,
) -> Result<Option<CurrentWeather>, ProviderError> {
    let request = client
        .get(format!("{base_url}/realtime"))
        .header(API_KEY_HEADER, api_key)
        .query(&LocationQuery {
            location: city,
            units: UNITS,
        });

    let body = execute_request(request)?;
    tracing::debug!(city, bytes = body.len(), "realtime response received");
    Ok(parse_realtime_response(&body, city))
}

pub fn fetch_forecast(
    client: &Client,
    base_url: &str,
    api_key: &str,
    city: &str,
) -> Result<ForecastBundle, ProviderError> {
    let request = client
        .get(format!("{base_url}/forecast"))
        .header(API_KEY_HEADER, api_key)
        .query(&LocationQuery {
            location: city,
            units: UNITS,
        });

    let body = execute_request(request)?;
    tracing::debug!(city, bytes = body.len(), "forecast response received");
    parse_forecast_response(&body)
}

fn execute_request(request: RequestBuilder) -> Result<String, ProviderError> {
    let response = request
        .send()
        .map_err(|error| ProviderError::Transport(error.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|error| ProviderError::Transport(error.to_string()))?;

    if status.is_success() {
        return Ok(body);
    }

    let message = extract_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    Err(ProviderError::Http {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn parse_realtime_response(body: &str, city: &str) -> Option<CurrentWeather> {
    let payload: RealtimeResponse = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::warn!(city, %error, "realtime payload is not valid JSON");
            return None;
        }
    };

    let Some(values) = payload.data.and_then(|data| data.values) else {
        tracing::warn!(city, "realtime payload has no data.values");
        return None;
    };

    let name = payload
        .location
        .and_then(|location| location.name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| city.to_string());
    let code = values.code();

    Some(CurrentWeather {
        city: name,
        temperature: values.temperature.unwrap_or(0.0),
        description: weather_code::description(code).to_string(),
        humidity: values.humidity.unwrap_or(0.0),
        wind_speed: values.wind_speed.unwrap_or(0.0),
        precipitation: values.precipitation_probability.unwrap_or(0.0),
        cloud_cover: values.cloud_cover.unwrap_or(0.0),
        uv_index: values.uv_index.unwrap_or(0.0),
        weather_code: code,
        weather_icon: weather_code::icon(code).to_string(),
    })
}

pub(crate) fn parse_forecast_response(body: &str) -> Result<ForecastBundle, ProviderError> {
    let payload: ForecastResponse = serde_json::from_str(body)
        .map_err(|error| ProviderError::InvalidResponse(format!("forecast payload: {error}")))?;

    let (Some(hourly), Some(daily)) = payload
        .timelines
        .map(|timelines| (timelines.hourly, timelines.daily))
        .unwrap_or((None, None))
    else {
        return Err(ProviderError::InvalidResponse(
            "Missing timeline data".to_string(),
        ));
    };

    Ok(ForecastBundle {
        hourly: hourly.into_iter().map(normalize_hour).collect(),
        daily: daily.into_iter().map(normalize_day).collect(),
    })
}

fn normalize_hour(entry: TimelineEntry) -> HourlyForecast {
    let values = entry.values;
    let code = values.code();
    HourlyForecast {
        time: entry.time,
        temperature: averaged(values.temperature_avg, values.temperature),
        humidity: averaged(values.humidity_avg, values.humidity),
        precipitation: averaged(
            values.precipitation_probability_avg,
            values.precipitation_probability,
        ),
        wind_speed: averaged(values.wind_speed_avg, values.wind_speed),
        cloud_cover: averaged(values.cloud_cover_avg, values.cloud_cover),
        uv_index: averaged(values.uv_index_avg, values.uv_index),
        description: weather_code::description(code).to_string(),
        weather_code: code,
        weather_icon: weather_code::icon(code).to_string(),
    }
}

fn normalize_day(entry: TimelineEntry) -> DailyForecast {
    let values = entry.values;
    let code = values.code();
    DailyForecast {
        date: entry.time,
        temperature: averaged(values.temperature_avg, values.temperature),
        temperature_min: values.temperature_min.unwrap_or(0.0),
        temperature_max: values.temperature_max.unwrap_or(0.0),
        humidity: averaged(values.humidity_avg, values.humidity),
        precipitation: averaged(
            values.precipitation_probability_avg,
            values.precipitation_probability,
        ),
        wind_speed: averaged(values.wind_speed_avg, values.wind_speed),
        cloud_cover: averaged(values.cloud_cover_avg, values.cloud_cover),
        uv_index: averaged(values.uv_index_avg, values.uv_index),
        description: weather_code::description(code).to_string(),
        weather_code: code,
        weather_icon: weather_code::icon(code).to_string(),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let from_json = serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|json| {
            for key in ["message", "error", "reason", "detail", "description"] {
                if let Some(value) = json.get(key).and_then(Value::as_str) {
                    let message = value.trim();
                    if !message.is_empty() {
                        return Some(message.to_string());
                    }
                }
            }
            None
        });

    from_json.or_else(|| Some(trimmed.to_string()))
}
