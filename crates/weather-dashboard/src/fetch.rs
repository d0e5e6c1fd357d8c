use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::model::{CurrentWeather, ForecastBundle};
use crate::providers::{ProviderError, WeatherApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub id: u64,
    pub city: String,
}

#[derive(Debug)]
pub enum FetchMessage {
    CurrentDone {
        request: RequestTag,
        result: Result<Option<CurrentWeather>, ProviderError>,
    },
    ForecastDone {
        request: RequestTag,
        result: Result<ForecastBundle, ProviderError>,
    },
}

impl FetchMessage {
    pub fn request(&self) -> &RequestTag {
        match self {
            Self::CurrentDone { request, .. } | Self::ForecastDone { request, .. } => request,
        }
    }
}

/// Fetches current conditions off-thread and sends `CurrentDone`.
pub fn request_current(tx: &Sender<FetchMessage>, api: Arc<dyn WeatherApi>, request: RequestTag) {
    let tx = tx.clone();
    let fallback = tx.clone();
    let fallback_request = request.clone();

    let spawned = thread::Builder::new()
        .name("weather-current".to_string())
        .spawn(move || {
            tracing::debug!(city = %request.city, id = request.id, "current weather request started");
            let result = api.fetch_current(&request.city);
            let _ = tx.send(FetchMessage::CurrentDone { request, result });
        });

    if let Err(error) = spawned {
        tracing::error!(%error, "failed to spawn current weather worker");
        let _ = fallback.send(FetchMessage::CurrentDone {
            request: fallback_request,
            result: Err(ProviderError::Transport(error.to_string())),
        });
    }
}

/// Fetches the hourly and daily forecast off-thread and sends `ForecastDone`.
pub fn request_forecast(tx: &Sender<FetchMessage>, api: Arc<dyn WeatherApi>, request: RequestTag) {
    let tx = tx.clone();
    let fallback = tx.clone();
    let fallback_request = request.clone();

    let spawned = thread::Builder::new()
        .name("weather-forecast".to_string())
        .spawn(move || {
            tracing::debug!(city = %request.city, id = request.id, "forecast request started");
            let result = api.fetch_forecast(&request.city);
            let _ = tx.send(FetchMessage::ForecastDone { request, result });
        });

    if let Err(error) = spawned {
        tracing::error!(%error, "failed to spawn forecast worker");
        let _ = fallback.send(FetchMessage::ForecastDone {
            request: fallback_request,
            result: Err(ProviderError::Transport(error.to_string())),
        });
    }
}
