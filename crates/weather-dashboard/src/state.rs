use std::fmt;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::chart::{ChartSeries, build_series};
use crate::error::{USER_FACING_FORECAST_ERROR, USER_FACING_WEATHER_ERROR};
use crate::fetch::{FetchMessage, RequestTag, request_current, request_forecast};
use crate::insights::{WeatherInsight, generate_insights, recommendation};
use crate::model::{
    CurrentWeather, DailyForecast, HourlyForecast, Metric, TimeRange, ValidationError,
    normalize_city,
};
use crate::providers::WeatherApi;
use crate::report::{ReportDocument, ReportError, ReportInput, generate_weather_report};

pub const REPORT_NOTICE_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportNoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReportNotice {
    kind: ReportNoticeKind,
    expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    CityChanged(String),
    CurrentUpdated,
    ForecastUpdated,
    InsightsUpdated,
    ChartUpdated,
    LoadFailed(&'static str),
    /// `None` when a notice has expired.
    ReportNotice(Option<ReportNoticeKind>),
}

type Observer = Box<dyn FnMut(&DashboardEvent)>;

pub struct Dashboard {
    city: String,
    current: Option<CurrentWeather>,
    hourly: Vec<HourlyForecast>,
    daily: Vec<DailyForecast>,
    insights: Vec<WeatherInsight>,
    loading_current: bool,
    loading_forecast: bool,
    current_error: Option<&'static str>,
    forecast_error: Option<&'static str>,
    metric: Metric,
    time_range: TimeRange,
    chart: Option<ChartSeries>,
    report_notice: Option<ReportNotice>,
    latest_request: u64,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("city", &self.city)
            .field("current", &self.current)
            .field("hourly", &self.hourly.len())
            .field("daily", &self.daily.len())
            .field("insights", &self.insights.len())
            .field("metric", &self.metric)
            .field("time_range", &self.time_range)
            .field("latest_request", &self.latest_request)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            current: None,
            hourly: Vec::new(),
            daily: Vec::new(),
            insights: Vec::new(),
            loading_current: false,
            loading_forecast: false,
            current_error: None,
            forecast_error: None,
            metric: Metric::default(),
            time_range: TimeRange::default(),
            chart: None,
            report_notice: None,
            latest_request: 0,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&DashboardEvent) + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn emit(&mut self, event: DashboardEvent) {
        for (_, observer) in &mut self.observers {
            observer(&event);
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn current(&self) -> Option<&CurrentWeather> {
        self.current.as_ref()
    }

    pub fn hourly(&self) -> &[HourlyForecast] {
        &self.hourly
    }

    pub fn daily(&self) -> &[DailyForecast] {
        &self.daily
    }

    pub fn insights(&self) -> &[WeatherInsight] {
        &self.insights
    }

    pub fn chart(&self) -> Option<&ChartSeries> {
        self.chart.as_ref()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn is_loading(&self) -> bool {
        self.loading_current || self.loading_forecast
    }

    pub fn current_error(&self) -> Option<&'static str> {
        self.current_error
    }

    pub fn forecast_error(&self) -> Option<&'static str> {
        self.forecast_error
    }

    pub fn recommendation(&self) -> Option<&'static str> {
        recommendation(&self.insights)
    }

    pub fn set_city(&mut self, name: &str) -> Result<(), ValidationError> {
        let city = normalize_city(name)?;
        if city != self.city {
            self.city = city.clone();
            self.emit(DashboardEvent::CityChanged(city));
        }
        Ok(())
    }

    /// Selects `city` and marks both fetches as in flight.
    pub fn begin_load(&mut self, city: &str) -> Result<RequestTag, ValidationError> {
        self.set_city(city)?;
        self.latest_request += 1;
        self.loading_current = true;
        self.loading_forecast = true;
        self.current_error = None;
        self.forecast_error = None;

        Ok(RequestTag {
            id: self.latest_request,
            city: self.city.clone(),
        })
    }

    pub fn apply(&mut self, message: FetchMessage) {
        let request = message.request();
        if request.id != self.latest_request || request.city != self.city {
            tracing::warn!(
                request_id = request.id,
                request_city = %request.city,
                latest_id = self.latest_request,
                city = %self.city,
                "applying stale weather response"
            );
        }

        match message {
            FetchMessage::CurrentDone { request, result } => {
                self.loading_current = false;
                match result {
                    Ok(current) => {
                        if current.is_none() {
                            tracing::warn!(city = %request.city, "current weather unavailable");
                        }
                        self.current = current;
                        self.emit(DashboardEvent::CurrentUpdated);
                    }
                    Err(error) => {
                        tracing::error!(%error, city = %request.city, "failed to load current weather");
                        self.current_error = Some(USER_FACING_WEATHER_ERROR);
                        self.emit(DashboardEvent::LoadFailed(USER_FACING_WEATHER_ERROR));
                    }
                }
            }
            FetchMessage::ForecastDone { request, result } => {
                self.loading_forecast = false;
                match result {
                    Ok(bundle) => {
                        self.hourly = bundle.hourly;
                        self.daily = bundle.daily;
                        self.emit(DashboardEvent::ForecastUpdated);

                        self.insights = generate_insights(&self.hourly, &self.daily);
                        self.emit(DashboardEvent::InsightsUpdated);
                        self.refresh_chart();
                    }
                    Err(error) => {
                        tracing::error!(%error, city = %request.city, "failed to load forecast");
                        self.forecast_error = Some(USER_FACING_FORECAST_ERROR);
                        self.emit(DashboardEvent::LoadFailed(USER_FACING_FORECAST_ERROR));
                    }
                }
            }
        }
    }

    /// Runs both fetches on worker threads and applies results as they arrive.
    pub fn load_blocking(&mut self, api: Arc<dyn WeatherApi>, city: &str) -> Result<(), ValidationError> {
        let request = self.begin_load(city)?;
        let (tx, rx) = mpsc::channel();
        request_current(&tx, Arc::clone(&api), request.clone());
        request_forecast(&tx, api, request);
        drop(tx);

        for message in rx {
            self.apply(message);
        }
        Ok(())
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.metric = metric;
        self.refresh_chart();
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        self.time_range = range;
        self.refresh_chart();
    }

    fn refresh_chart(&mut self) {
        self.chart = build_series(&self.hourly, self.metric, self.time_range);
        self.emit(DashboardEvent::ChartUpdated);
    }

    pub fn generate_report(
        &mut self,
        now: Instant,
        generated_at: DateTime<Local>,
    ) -> Result<ReportDocument, ReportError> {
        let input = ReportInput {
            city: &self.city,
            current: self.current.as_ref(),
            hourly: &self.hourly,
            daily: &self.daily,
            generated_at,
        };
        let result = generate_weather_report(&input);

        let kind = match &result {
            Ok(_) => ReportNoticeKind::Success,
            Err(error) => {
                tracing::warn!(%error, city = %self.city, "report not generated");
                ReportNoticeKind::Error
            }
        };
        self.report_notice = Some(ReportNotice {
            kind,
            expires_at: now + REPORT_NOTICE_DURATION,
        });
        self.emit(DashboardEvent::ReportNotice(Some(kind)));
        result
    }

    /// The active notice, clearing it once `now` reaches its expiry.
    pub fn report_notice(&mut self, now: Instant) -> Option<ReportNoticeKind> {
        let notice = self.report_notice?;
        if now >= notice.expires_at {
            self.report_notice = None;
            self.emit(DashboardEvent::ReportNotice(None));
            return None;
        }
        Some(notice.kind)
    }
}
