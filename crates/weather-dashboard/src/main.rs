use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use weather_dashboard::{
    chart::render_sparkline,
    config::RuntimeConfig,
    error::{AppError, ErrorKind},
    favorites::{FavoritesClient, FavoritesError, FavoritesStore, HttpFavoritesStore},
    insights::{DailySummary, daily_summaries},
    logging,
    model::{CurrentWeather, Metric, TimeRange, normalize_city, validate_hour_count},
    providers::{HttpWeatherApi, ProviderError, WeatherApi},
    report::{ReportError, report_file_name},
    state::Dashboard,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Weather dashboard for the terminal (Tomorrow.io)")]
struct Cli {
    /// City to show; defaults to WEATHER_DEFAULT_CITY.
    #[arg(long, global = true)]
    city: Option<String>,
    #[arg(long, value_enum, global = true)]
    output: Option<OutputModeArg>,
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Current conditions.
    Current,
    /// Hourly forecast and daily summaries.
    Forecast {
        #[arg(long, default_value_t = 24)]
        hours: usize,
    },
    /// Insights derived from the forecast, highest priority first.
    Insights,
    /// One metric over a time window.
    Chart {
        #[arg(long, value_enum, default_value_t = MetricArg::Temperature)]
        metric: MetricArg,
        #[arg(long, value_enum, default_value_t = TimeRangeArg::Day)]
        range: TimeRangeArg,
    },
    /// Export a PDF report.
    Report {
        /// Output file; defaults to WEATHER_REPORT_DIR/<City>_Weather_Report.pdf.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Everything at once.
    Dashboard,
}

#[derive(Debug, Subcommand)]
enum FavoritesAction {
    List,
    Add { name: String },
    Remove {
        /// Store push ids start with `-`.
        #[arg(allow_hyphen_values = true)]
        id: String,
    },
}

const ENVELOPE_SCHEMA_VERSION: &str = "v1";
const ERROR_CODE_USER_INVALID_INPUT: &str = "user.invalid_input";
const ERROR_CODE_USER_OUTPUT_MODE_CONFLICT: &str = "user.output_mode_conflict";
const ERROR_CODE_USER_MISSING_API_KEY: &str = "user.missing_api_key";
const ERROR_CODE_USER_FAVORITES_NOT_CONFIGURED: &str = "user.favorites_not_configured";
const ERROR_CODE_USER_REPORT_MISSING_DATA: &str = "user.report_missing_data";
const ERROR_CODE_RUNTIME_PROVIDER_FAILED: &str = "runtime.provider_failed";
const ERROR_CODE_RUNTIME_NO_DATA: &str = "runtime.no_data";
const ERROR_CODE_RUNTIME_FAVORITES_FAILED: &str = "runtime.favorites_failed";
const ERROR_CODE_RUNTIME_REPORT_WRITE: &str = "runtime.report_write_failed";
const ERROR_CODE_RUNTIME_SERIALIZE: &str = "runtime.serialize_failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputModeArg {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliOutputMode {
    Human,
    Json,
}

impl From<OutputModeArg> for CliOutputMode {
    fn from(value: OutputModeArg) -> Self {
        match value {
            OutputModeArg::Human => CliOutputMode::Human,
            OutputModeArg::Json => CliOutputMode::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MetricArg {
    Temperature,
    Precipitation,
    Wind,
    Humidity,
}

impl From<MetricArg> for Metric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Temperature => Metric::Temperature,
            MetricArg::Precipitation => Metric::Precipitation,
            MetricArg::Wind => Metric::Wind,
            MetricArg::Humidity => Metric::Humidity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TimeRangeArg {
    #[value(name = "24h")]
    Day,
    #[value(name = "48h")]
    TwoDays,
    #[value(name = "7d")]
    Week,
}

impl From<TimeRangeArg> for TimeRange {
    fn from(value: TimeRangeArg) -> Self {
        match value {
            TimeRangeArg::Day => TimeRange::Day,
            TimeRangeArg::TwoDays => TimeRange::TwoDays,
            TimeRangeArg::Week => TimeRange::Week,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliError {
    kind: ErrorKind,
    code: &'static str,
    message: String,
}

impl CliError {
    fn user(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::User,
            code,
            message: message.into(),
        }
    }

    fn runtime(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            code,
            message: message.into(),
        }
    }

    fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::User => 2,
            ErrorKind::Runtime => 1,
        }
    }
}

impl Cli {
    fn command_name(&self) -> &'static str {
        match &self.command {
            Commands::Current => "weather.current",
            Commands::Forecast { .. } => "weather.forecast",
            Commands::Insights => "weather.insights",
            Commands::Chart { .. } => "weather.chart",
            Commands::Report { .. } => "weather.report",
            Commands::Favorites { action } => match action {
                FavoritesAction::List => "favorites.list",
                FavoritesAction::Add { .. } => "favorites.add",
                FavoritesAction::Remove { .. } => "favorites.remove",
            },
            Commands::Dashboard => "weather.dashboard",
        }
    }

    fn output_mode_hint(&self) -> CliOutputMode {
        if self.json {
            CliOutputMode::Json
        } else if let Some(explicit) = self.output {
            explicit.into()
        } else {
            CliOutputMode::Human
        }
    }
}

/// Network collaborators, swapped for fakes in tests.
trait Services {
    type Store: FavoritesStore;

    fn weather_api(&self, config: &RuntimeConfig) -> Result<Arc<dyn WeatherApi>, ProviderError>;
    fn favorites_store(&self, config: &RuntimeConfig) -> Result<Self::Store, FavoritesError>;
}

struct HttpServices;

impl Services for HttpServices {
    type Store = HttpFavoritesStore;

    fn weather_api(&self, config: &RuntimeConfig) -> Result<Arc<dyn WeatherApi>, ProviderError> {
        Ok(Arc::new(HttpWeatherApi::from_config(config)?))
    }

    fn favorites_store(&self, config: &RuntimeConfig) -> Result<Self::Store, FavoritesError> {
        HttpFavoritesStore::from_config(config)
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let command = cli.command_name();
    let output_mode = cli.output_mode_hint();
    match run(cli) {
        Ok(output) => println!("{output}"),
        Err(error) => {
            emit_error(command, output_mode, &error);
            std::process::exit(error.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    let config = RuntimeConfig::from_env();
    run_with(cli, &config, &HttpServices, Local::now)
}

fn run_with<S, N>(cli: Cli, config: &RuntimeConfig, services: &S, now_fn: N) -> Result<String, CliError>
where
    S: Services,
    N: Fn() -> DateTime<Local>,
{
    let command = cli.command_name();
    let output_mode = resolve_output_mode(cli.output, cli.json, CliOutputMode::Human)?;
    let city = normalize_city(cli.city.as_deref().unwrap_or(&config.default_city))
        .map_err(|error| map_app_error(error.into(), ERROR_CODE_USER_INVALID_INPUT, ERROR_CODE_RUNTIME_NO_DATA))?;

    match cli.command {
        Commands::Current => {
            let api = services.weather_api(config).map_err(provider_failure)?;
            let current = api
                .fetch_current(&city)
                .map_err(provider_failure)?
                .ok_or_else(|| {
                    CliError::runtime(
                        ERROR_CODE_RUNTIME_NO_DATA,
                        format!("no current weather returned for {city}"),
                    )
                })?;
            render(output_mode, command, &current, || format_current(&current))
        }
        Commands::Forecast { hours } => {
            let hours = validate_hour_count(hours).map_err(|error| {
                map_app_error(error.into(), ERROR_CODE_USER_INVALID_INPUT, ERROR_CODE_RUNTIME_NO_DATA)
            })?;
            let dashboard = load_dashboard(services, config, &city)?;
            require_forecast(&dashboard)?;
            let view = ForecastView {
                city: dashboard.city(),
                hourly: &dashboard.hourly()[..hours.min(dashboard.hourly().len())],
                daily: daily_summaries(dashboard.daily()),
            };
            render(output_mode, command, &view, || format_forecast(&view))
        }
        Commands::Insights => {
            let dashboard = load_dashboard(services, config, &city)?;
            require_forecast(&dashboard)?;
            let view = json!({
                "city": dashboard.city(),
                "insights": dashboard.insights(),
                "recommendation": dashboard.recommendation(),
            });
            render(output_mode, command, &view, || format_insights(&dashboard))
        }
        Commands::Chart { metric, range } => {
            let mut dashboard = load_dashboard(services, config, &city)?;
            require_forecast(&dashboard)?;
            dashboard.set_metric(metric.into());
            dashboard.set_time_range(range.into());
            let series = dashboard.chart().ok_or_else(|| {
                CliError::runtime(ERROR_CODE_RUNTIME_NO_DATA, format!("no hourly data for {city}"))
            })?;
            render(output_mode, command, series, || {
                format!(
                    "{} | {} | {} ({}..{})\n{}",
                    dashboard.city(),
                    series.label,
                    series.time_range.as_str(),
                    series.axis.min,
                    series.axis.max,
                    render_sparkline(series)
                )
            })
        }
        Commands::Report { out } => {
            let mut dashboard = load_dashboard(services, config, &city)?;
            require_loaded(&dashboard)?;
            let document = dashboard
                .generate_report(Instant::now(), now_fn())
                .map_err(report_failure)?;
            let path = out.unwrap_or_else(|| config.report_dir.join(report_file_name(dashboard.city())));
            write_report(&path, document.as_bytes())?;

            let format = if document.is_pdf() { "pdf" } else { "placeholder" };
            let view = json!({
                "city": dashboard.city(),
                "path": path.display().to_string(),
                "format": format,
                "content_type": document.content_type(),
                "bytes": document.as_bytes().len(),
            });
            render(output_mode, command, &view, || {
                format!("Report saved to {}", path.display())
            })
        }
        Commands::Favorites { action } => {
            let store = services.favorites_store(config).map_err(favorites_failure)?;
            run_favorites(output_mode, command, FavoritesClient::new(store), action)
        }
        Commands::Dashboard => {
            let dashboard = load_dashboard(services, config, &city)?;
            if dashboard.current().is_none() && dashboard.hourly().is_empty() {
                return Err(dashboard_failure(&dashboard));
            }
            let view = json!({
                "city": dashboard.city(),
                "current": dashboard.current(),
                "current_error": dashboard.current_error(),
                "forecast_error": dashboard.forecast_error(),
                "daily": daily_summaries(dashboard.daily()),
                "insights": dashboard.insights(),
                "recommendation": dashboard.recommendation(),
                "chart": dashboard.chart(),
            });
            render(output_mode, command, &view, || format_dashboard(&dashboard))
        }
    }
}

fn run_favorites<T: FavoritesStore>(
    output_mode: CliOutputMode,
    command: &str,
    mut client: FavoritesClient<T>,
    action: FavoritesAction,
) -> Result<String, CliError> {
    match action {
        FavoritesAction::List => {
            let cities = client.load().to_vec();
            render(output_mode, command, &cities, || {
                if cities.is_empty() {
                    return "No favorite cities".to_string();
                }
                cities
                    .iter()
                    .map(|city| format!("{} {}", city.id.as_deref().unwrap_or("-"), city.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        FavoritesAction::Add { name } => {
            client.load();
            if client.contains(&name) {
                let existing = client
                    .list()
                    .iter()
                    .find(|city| city.name.eq_ignore_ascii_case(name.trim()))
                    .cloned();
                let view = json!({ "favorite": existing, "created": false });
                return render(output_mode, command, &view, || {
                    format!("{} is already a favorite", name.trim())
                });
            }
            let added = client.add(&name).map_err(favorites_failure)?;
            let view = json!({ "favorite": added, "created": true });
            render(output_mode, command, &view, || {
                format!(
                    "Added {} ({})",
                    added.name,
                    added.id.as_deref().unwrap_or("-")
                )
            })
        }
        FavoritesAction::Remove { id } => {
            client.remove(&id).map_err(favorites_failure)?;
            let view = json!({ "removed": id.trim() });
            render(output_mode, command, &view, || format!("Removed {}", id.trim()))
        }
    }
}

fn load_dashboard<S: Services>(services: &S, config: &RuntimeConfig, city: &str) -> Result<Dashboard, CliError> {
    let api = services.weather_api(config).map_err(provider_failure)?;
    let mut dashboard = Dashboard::new(city);
    dashboard.load_blocking(api, city).map_err(|error| {
        map_app_error(error.into(), ERROR_CODE_USER_INVALID_INPUT, ERROR_CODE_RUNTIME_NO_DATA)
    })?;
    Ok(dashboard)
}

fn require_forecast(dashboard: &Dashboard) -> Result<(), CliError> {
    if let Some(message) = dashboard.forecast_error() {
        return Err(CliError::runtime(ERROR_CODE_RUNTIME_PROVIDER_FAILED, message));
    }
    Ok(())
}

/// A failed fetch is a runtime failure, not missing input.
fn require_loaded(dashboard: &Dashboard) -> Result<(), CliError> {
    if let Some(message) = dashboard.current_error() {
        return Err(CliError::runtime(ERROR_CODE_RUNTIME_PROVIDER_FAILED, message));
    }
    require_forecast(dashboard)
}

fn dashboard_failure(dashboard: &Dashboard) -> CliError {
    let message = dashboard
        .current_error()
        .or(dashboard.forecast_error())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("no weather data returned for {}", dashboard.city()));
    CliError::runtime(ERROR_CODE_RUNTIME_PROVIDER_FAILED, message)
}

fn write_report(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|error| {
            CliError::runtime(
                ERROR_CODE_RUNTIME_REPORT_WRITE,
                format!("failed to create {}: {error}", parent.display()),
            )
        })?;
    }
    std::fs::write(path, bytes).map_err(|error| {
        CliError::runtime(
            ERROR_CODE_RUNTIME_REPORT_WRITE,
            format!("failed to write {}: {error}", path.display()),
        )
    })
}

#[derive(Debug, Serialize)]
struct ForecastView<'a> {
    city: &'a str,
    hourly: &'a [weather_dashboard::model::HourlyForecast],
    daily: Vec<DailySummary>,
}

fn render<T, F>(output_mode: CliOutputMode, command: &str, result: &T, human: F) -> Result<String, CliError>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    match output_mode {
        CliOutputMode::Json => render_json_envelope(command, result),
        CliOutputMode::Human => Ok(human()),
    }
}

fn resolve_output_mode(
    output: Option<OutputModeArg>,
    json_flag: bool,
    default_mode: CliOutputMode,
) -> Result<CliOutputMode, CliError> {
    match (output.map(Into::into), json_flag) {
        (Some(mode), true) if mode != CliOutputMode::Json => Err(CliError::user(
            ERROR_CODE_USER_OUTPUT_MODE_CONFLICT,
            format!(
                "conflicting output flags: --json requires --output json (got {})",
                output_mode_label(mode)
            ),
        )),
        (Some(mode), _) => Ok(mode),
        (None, true) => Ok(CliOutputMode::Json),
        (None, false) => Ok(default_mode),
    }
}

fn render_json_envelope<T: Serialize + ?Sized>(command: &str, output: &T) -> Result<String, CliError> {
    let result = serde_json::to_value(output).map_err(|error| {
        CliError::runtime(
            ERROR_CODE_RUNTIME_SERIALIZE,
            format!("failed to serialize output: {error}"),
        )
    })?;
    serde_json::to_string(&json!({
        "schema_version": ENVELOPE_SCHEMA_VERSION,
        "command": command,
        "ok": true,
        "result": result,
    }))
    .map_err(|error| {
        CliError::runtime(
            ERROR_CODE_RUNTIME_SERIALIZE,
            format!("failed to serialize output envelope: {error}"),
        )
    })
}

fn emit_error(command: &str, output_mode: CliOutputMode, error: &CliError) {
    match output_mode {
        CliOutputMode::Json => {
            let payload = json!({
                "schema_version": ENVELOPE_SCHEMA_VERSION,
                "command": command,
                "ok": false,
                "error": {
                    "code": error.code,
                    "message": redact_sensitive(&error.message),
                    "details": {
                        "kind": error_kind_label(error.kind),
                        "exit_code": error.exit_code(),
                    }
                }
            });
            let rendered = serde_json::to_string(&payload).unwrap_or_else(|serialize_error| {
                format!(
                    "{{\"schema_version\":\"{}\",\"command\":\"{}\",\"ok\":false,\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
                    ENVELOPE_SCHEMA_VERSION,
                    command,
                    ERROR_CODE_RUNTIME_SERIALIZE,
                    escape_json_string(&format!(
                        "failed to serialize error envelope: {serialize_error}"
                    )),
                )
            });
            println!("{rendered}");
        }
        CliOutputMode::Human => {
            eprintln!(
                "error[{}]: {}",
                error.code,
                redact_sensitive(&error.message)
            );
        }
    }
}

fn map_app_error(error: AppError, user_code: &'static str, runtime_code: &'static str) -> CliError {
    match error.kind {
        ErrorKind::User => CliError::user(user_code, error.message),
        ErrorKind::Runtime => CliError::runtime(runtime_code, error.message),
    }
}

fn provider_failure(error: ProviderError) -> CliError {
    let user_code = match error {
        ProviderError::MissingApiKey => ERROR_CODE_USER_MISSING_API_KEY,
        _ => ERROR_CODE_USER_INVALID_INPUT,
    };
    map_app_error(error.into(), user_code, ERROR_CODE_RUNTIME_PROVIDER_FAILED)
}

fn favorites_failure(error: FavoritesError) -> CliError {
    let user_code = match error {
        FavoritesError::NotConfigured => ERROR_CODE_USER_FAVORITES_NOT_CONFIGURED,
        _ => ERROR_CODE_USER_INVALID_INPUT,
    };
    map_app_error(error.into(), user_code, ERROR_CODE_RUNTIME_FAVORITES_FAILED)
}

fn report_failure(error: ReportError) -> CliError {
    map_app_error(
        error.into(),
        ERROR_CODE_USER_REPORT_MISSING_DATA,
        ERROR_CODE_RUNTIME_REPORT_WRITE,
    )
}

fn error_kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::User => "user",
        ErrorKind::Runtime => "runtime",
    }
}

fn output_mode_label(mode: CliOutputMode) -> &'static str {
    match mode {
        CliOutputMode::Human => "human",
        CliOutputMode::Json => "json",
    }
}

fn redact_sensitive(input: &str) -> String {
    let mut output = input.to_string();
    for pattern in [
        "apikey=",
        "apikey:",
        "token=",
        "token:",
        "secret=",
        "secret:",
        "authorization=",
        "authorization:",
    ] {
        output = redact_after_pattern(&output, pattern);
    }
    redact_bearer_token(&output)
}

fn redact_after_pattern(input: &str, pattern: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let pattern_lower = pattern.to_ascii_lowercase();
    let is_authorization_pattern = pattern_lower.starts_with("authorization");
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find(&pattern_lower) {
        let start = cursor + found;
        let value_start = skip_whitespace(input, start + pattern.len());
        let (redaction_start, value_end) = if is_authorization_pattern
            && input[value_start..]
                .to_ascii_lowercase()
                .starts_with("bearer ")
        {
            let bearer_start = value_start + "bearer ".len();
            (bearer_start, find_value_end(input, bearer_start))
        } else {
            (value_start, find_value_end(input, value_start))
        };

        output.push_str(&input[cursor..redaction_start]);
        if redaction_start < value_end {
            output.push_str("[REDACTED]");
        }
        cursor = value_end;
    }

    output.push_str(&input[cursor..]);
    output
}

fn redact_bearer_token(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let pattern = "bearer ";
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find(pattern) {
        let start = cursor + found;
        let value_start = start + pattern.len();
        let value_end = find_value_end(input, value_start);

        output.push_str(&input[cursor..value_start]);
        if value_start < value_end {
            output.push_str("[REDACTED]");
        }
        cursor = value_end;
    }

    output.push_str(&input[cursor..]);
    output
}

fn skip_whitespace(input: &str, mut index: usize) -> usize {
    let bytes = input.as_bytes();
    while index < bytes.len() && bytes[index].is_ascii_whitespace() {
        index += 1;
    }
    index
}

fn find_value_end(input: &str, mut index: usize) -> usize {
    let bytes = input.as_bytes();
    while index < bytes.len() {
        let byte = bytes[index];
        if byte.is_ascii_whitespace() || matches!(byte, b'&' | b',' | b';' | b')' | b']' | b'}') {
            break;
        }
        index += 1;
    }
    index
}

fn escape_json_string(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c < '\u{20}' => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

fn format_current(current: &CurrentWeather) -> String {
    format!(
        "{} {} {} {:.1}°C | humidity:{}% wind:{} km/h precip:{}% cloud:{}% uv:{}",
        current.city,
        current.weather_icon,
        current.description,
        current.temperature,
        current.humidity,
        current.wind_speed,
        current.precipitation,
        current.cloud_cover,
        current.uv_index
    )
}

fn format_forecast(view: &ForecastView<'_>) -> String {
    let mut lines = vec![format!("{} | next {} hours", view.city, view.hourly.len())];
    for hour in view.hourly {
        let time = hour
            .parsed_time()
            .map(|time| time.with_timezone(&Local).format("%a %H:%M").to_string())
            .unwrap_or_else(|| hour.time.clone());
        lines.push(format!(
            "{time} {} {:.1}°C rain:{}% wind:{} km/h",
            hour.weather_icon, hour.temperature, hour.precipitation, hour.wind_speed
        ));
    }
    if !view.daily.is_empty() {
        lines.push(String::new());
    }
    for day in &view.daily {
        lines.push(format_day(day));
    }
    lines.join("\n")
}

fn format_day(day: &DailySummary) -> String {
    format!(
        "{} {} {} {:.1}~{:.1}°C rain:{}%",
        day.date, day.icon, day.description, day.min_temp, day.max_temp, day.precipitation
    )
}

fn format_insights(dashboard: &Dashboard) -> String {
    let mut lines: Vec<String> = dashboard
        .insights()
        .iter()
        .map(|insight| {
            format!(
                "[{}] {} {}: {}",
                insight.priority, insight.icon, insight.title, insight.description
            )
        })
        .collect();
    if lines.is_empty() {
        lines.push("No insights available".to_string());
    }
    if let Some(recommendation) = dashboard.recommendation() {
        lines.push(format!("Recommendation: {recommendation}"));
    }
    lines.join("\n")
}

fn format_dashboard(dashboard: &Dashboard) -> String {
    let mut lines = Vec::new();
    match (dashboard.current(), dashboard.current_error()) {
        (Some(current), _) => lines.push(format_current(current)),
        (None, Some(message)) => lines.push(message.to_string()),
        (None, None) => lines.push(format!("{} | no current conditions", dashboard.city())),
    }

    if let Some(message) = dashboard.forecast_error() {
        lines.push(message.to_string());
    }
    if let Some(series) = dashboard.chart() {
        lines.push(format!("{}: {}", series.label, render_sparkline(series)));
    }
    for day in daily_summaries(dashboard.daily()) {
        lines.push(format_day(&day));
    }
    for insight in dashboard.insights().iter().take(3) {
        lines.push(format!("{} {}", insight.icon, insight.title));
    }
    if let Some(recommendation) = dashboard.recommendation() {
        lines.push(format!("Recommendation: {recommendation}"));
    }
    lines.join("\n")
}
