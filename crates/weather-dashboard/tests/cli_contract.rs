use std::process::{Command, Output};

use serde_json::Value;
use weather_dashboard::insights::generate_insights;
use weather_dashboard::model::{DailyForecast, FavoriteCity, HourlyForecast};

fn run_cli(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_weather-dashboard"));
    cmd.args(args);
    for key in ["TOMORROW_IO_API_KEY", "WEATHER_API_KEY", "FAVORITES_STORE_URL"] {
        cmd.env_remove(key);
    }
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("run weather-dashboard")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout json")
}

fn hour(index: usize, precipitation: f64) -> HourlyForecast {
    HourlyForecast {
        time: format!("2026-02-11T{:02}:00:00Z", index % 24),
        temperature: 31.0 + (index % 4) as f64,
        humidity: 40.0,
        precipitation,
        wind_speed: 10.0,
        cloud_cover: 10.0,
        uv_index: 9.0,
        description: "Clear".to_string(),
        weather_code: 1000,
        weather_icon: "☀️".to_string(),
    }
}

fn day(date: &str) -> DailyForecast {
    DailyForecast {
        date: date.to_string(),
        temperature: 32.0,
        temperature_min: 29.0,
        temperature_max: 35.0,
        humidity: 40.0,
        precipitation: 5.0,
        wind_speed: 10.0,
        cloud_cover: 10.0,
        uv_index: 9.0,
        description: "Clear".to_string(),
        weather_code: 1000,
        weather_icon: "☀️".to_string(),
    }
}

#[test]
fn cli_contract_missing_api_key_is_user_error_envelope() {
    let output = run_cli(&["current", "--city", "Paris", "--json"], &[]);

    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json.get("schema_version").and_then(Value::as_str), Some("v1"));
    assert_eq!(json.get("command").and_then(Value::as_str), Some("weather.current"));
    assert_eq!(json.get("ok").and_then(Value::as_bool), Some(false));
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("user.missing_api_key")
    );
    assert_eq!(
        json.pointer("/error/details/kind").and_then(Value::as_str),
        Some("user")
    );
    assert_eq!(
        json.pointer("/error/details/exit_code").and_then(Value::as_i64),
        Some(2)
    );
}

#[test]
fn cli_contract_human_errors_go_to_stderr() {
    let output = run_cli(&["dashboard"], &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[user.missing_api_key]"), "stderr: {stderr}");
}

#[test]
fn cli_contract_conflicting_output_flags_fail_before_network() {
    let output = run_cli(
        &["current", "--json", "--output", "human"],
        &[("TOMORROW_IO_API_KEY", "unused")],
    );

    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("user.output_mode_conflict")
    );
}

#[test]
fn cli_contract_favorites_need_store_url() {
    let output = run_cli(&["favorites", "list", "--json"], &[]);

    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json.get("command").and_then(Value::as_str), Some("favorites.list"));
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("user.favorites_not_configured")
    );
}

#[test]
fn cli_contract_rejects_unknown_time_range() {
    let output = run_cli(&["chart", "--range", "30d"], &[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_contract_insights_serialize_with_category_tag() {
    let hourly: Vec<HourlyForecast> = (0..24)
        .map(|index| hour(index, if index < 8 { 80.0 } else { 0.0 }))
        .collect();
    let daily: Vec<DailyForecast> = (11..16)
        .map(|date| day(&format!("2026-02-{date}T06:00:00Z")))
        .collect();

    let insights = generate_insights(&hourly, &daily);
    let value = serde_json::to_value(&insights).expect("json");
    let items = value.as_array().expect("array");
    assert!(!items.is_empty());

    for item in items {
        for field in ["category", "title", "description", "icon", "priority"] {
            assert!(item.get(field).is_some(), "missing field: {field}");
        }
    }
    let categories: Vec<&str> = items
        .iter()
        .filter_map(|item| item.get("category").and_then(Value::as_str))
        .collect();
    assert!(categories.contains(&"temperature"));
    assert!(categories.contains(&"precipitation"));
    assert!(categories.contains(&"uv"));
}

#[test]
fn cli_contract_favorite_without_id_omits_the_field() {
    let value = serde_json::to_value(FavoriteCity {
        id: None,
        name: "Paris".to_string(),
    })
    .expect("json");
    assert_eq!(value, serde_json::json!({ "name": "Paris" }));
}
