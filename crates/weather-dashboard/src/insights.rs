use chrono::{Datelike, Local, TimeZone};
use serde::Serialize;

use crate::model::{DailyForecast, HourlyForecast};
use crate::weather_code;

const HOURLY_WINDOW: usize = 24;
const DAILY_WINDOW: usize = 5;

const PATTERN_FALLBACK_LABEL: &str = "Mixed weather";
const PATTERN_FALLBACK_ICON: &str = "🌤️";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureTrend {
    LargeFluctuation,
    High,
    Cool,
    Moderate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationLevel {
    Extended,
    HeavyPossible,
    SomeExpected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindLevel {
    Strong,
    Moderate,
    Breezy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum InsightKind {
    Temperature {
        trend: TemperatureTrend,
        min: f64,
        max: f64,
        avg: f64,
    },
    Precipitation {
        level: PrecipitationLevel,
        peak: f64,
        wet_hours: usize,
    },
    Wind {
        level: WindLevel,
        peak: f64,
    },
    Uv,
    Pattern {
        weather_code: i32,
        label: String,
    },
}

impl InsightKind {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Temperature { .. } => "temperature",
            Self::Precipitation { .. } => "precipitation",
            Self::Wind { .. } => "wind",
            Self::Uv => "uv",
            Self::Pattern { .. } => "pattern",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherInsight {
    #[serde(flatten)]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub priority: u8,
}

pub fn generate_insights(hourly: &[HourlyForecast], daily: &[DailyForecast]) -> Vec<WeatherInsight> {
    if hourly.is_empty() || daily.is_empty() {
        return Vec::new();
    }

    let window = &hourly[..hourly.len().min(HOURLY_WINDOW)];
    let mut insights = vec![analyze_temperature(window)];
    insights.extend(analyze_precipitation(window));
    insights.extend(analyze_wind(window));
    insights.push(uv_advisory());
    insights.push(analyze_pattern(&daily[..daily.len().min(DAILY_WINDOW)]));

    // `sort_by` is stable, ties keep rule order.
    insights.sort_by(|a, b| b.priority.cmp(&a.priority));
    insights
}

fn analyze_temperature(window: &[HourlyForecast]) -> WeatherInsight {
    let temps: Vec<f64> = window.iter().map(|hour| hour.temperature).collect();
    let (min, max) = min_max(&temps);
    let avg = temps.iter().sum::<f64>() / temps.len() as f64;
    let trend = classify_temperature(min, max);

    let (title, description, priority) = match trend {
        TemperatureTrend::LargeFluctuation => (
            "Large Temperature Fluctuations Expected",
            format!(
                "Temperature will vary significantly by {:.1}°C over the next 24 hours. Prepare for both {min:.1}°C and {max:.1}°C.",
                max - min
            ),
            5,
        ),
        TemperatureTrend::High => (
            "High Temperatures Expected",
            format!(
                "Temperatures will reach up to {max:.1}°C. Stay hydrated and avoid prolonged sun exposure."
            ),
            4,
        ),
        TemperatureTrend::Cool => (
            "Cool Temperatures Expected",
            format!("Temperatures will drop to {min:.1}°C. Consider wearing layers."),
            4,
        ),
        TemperatureTrend::Moderate => (
            "Moderate Temperature Expected",
            format!(
                "Expect average temperatures around {avg:.1}°C with a range of {min:.1}°C to {max:.1}°C."
            ),
            2,
        ),
    };

    WeatherInsight {
        kind: InsightKind::Temperature {
            trend,
            min,
            max,
            avg,
        },
        title: title.to_string(),
        description,
        icon: "🌡️".to_string(),
        priority,
    }
}

/// First matching branch wins: fluctuation, high, cool, moderate.
pub fn classify_temperature(min: f64, max: f64) -> TemperatureTrend {
    if max - min > 10.0 {
        TemperatureTrend::LargeFluctuation
    } else if max > 30.0 {
        TemperatureTrend::High
    } else if min < 10.0 {
        TemperatureTrend::Cool
    } else {
        TemperatureTrend::Moderate
    }
}

fn analyze_precipitation(window: &[HourlyForecast]) -> Option<WeatherInsight> {
    let probabilities: Vec<f64> = window.iter().map(|hour| hour.precipitation).collect();
    let (_, peak) = min_max(&probabilities);
    if peak < 20.0 {
        return None;
    }

    let wet_hours = probabilities.iter().filter(|value| **value > 50.0).count();
    let (level, title, description, priority) = if wet_hours > 6 {
        (
            PrecipitationLevel::Extended,
            "Extended Precipitation Expected",
            format!(
                "High chance of precipitation (>50%) for {wet_hours} hours in the next 24 hours. Consider indoor activities."
            ),
            5,
        )
    } else if peak > 70.0 {
        (
            PrecipitationLevel::HeavyPossible,
            "Heavy Precipitation Possible",
            format!(
                "There's a {peak}% chance of precipitation at its peak. Be prepared for potential heavy rain."
            ),
            4,
        )
    } else {
        (
            PrecipitationLevel::SomeExpected,
            "Some Precipitation Expected",
            format!("There's a {peak}% chance of precipitation at its peak."),
            3,
        )
    };

    Some(WeatherInsight {
        kind: InsightKind::Precipitation {
            level,
            peak,
            wet_hours,
        },
        title: title.to_string(),
        description,
        icon: "🌧️".to_string(),
        priority,
    })
}

fn analyze_wind(window: &[HourlyForecast]) -> Option<WeatherInsight> {
    let speeds: Vec<f64> = window.iter().map(|hour| hour.wind_speed).collect();
    let (_, peak) = min_max(&speeds);
    if peak < 15.0 {
        return None;
    }

    let (level, title, priority) = if peak > 40.0 {
        (WindLevel::Strong, "Strong Winds Expected", 5)
    } else if peak > 25.0 {
        (WindLevel::Moderate, "Moderate Winds Expected", 3)
    } else {
        (WindLevel::Breezy, "Breezy Conditions Expected", 2)
    };

    let mut description = format!("Wind speeds may reach up to {peak:.1} km/h.");
    if level == WindLevel::Strong {
        description.push_str(" Secure loose outdoor items.");
    }

    Some(WeatherInsight {
        kind: InsightKind::Wind { level, peak },
        title: title.to_string(),
        description,
        icon: "💨".to_string(),
        priority,
    })
}

// No UV series is consulted yet; the advisory is unconditional.
fn uv_advisory() -> WeatherInsight {
    WeatherInsight {
        kind: InsightKind::Uv,
        title: "UV Protection Recommended".to_string(),
        description: "UV levels may be elevated during midday hours. Consider sun protection."
            .to_string(),
        icon: "☀️".to_string(),
        priority: 3,
    }
}

fn analyze_pattern(days: &[DailyForecast]) -> WeatherInsight {
    let code = most_common_code(days);
    let (label, icon) = weather_code::lookup(code).unwrap_or((PATTERN_FALLBACK_LABEL, PATTERN_FALLBACK_ICON));

    WeatherInsight {
        kind: InsightKind::Pattern {
            weather_code: code,
            label: label.to_string(),
        },
        title: format!("{label} Pattern"),
        description: format!(
            "Expect predominantly {} conditions over the next few days.",
            label.to_lowercase()
        ),
        icon: icon.to_string(),
        priority: 4,
    }
}

/// Most frequent code; on a tie the code seen first wins.
fn most_common_code(days: &[DailyForecast]) -> i32 {
    let mut counts: Vec<(i32, usize)> = Vec::new();
    for day in days {
        match counts.iter_mut().find(|(code, _)| *code == day.weather_code) {
            Some((_, count)) => *count += 1,
            None => counts.push((day.weather_code, 1)),
        }
    }

    let mut best: Option<(i32, usize)> = None;
    for (code, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((code, count));
        }
    }
    best.map_or(weather_code::DEFAULT_CODE, |(code, _)| code)
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
            (min.min(*value), max.max(*value))
        })
}

/// One-line clothing or activity advice driven by the top insight.
pub fn recommendation(insights: &[WeatherInsight]) -> Option<&'static str> {
    let top = insights.first()?;
    let text = match &top.kind {
        InsightKind::Temperature { trend, .. } => match trend {
            TemperatureTrend::High => "Wear light clothing and stay hydrated.",
            TemperatureTrend::Cool => "Bring a jacket or sweater with you.",
            TemperatureTrend::LargeFluctuation => {
                "Dress in layers to adapt to changing temperatures."
            }
            TemperatureTrend::Moderate => "Dress appropriately for moderate temperatures.",
        },
        InsightKind::Precipitation { .. } => "Bring an umbrella or raincoat with you.",
        InsightKind::Wind { .. } => "Secure loose items outdoors and consider windproof clothing.",
        InsightKind::Uv => "Apply sunscreen and wear a hat when outdoors.",
        InsightKind::Pattern { .. } => "Check the forecast regularly for updates.",
    };
    Some(text)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: String,
    pub avg_temp: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub precipitation: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
}

/// Week-view rows; the date is shown as e.g. `Wed, Feb 11`.
pub fn daily_summaries(daily: &[DailyForecast]) -> Vec<DailySummary> {
    daily_summaries_in(daily, &Local)
}

pub fn daily_summaries_in<Tz>(daily: &[DailyForecast], zone: &Tz) -> Vec<DailySummary>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    daily
        .iter()
        .map(|day| DailySummary {
            date: day
                .parsed_date()
                .map(|date| date.with_timezone(zone))
                .map(|date| {
                    format!(
                        "{}, {} {}",
                        date.format("%a"),
                        date.format("%b"),
                        date.day()
                    )
                })
                .unwrap_or_else(|| day.date.clone()),
            avg_temp: day.temperature,
            min_temp: day.temperature_min,
            max_temp: day.temperature_max,
            precipitation: day.precipitation,
            humidity: day.humidity,
            wind_speed: day.wind_speed,
            description: day.description.clone(),
            icon: day.weather_icon.clone(),
        })
        .collect()
}
