use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::model::{HourlyForecast, Metric, TimeRange};

const WEEK_SAMPLE_STEP: usize = 6;
const WEEK_SAMPLE_LIMIT: usize = 28;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn border(self) -> String {
        format!("rgba({}, {}, {}, 1)", self.r, self.g, self.b)
    }

    pub fn fill(self) -> String {
        format!("rgba({}, {}, {}, 0.2)", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: Metric,
    pub time_range: TimeRange,
    pub label: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub border_color: String,
    pub fill_color: String,
    pub axis: AxisBounds,
}

pub fn metric_color(metric: Metric) -> Rgb {
    match metric {
        Metric::Temperature => Rgb::new(255, 222, 89),
        Metric::Precipitation => Rgb::new(100, 181, 246),
        Metric::Wind => Rgb::new(129, 199, 132),
        Metric::Humidity => Rgb::new(186, 104, 200),
    }
}

pub fn metric_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Temperature => "Temperature (°C)",
        Metric::Precipitation => "Precipitation (%)",
        Metric::Wind => "Wind (km/h)",
        Metric::Humidity => "Humidity (%)",
    }
}

/// Hours shown for a window: a prefix for 24h/48h, every sixth hour for 7d.
pub fn select_hours(hourly: &[HourlyForecast], range: TimeRange) -> Vec<&HourlyForecast> {
    match range {
        TimeRange::Day => hourly.iter().take(24).collect(),
        TimeRange::TwoDays => hourly.iter().take(48).collect(),
        TimeRange::Week => hourly
            .iter()
            .step_by(WEEK_SAMPLE_STEP)
            .take(WEEK_SAMPLE_LIMIT)
            .collect(),
    }
}

pub fn axis_bounds(metric: Metric, values: &[f64]) -> AxisBounds {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
            (min.min(*value), max.max(*value))
        });

    match metric {
        Metric::Temperature => AxisBounds {
            min: (min - 5.0).floor(),
            max: (max + 5.0).ceil(),
        },
        Metric::Precipitation | Metric::Humidity => AxisBounds {
            min: 0.0,
            max: 100.0,
        },
        Metric::Wind => AxisBounds {
            min: 0.0,
            max: (max * 1.2).ceil(),
        },
    }
}

/// Label in the local time zone of this machine.
pub fn format_label(hour: &HourlyForecast, range: TimeRange) -> String {
    format_label_in(hour, range, &Local)
}

pub fn format_label_in<Tz>(hour: &HourlyForecast, range: TimeRange, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let Some(time) = hour.parsed_time() else {
        return hour.time.clone();
    };
    let time = time.with_timezone(zone);
    match range {
        TimeRange::Week => time.format("%a %H").to_string(),
        TimeRange::Day | TimeRange::TwoDays => time.format("%H:%M").to_string(),
    }
}

pub fn build_series(
    hourly: &[HourlyForecast],
    metric: Metric,
    range: TimeRange,
) -> Option<ChartSeries> {
    build_series_in(hourly, metric, range, &Local)
}

pub fn build_series_in<Tz>(
    hourly: &[HourlyForecast],
    metric: Metric,
    range: TimeRange,
    zone: &Tz,
) -> Option<ChartSeries>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if hourly.is_empty() {
        return None;
    }

    let hours = select_hours(hourly, range);
    let values: Vec<f64> = hours.iter().map(|hour| metric.value_of(hour)).collect();
    let labels = hours.iter().map(|hour| format_label_in(hour, range, zone)).collect();
    let color = metric_color(metric);

    Some(ChartSeries {
        metric,
        time_range: range,
        label: metric_label(metric),
        labels,
        axis: axis_bounds(metric, &values),
        values,
        border_color: color.border(),
        fill_color: color.fill(),
    })
}

/// Block-character sparkline scaled to the series axis.
pub fn render_sparkline(series: &ChartSeries) -> String {
    let span = series.axis.max - series.axis.min;
    series
        .values
        .iter()
        .map(|value| {
            if span <= 0.0 {
                return SPARK_LEVELS[0];
            }
            let ratio = ((value - series.axis.min) / span).clamp(0.0, 1.0);
            let index = (ratio * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[index.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}
