pub const DEFAULT_CODE: i32 = 1000;
pub const UNKNOWN_DESCRIPTION: &str = "Unknown";
pub const UNKNOWN_ICON: &str = "❓";

const WEATHER_CODES: [(i32, &str, &str); 14] = [
    (1000, "Clear", "☀️"),
    (1001, "Cloudy", "☁️"),
    (1100, "Mostly Clear", "🌤️"),
    (1101, "Partly Cloudy", "⛅"),
    (1102, "Mostly Cloudy", "🌥️"),
    (2000, "Fog", "🌫️"),
    (2100, "Light Fog", "🌫️"),
    (4000, "Drizzle", "🌦️"),
    (4001, "Drizzle Rain", "🌧️"),
    (4200, "Light Rain", "🌧️"),
    (4201, "Heavy Rain", "🌧️"),
    (5000, "Snow", "❄️"),
    (5001, "Light Thunder", "⛈️"),
    (8000, "Mostly Sunny", "☀️"),
];

/// Returns `(description, icon)` for a known code.
pub fn lookup(code: i32) -> Option<(&'static str, &'static str)> {
    WEATHER_CODES
        .iter()
        .find(|(known, _, _)| *known == code)
        .map(|(_, description, icon)| (*description, *icon))
}

pub fn description(code: i32) -> &'static str {
    lookup(code).map_or(UNKNOWN_DESCRIPTION, |(description, _)| description)
}

pub fn icon(code: i32) -> &'static str {
    lookup(code).map_or(UNKNOWN_ICON, |(_, icon)| icon)
}

/// A missing or zero code is reported as clear sky.
pub fn normalize_code(raw: Option<f64>) -> i32 {
    match raw {
        Some(value) if value.is_finite() && value != 0.0 => value.round() as i32,
        _ => DEFAULT_CODE,
    }
}

pub fn known_codes() -> impl Iterator<Item = i32> {
    WEATHER_CODES.iter().map(|(code, _, _)| *code)
}
