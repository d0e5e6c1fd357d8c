use chrono::{DateTime, Local};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfPageIndex, Rgb,
};
use thiserror::Error;

use crate::insights::generate_insights;
use crate::model::{CurrentWeather, DailyForecast, HourlyForecast};

pub const PLACEHOLDER_TEXT: &str = "Error generating report";
pub const FOOTER_TEXT: &str = "Weather App - Powered by Tomorrow.io";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const LEFT_MM: f32 = 14.0;
const TOP_MM: f32 = 20.0;
const BOTTOM_LIMIT_MM: f32 = PAGE_HEIGHT_MM - 22.0;
const FOOTER_FROM_BOTTOM_MM: f32 = 10.0;
const ROW_HEIGHT_MM: f32 = 7.0;
const PT_TO_MM: f32 = 0.3528;
// Average Helvetica advance as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;

const HOURLY_ROWS: usize = 8;
const DAILY_ROWS: usize = 5;
const INSIGHT_COUNT: usize = 3;

const NAVY: (u8, u8, u8) = (0, 51, 102);
const BLACK: (u8, u8, u8) = (0, 0, 0);
const GRAY: (u8, u8, u8) = (100, 100, 100);
const DARK_GRAY: (u8, u8, u8) = (80, 80, 80);
const LIGHT_GRAY: (u8, u8, u8) = (150, 150, 150);

const HOURLY_COLUMNS: [(&str, f32); 5] = [
    ("Time", 14.0),
    ("Temp", 44.0),
    ("Precip", 79.0),
    ("Wind", 109.0),
    ("Condition", 144.0),
];
const DAILY_COLUMNS: [(&str, f32); 5] = [
    ("Date", 14.0),
    ("Temp Range", 49.0),
    ("Precip", 94.0),
    ("Wind", 119.0),
    ("Condition", 154.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("weather data is incomplete: load current conditions and forecast first")]
    MissingData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDocument {
    Pdf(Vec<u8>),
    /// Plain-text stand-in produced when rendering fails.
    Placeholder(String),
}

impl ReportDocument {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Pdf(bytes) => bytes,
            Self::Placeholder(text) => text.as_bytes(),
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf(_))
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf(_) => "application/pdf",
            Self::Placeholder(_) => "text/plain",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub city: &'a str,
    pub current: Option<&'a CurrentWeather>,
    pub hourly: &'a [HourlyForecast],
    pub daily: &'a [DailyForecast],
    pub generated_at: DateTime<Local>,
}

/// Always a single path component: separators, reserved and control
/// characters become `_` and no `..` survives.
pub fn report_file_name(city: &str) -> String {
    let mut stem: String = city
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();
    while stem.contains("..") {
        stem = stem.replace("..", "_");
    }
    let stem = stem.trim_start_matches('.');
    let stem = if stem.is_empty() { "Weather" } else { stem };
    format!("{stem}_Weather_Report.pdf")
}

pub fn generate_weather_report(input: &ReportInput<'_>) -> Result<ReportDocument, ReportError> {
    generate_weather_report_with(input, render_pdf)
}

fn generate_weather_report_with<F>(
    input: &ReportInput<'_>,
    render: F,
) -> Result<ReportDocument, ReportError>
where
    F: FnOnce(&ReportInput<'_>, &CurrentWeather) -> Result<RenderedReport, RenderFault>,
{
    let Some(current) = input.current else {
        return Err(ReportError::MissingData);
    };
    if input.hourly.is_empty() || input.daily.is_empty() {
        return Err(ReportError::MissingData);
    }

    match render(input, current) {
        Ok(rendered) => {
            tracing::debug!(
                city = input.city,
                pages = rendered.pages,
                footers = rendered.footers,
                "report rendered"
            );
            Ok(ReportDocument::Pdf(rendered.bytes))
        }
        Err(fault) => {
            tracing::error!(city = input.city, fault = %fault.0, "failed to render report");
            Ok(ReportDocument::Placeholder(PLACEHOLDER_TEXT.to_string()))
        }
    }
}

#[derive(Debug)]
struct RenderFault(String);

impl RenderFault {
    fn from_debug(error: impl std::fmt::Debug) -> Self {
        Self(format!("{error:?}"))
    }
}

struct RenderedReport {
    bytes: Vec<u8>,
    pages: usize,
    footers: usize,
}

fn render_pdf(input: &ReportInput<'_>, current: &CurrentWeather) -> Result<RenderedReport, RenderFault> {
    let mut writer = PageWriter::new(&format!("Weather Report: {}", input.city))?;

    writer.centered(&format!("Weather Report: {}", input.city), 20.0, NAVY, true);
    writer.advance(8.0);
    writer.centered(
        &format!(
            "Generated on: {} at {}",
            input.generated_at.format("%Y-%m-%d"),
            input.generated_at.format("%H:%M:%S")
        ),
        10.0,
        GRAY,
        false,
    );
    writer.advance(12.0);

    writer.heading("Current Weather");
    for line in [
        format!("Temperature: {}°C", current.temperature),
        format!("Condition: {}", current.description),
        format!("Humidity: {}%", current.humidity),
        format!("Wind Speed: {} km/h", current.wind_speed),
        format!("Precipitation: {}%", current.precipitation),
    ] {
        writer.line(&line, 12.0, LEFT_MM, BLACK);
        writer.advance(8.0);
    }
    writer.advance(10.0);

    writer.heading("Hourly Forecast (Next 8 Hours)");
    let hourly_rows: Vec<[String; 5]> = input
        .hourly
        .iter()
        .take(HOURLY_ROWS)
        .map(|hour| {
            [
                hour.parsed_time()
                    .map(|time| time.with_timezone(&Local).format("%H:%M").to_string())
                    .unwrap_or_else(|| hour.time.clone()),
                format!("{}°C", hour.temperature),
                format!("{}%", hour.precipitation),
                format!("{} km/h", hour.wind_speed),
                hour.description.clone(),
            ]
        })
        .collect();
    writer.table(&HOURLY_COLUMNS, &hourly_rows);
    writer.advance(13.0);

    writer.heading("Daily Forecast (Next 5 Days)");
    let daily_rows: Vec<[String; 5]> = input
        .daily
        .iter()
        .take(DAILY_ROWS)
        .map(|day| {
            [
                day.parsed_date()
                    .map(|date| date.with_timezone(&Local).format("%a, %b %d").to_string())
                    .unwrap_or_else(|| day.date.clone()),
                format!("{}°C - {}°C", day.temperature_min, day.temperature_max),
                format!("{}%", day.precipitation),
                format!("{} km/h", day.wind_speed),
                day.description.clone(),
            ]
        })
        .collect();
    writer.table(&DAILY_COLUMNS, &daily_rows);
    writer.advance(13.0);

    let insights = generate_insights(input.hourly, input.daily);
    if !insights.is_empty() {
        writer.heading("Weather Insights");
        let max_chars = chars_per_line(PAGE_WIDTH_MM - 2.0 * LEFT_MM, 10.0);
        for insight in insights.iter().take(INSIGHT_COUNT) {
            let lines = wrap_text(&insight.description, max_chars);
            writer.ensure_space(8.0 + lines.len() as f32 * 5.0);
            writer.line(&format!("• {}", insight.title), 12.0, LEFT_MM, BLACK);
            writer.advance(6.0);
            for line in &lines {
                writer.line(line, 10.0, LEFT_MM + 6.0, DARK_GRAY);
                writer.advance(5.0);
            }
            writer.advance(2.0);
        }
    }

    writer.finish()
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    color: (u8, u8, u8),
    bold: bool,
}

impl TextStyle {
    fn regular(size: f32, color: (u8, u8, u8)) -> Self {
        Self {
            size,
            color,
            bold: false,
        }
    }

    fn bold(size: f32, color: (u8, u8, u8)) -> Self {
        Self {
            size,
            color,
            bold: true,
        }
    }
}

struct PageWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    cursor: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, RenderFault> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(RenderFault::from_debug)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(RenderFault::from_debug)?;

        Ok(Self {
            doc,
            regular,
            bold,
            pages: vec![(page, layer)],
            cursor: TOP_MM,
        })
    }

    fn advance(&mut self, mm: f32) {
        self.cursor += mm;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.cursor + needed > BOTTOM_LIMIT_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            self.pages.push((page, layer));
            self.cursor = TOP_MM;
        }
    }

    fn write(&self, page_slot: usize, text: &str, x: f32, y_from_top: f32, style: TextStyle) {
        let Some((page, layer)) = self.pages.get(page_slot).copied() else {
            return;
        };
        let layer = self.doc.get_page(page).get_layer(layer);
        let (r, g, b) = style.color;
        layer.set_fill_color(Color::Rgb(Rgb::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            None,
        )));
        let font = if style.bold { &self.bold } else { &self.regular };
        layer.use_text(
            pdf_safe(text),
            style.size,
            Mm(x),
            Mm(PAGE_HEIGHT_MM - y_from_top),
            font,
        );
    }

    fn last_page(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    fn line(&mut self, text: &str, size: f32, x: f32, color: (u8, u8, u8)) {
        self.ensure_space(size * PT_TO_MM);
        self.write(self.last_page(), text, x, self.cursor, TextStyle::regular(size, color));
    }

    fn centered(&mut self, text: &str, size: f32, color: (u8, u8, u8), bold: bool) {
        self.ensure_space(size * PT_TO_MM);
        let x = centered_x(text, size);
        let style = if bold {
            TextStyle::bold(size, color)
        } else {
            TextStyle::regular(size, color)
        };
        self.write(self.last_page(), text, x, self.cursor, style);
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(10.0 + 2.0 * ROW_HEIGHT_MM);
        self.write(self.last_page(), text, LEFT_MM, self.cursor, TextStyle::bold(16.0, NAVY));
        self.advance(10.0);
    }

    fn table(&mut self, columns: &[(&str, f32); 5], rows: &[[String; 5]]) {
        self.table_header(columns);
        for row in rows {
            if self.cursor + ROW_HEIGHT_MM > BOTTOM_LIMIT_MM {
                self.ensure_space(ROW_HEIGHT_MM * 2.0);
                self.table_header(columns);
            }
            for (cell, (_, x)) in row.iter().zip(columns.iter()) {
                self.write(self.last_page(), cell, *x, self.cursor, TextStyle::regular(10.0, BLACK));
            }
            self.advance(ROW_HEIGHT_MM);
        }
    }

    fn table_header(&mut self, columns: &[(&str, f32); 5]) {
        self.ensure_space(ROW_HEIGHT_MM * 2.0);
        for (title, x) in columns {
            self.write(self.last_page(), title, *x, self.cursor, TextStyle::bold(10.0, NAVY));
        }
        self.advance(ROW_HEIGHT_MM);
    }

    fn finish(self) -> Result<RenderedReport, RenderFault> {
        let footer_x = centered_x(FOOTER_TEXT, 8.0);
        let mut footers = 0;
        for slot in 0..self.pages.len() {
            footers += 1;
            self.write(
                slot,
                FOOTER_TEXT,
                footer_x,
                PAGE_HEIGHT_MM - FOOTER_FROM_BOTTOM_MM,
                TextStyle::regular(8.0, LIGHT_GRAY),
            );
        }

        let pages = self.pages.len();
        let bytes = self.doc.save_to_bytes().map_err(RenderFault::from_debug)?;
        Ok(RenderedReport {
            bytes,
            pages,
            footers,
        })
    }
}

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM * PT_TO_MM
}

fn centered_x(text: &str, size: f32) -> f32 {
    ((PAGE_WIDTH_MM - approx_text_width(text, size)) / 2.0).max(LEFT_MM)
}

fn chars_per_line(width_mm: f32, size: f32) -> usize {
    ((width_mm / (size * AVG_GLYPH_EM * PT_TO_MM)) as usize).max(1)
}

/// Greedy word wrap; words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Built-in PDF fonts only cover single-byte text.
fn pdf_safe(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for ch in text.replace("°C", " C").chars() {
        match ch {
            '°' => output.push_str(" deg"),
            '•' => output.push('-'),
            '\u{2018}' | '\u{2019}' => output.push('\''),
            c if c.is_ascii() => output.push(c),
            _ => {}
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn current() -> CurrentWeather {
        CurrentWeather {
            city: "New York".to_string(),
            temperature: 21.3,
            description: "Partly Cloudy".to_string(),
            humidity: 58.0,
            wind_speed: 14.2,
            precipitation: 20.0,
            cloud_cover: 45.0,
            uv_index: 5.0,
            weather_code: 1101,
            weather_icon: "⛅".to_string(),
        }
    }

    fn hourly(count: usize) -> Vec<HourlyForecast> {
        (0..count)
            .map(|index| HourlyForecast {
                time: format!("2026-02-11T{:02}:00:00Z", index % 24),
                temperature: 5.0 + index as f64,
                humidity: 60.0,
                precipitation: if index < 10 { 80.0 } else { 10.0 },
                wind_speed: 30.0,
                cloud_cover: 70.0,
                uv_index: 2.0,
                description: "Light Rain".to_string(),
                weather_code: 4200,
                weather_icon: "🌧️".to_string(),
            })
            .collect()
    }

    fn daily(count: usize) -> Vec<DailyForecast> {
        (0..count)
            .map(|index| DailyForecast {
                date: format!("2026-02-{:02}T06:00:00Z", 11 + index),
                temperature: 14.0,
                temperature_min: 8.0,
                temperature_max: 19.0,
                humidity: 62.0,
                precipitation: 40.0,
                wind_speed: 12.0,
                cloud_cover: 50.0,
                uv_index: 3.0,
                description: "Cloudy".to_string(),
                weather_code: 1001,
                weather_icon: "☁️".to_string(),
            })
            .collect()
    }

    fn generated_at() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 2, 11, 9, 30, 0)
            .single()
            .expect("time")
    }

    #[test]
    fn report_requires_current_weather() {
        let hours = hourly(24);
        let days = daily(5);
        let input = ReportInput {
            city: "New York",
            current: None,
            hourly: &hours,
            daily: &days,
            generated_at: generated_at(),
        };
        assert_eq!(generate_weather_report(&input), Err(ReportError::MissingData));
    }

    #[test]
    fn report_requires_both_timelines() {
        let current = current();
        let hours = hourly(24);
        let days = daily(5);

        let no_hours = ReportInput {
            city: "New York",
            current: Some(&current),
            hourly: &[],
            daily: &days,
            generated_at: generated_at(),
        };
        assert_eq!(generate_weather_report(&no_hours), Err(ReportError::MissingData));

        let no_days = ReportInput {
            daily: &[],
            hourly: &hours,
            ..no_hours
        };
        assert_eq!(generate_weather_report(&no_days), Err(ReportError::MissingData));
    }

    #[test]
    fn report_with_complete_data_is_a_pdf() {
        let current = current();
        let hours = hourly(24);
        let days = daily(7);
        let input = ReportInput {
            city: "New York",
            current: Some(&current),
            hourly: &hours,
            daily: &days,
            generated_at: generated_at(),
        };

        let document = generate_weather_report(&input).expect("report");
        assert!(document.is_pdf());
        assert_eq!(document.content_type(), "application/pdf");
        assert!(document.as_bytes().starts_with(b"%PDF"));
    }

    #[test]
    fn report_overflowing_content_continues_on_new_page() {
        let current = current();
        let hours = hourly(24);
        let days = daily(5);
        let input = ReportInput {
            city: "New York",
            current: Some(&current),
            hourly: &hours,
            daily: &days,
            generated_at: generated_at(),
        };

        let rendered = render_pdf(&input, &current).expect("render");
        assert!(rendered.pages >= 2, "pages: {}", rendered.pages);
        assert_eq!(rendered.footers, rendered.pages);
        assert!(!rendered.bytes.is_empty());
    }

    #[test]
    fn report_render_fault_yields_placeholder() {
        let current = current();
        let hours = hourly(24);
        let days = daily(5);
        let input = ReportInput {
            city: "New York",
            current: Some(&current),
            hourly: &hours,
            daily: &days,
            generated_at: generated_at(),
        };

        let document = generate_weather_report_with(&input, |_, _| {
            Err(RenderFault("font table unavailable".to_string()))
        })
        .expect("placeholder");
        assert_eq!(
            document,
            ReportDocument::Placeholder(PLACEHOLDER_TEXT.to_string())
        );
        assert_eq!(document.as_bytes(), b"Error generating report");
    }

    #[test]
    fn report_missing_data_is_checked_before_rendering() {
        let hours = hourly(24);
        let input = ReportInput {
            city: "New York",
            current: None,
            hourly: &hours,
            daily: &[],
            generated_at: generated_at(),
        };

        let result = generate_weather_report_with(&input, |_, _| {
            panic!("renderer must not run without data")
        });
        assert_eq!(result, Err(ReportError::MissingData));
    }

    #[test]
    fn report_footer_names_the_app() {
        assert_eq!(FOOTER_TEXT, "Weather App - Powered by Tomorrow.io");
    }

    #[test]
    fn report_file_name_replaces_spaces() {
        assert_eq!(report_file_name("New York"), "New_York_Weather_Report.pdf");
        assert_eq!(
            report_file_name(" Rio de Janeiro "),
            "Rio_de_Janeiro_Weather_Report.pdf"
        );
    }

    #[test]
    fn report_file_name_stays_a_single_component() {
        assert_eq!(
            report_file_name("Frankfurt am Main/Hessen"),
            "Frankfurt_am_Main_Hessen_Weather_Report.pdf"
        );
        assert_eq!(report_file_name(r"C:\Temp"), "C__Temp_Weather_Report.pdf");

        for city in ["../../etc/cron.d/x", "..", "...", "./.hidden"] {
            let name = report_file_name(city);
            assert!(!name.contains('/'), "{city} -> {name}");
            assert!(!name.contains('\\'), "{city} -> {name}");
            assert!(!name.contains(".."), "{city} -> {name}");
            assert!(!name.starts_with('.'), "{city} -> {name}");
        }
        assert_eq!(report_file_name(".."), "__Weather_Report.pdf");
    }

    #[test]
    fn report_wrap_text_respects_width() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert_eq!(
            lines,
            vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]
        );
        assert!(lines.iter().all(|line| line.chars().count() <= 10));
    }

    #[test]
    fn report_wrap_text_splits_long_words() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_text("   ", 4).is_empty());
    }

    #[test]
    fn report_pdf_safe_text_is_ascii() {
        assert_eq!(pdf_safe("• 21.5°C ☀️"), "- 21.5 C ");
        assert_eq!(pdf_safe("There’s rain"), "There's rain");
    }

    #[test]
    fn report_placeholder_exposes_text_bytes() {
        let document = ReportDocument::Placeholder(PLACEHOLDER_TEXT.to_string());
        assert!(!document.is_pdf());
        assert_eq!(document.as_bytes(), PLACEHOLDER_TEXT.as_bytes());
        assert_eq!(document.content_type(), "text/plain");
    }
}
