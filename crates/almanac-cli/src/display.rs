//! Terminal and JSON rendering of request outcomes.

use almanac_weather::{DailyReading, Outcome};
use chrono::NaiveDate;
use serde::Serialize;

/// Machine-readable reading. Fahrenheit is the stored unit; Celsius is derived.
#[derive(Debug, Serialize)]
struct ReadingView<'a> {
    date: NaiveDate,
    max_temp_f: f64,
    min_temp_f: f64,
    max_temp_c: f64,
    min_temp_c: f64,
    description: &'a str,
}

impl<'a> From<&'a DailyReading> for ReadingView<'a> {
    fn from(reading: &'a DailyReading) -> Self {
        Self {
            date: reading.date,
            max_temp_f: reading.max_temp,
            min_temp_f: reading.min_temp,
            max_temp_c: reading.max_celsius(),
            min_temp_c: reading.min_celsius(),
            description: reading.description_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RangeView {
    start: NaiveDate,
    end: NaiveDate,
    stored: usize,
}

pub fn render_text(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Reading(reading) => format!(
            "{}\nMax Temp: {:.1}°C\nMin Temp: {:.1}°C\n{}",
            reading.date,
            reading.max_celsius(),
            reading.min_celsius(),
            reading.description_or_default()
        ),
        Outcome::RangeStored { .. } => {
            format!("Success: {}", outcome.success_message().unwrap_or_default())
        }
    }
}

pub fn render_json(outcome: &Outcome) -> serde_json::Result<String> {
    match outcome {
        Outcome::Reading(reading) => serde_json::to_string_pretty(&ReadingView::from(reading)),
        Outcome::RangeStored { start, end, days } => serde_json::to_string_pretty(&RangeView {
            start: *start,
            end: *end,
            stored: *days,
        }),
    }
}
