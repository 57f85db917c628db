use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Shown when a reading carries no description (cached or averaged readings).
pub const NO_DESCRIPTION: &str = "Description not available";

/// One day's temperatures for a location, in Fahrenheit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReading {
    pub date: NaiveDate,
    pub max_temp: f64,
    pub min_temp: f64,
    pub description: Option<String>,
}

impl DailyReading {
    pub fn new(date: NaiveDate, max_temp: f64, min_temp: f64) -> Self {
        Self {
            date,
            max_temp,
            min_temp,
            description: None,
        }
    }

    /// Maximum temperature converted for display.
    pub fn max_celsius(&self) -> f64 {
        fahrenheit_to_celsius(self.max_temp)
    }

    /// Minimum temperature converted for display.
    pub fn min_celsius(&self) -> f64 {
        fahrenheit_to_celsius(self.min_temp)
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }
}

/// Persisted form of a reading. One row per calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedReading {
    pub date: NaiveDate,
    pub max_temp: f64,
    pub min_temp: f64,
}

impl From<&DailyReading> for CachedReading {
    fn from(reading: &DailyReading) -> Self {
        Self {
            date: reading.date,
            max_temp: reading.max_temp,
            min_temp: reading.min_temp,
        }
    }
}

impl From<CachedReading> for DailyReading {
    fn from(cached: CachedReading) -> Self {
        DailyReading::new(cached.date, cached.max_temp, cached.min_temp)
    }
}

/// `(F - 32) * 5/9`. Display only; stored and transmitted values stay Fahrenheit.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Timeline API response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TimelineResponse {
    #[serde(default)]
    pub days: Vec<TimelineDay>,
}

/// One entry of `days` in a timeline response.
#[derive(Debug, Deserialize)]
pub(crate) struct TimelineDay {
    pub datetime: String,
    /// `null` for days the service has no observations for.
    #[serde(default)]
    pub tempmax: Option<f64>,
    #[serde(default)]
    pub tempmin: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TimelineDay {
    pub fn has_temperatures(&self) -> bool {
        self.tempmax.is_some() && self.tempmin.is_some()
    }

    /// Convert to a reading; `None` if `datetime` is not an ISO date or a
    /// temperature is missing.
    pub fn into_reading(self) -> Option<DailyReading> {
        let date = NaiveDate::parse_from_str(&self.datetime, "%Y-%m-%d").ok()?;
        Some(DailyReading {
            date,
            max_temp: self.tempmax?,
            min_temp: self.tempmin?,
            description: self.description.filter(|d| !d.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_celsius_conversion() {
        assert!((fahrenheit_to_celsius(32.0) - 0.0).abs() < 1e-9);
        assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < 1e-9);
        assert!((fahrenheit_to_celsius(-40.0) + 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_reading_celsius_helpers_leave_value_untouched() {
        let reading = DailyReading::new(date("2024-07-01"), 86.0, 68.0);
        assert!((reading.max_celsius() - 30.0).abs() < 1e-9);
        assert!((reading.min_celsius() - 20.0).abs() < 1e-9);
        assert_eq!(reading.max_temp, 86.0);
    }

    #[test]
    fn test_cached_round_trip_drops_description() {
        let reading = DailyReading {
            date: date("2024-03-25"),
            max_temp: 60.5,
            min_temp: 41.0,
            description: Some("Partly cloudy".into()),
        };
        let cached = CachedReading::from(&reading);
        let back = DailyReading::from(cached);
        assert_eq!(back.date, reading.date);
        assert_eq!(back.max_temp, 60.5);
        assert_eq!(back.description, None);
        assert_eq!(back.description_or_default(), NO_DESCRIPTION);
    }

    #[test]
    fn test_timeline_parse() {
        let body = r#"{"days":[{"datetime":"2023-03-25","tempmax":55.1,"tempmin":39.4}]}"#;
        let parsed: TimelineResponse = serde_json::from_str(body).unwrap();
        let reading = parsed.days.into_iter().next().unwrap().into_reading().unwrap();
        assert_eq!(reading.date, date("2023-03-25"));
        assert_eq!(reading.max_temp, 55.1);
        assert_eq!(reading.min_temp, 39.4);
        assert!(reading.description.is_none());
    }

    #[test]
    fn test_timeline_missing_days_is_empty() {
        let parsed: TimelineResponse = serde_json::from_str(r#"{"address":"x"}"#).unwrap();
        assert!(parsed.days.is_empty());
    }

    #[test]
    fn test_timeline_bad_datetime_is_rejected() {
        let day = TimelineDay {
            datetime: "25/03/2023".into(),
            tempmax: Some(1.0),
            tempmin: Some(0.0),
            description: None,
        };
        assert!(day.into_reading().is_none());
    }

    #[test]
    fn test_timeline_null_temperatures_decode() {
        let body = r#"{"days":[
            {"datetime":"2023-03-25","tempmax":55.1,"tempmin":39.4},
            {"datetime":"2023-03-26","tempmax":null,"tempmin":null},
            {"datetime":"2023-03-27","tempmax":51.0}
        ]}"#;
        let parsed: TimelineResponse = serde_json::from_str(body).unwrap();
        let complete: Vec<bool> = parsed.days.iter().map(TimelineDay::has_temperatures).collect();
        assert_eq!(complete, vec![true, false, false]);

        let readings: Vec<DailyReading> =
            parsed.days.into_iter().filter_map(TimelineDay::into_reading).collect();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].date, date("2023-03-25"));
    }
}
