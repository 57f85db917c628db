//! Scripted in-process weather source for unit tests.

use std::collections::HashMap;

use almanac_core::NetworkError;
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::source::WeatherSource;
use crate::types::DailyReading;

enum Scripted {
    Reading(DailyReading),
    Transport(String),
}

/// Answers from a per-date script; unscripted dates get a 400 response.
#[derive(Default)]
pub struct ScriptedSource {
    days: Mutex<HashMap<NaiveDate, Scripted>>,
    range: Mutex<Option<Vec<DailyReading>>>,
    day_calls: Mutex<Vec<NaiveDate>>,
    range_calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_day(&self, date: NaiveDate, max_temp: f64, min_temp: f64) {
        self.days
            .lock()
            .insert(date, Scripted::Reading(DailyReading::new(date, max_temp, min_temp)));
    }

    pub fn fail_day(&self, date: NaiveDate, detail: &str) {
        self.days
            .lock()
            .insert(date, Scripted::Transport(detail.to_string()));
    }

    pub fn set_range(&self, readings: Vec<DailyReading>) {
        *self.range.lock() = Some(readings);
    }

    pub fn day_calls(&self) -> Vec<NaiveDate> {
        self.day_calls.lock().clone()
    }

    pub fn range_calls(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.range_calls.lock().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.day_calls.lock().len() + self.range_calls.lock().len()
    }
}

#[async_trait]
impl WeatherSource for ScriptedSource {
    async fn fetch_day(
        &self,
        _location: &str,
        date: NaiveDate,
    ) -> Result<DailyReading, NetworkError> {
        self.day_calls.lock().push(date);
        match self.days.lock().get(&date) {
            Some(Scripted::Reading(reading)) => Ok(reading.clone()),
            Some(Scripted::Transport(detail)) => {
                Err(NetworkError::ConnectionFailed(detail.clone()))
            }
            None => Err(NetworkError::ServerError {
                status: 400,
                message: "Bad Request".to_string(),
            }),
        }
    }

    async fn fetch_range(
        &self,
        _location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>, NetworkError> {
        self.range_calls.lock().push((start, end));
        self.range.lock().clone().ok_or_else(|| NetworkError::ServerError {
            status: 500,
            message: "Internal Server Error".to_string(),
        })
    }
}
