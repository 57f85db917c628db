//! Future-date prediction from the same calendar day in past years.

use std::sync::Arc;

use almanac_core::WeatherError;
use chrono::NaiveDate;

use crate::cache::{run_blocking, WeatherStore};
use crate::date::lookback_dates;
use crate::source::WeatherSource;
use crate::types::{CachedReading, DailyReading};

/// Number of past years sampled for a prediction.
pub const LOOKBACK_YEARS: u32 = 10;

/// Running max/min sums over the years that answered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    sum_max: f64,
    sum_min: f64,
    count: u32,
}

impl Accumulator {
    pub fn add(&mut self, reading: &DailyReading) {
        self.sum_max += reading.max_temp;
        self.sum_min += reading.min_temp;
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// `(avg_max, avg_min)`, or `None` when nothing was added.
    pub fn average(&self) -> Option<(f64, f64)> {
        if self.count == 0 {
            return None;
        }
        let n = f64::from(self.count);
        Some((self.sum_max / n, self.sum_min / n))
    }
}

/// Averages the same calendar day across past years.
pub struct HistoricalAverager<S: ?Sized, T: ?Sized> {
    source: Arc<S>,
    store: Arc<T>,
    years: u32,
}

impl<S, T> HistoricalAverager<S, T>
where
    S: WeatherSource + ?Sized,
    T: WeatherStore + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, store: Arc<T>) -> Self {
        Self {
            source,
            store,
            years: LOOKBACK_YEARS,
        }
    }

    /// Predict `target` from `anchor`, `anchor - 1y`, ... one fetch at a time.
    ///
    /// Failed years are skipped. The average is stored under `target` and
    /// returned; with no usable year the prediction fails with
    /// `NoPredictionData` and nothing is stored.
    pub async fn predict(
        &self,
        location: &str,
        anchor: NaiveDate,
        target: NaiveDate,
    ) -> Result<DailyReading, WeatherError> {
        let mut acc = Accumulator::default();

        for past in lookback_dates(anchor, self.years) {
            match self.source.fetch_day(location, past).await {
                Ok(reading) => acc.add(&reading),
                Err(e) => tracing::debug!("Skipping {} for {}: {}", past, location, e),
            }
        }

        let Some((avg_max, avg_min)) = acc.average() else {
            tracing::info!("No usable history for {} at {}", target, location);
            return Err(WeatherError::NoPredictionData(target.to_string()));
        };

        let cached = CachedReading {
            date: target,
            max_temp: avg_max,
            min_temp: avg_min,
        };
        run_blocking(&self.store, move |store| store.upsert(&cached)).await?;

        tracing::info!(
            "Predicted {} for {} from {} of {} years",
            target,
            location,
            acc.count(),
            self.years
        );
        Ok(DailyReading::from(cached))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SqliteWeatherStore;
    use crate::testing::ScriptedSource;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_accumulator_mean() {
        let mut acc = Accumulator::default();
        assert_eq!(acc.average(), None);

        acc.add(&DailyReading::new(date("2023-01-01"), 50.0, 30.0));
        acc.add(&DailyReading::new(date("2022-01-01"), 60.0, 40.0));
        acc.add(&DailyReading::new(date("2021-01-01"), 70.0, 20.0));

        assert_eq!(acc.count(), 3);
        assert_eq!(acc.average(), Some((60.0, 30.0)));
    }

    #[tokio::test]
    async fn test_all_years_answer() {
        let source = Arc::new(ScriptedSource::new());
        for (i, year) in (2014..=2023).enumerate() {
            source.set_day(
                date(&format!("{year}-06-03")),
                50.0 + i as f64,
                30.0 + i as f64,
            );
        }
        let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
        let averager = HistoricalAverager::new(source.clone(), store.clone());

        let reading = averager
            .predict("Oslo", date("2023-06-03"), date("2026-06-03"))
            .await
            .unwrap();

        assert_eq!(reading.date, date("2026-06-03"));
        assert!((reading.max_temp - 54.5).abs() < 1e-9);
        assert!((reading.min_temp - 34.5).abs() < 1e-9);

        let stored = store.find_by_date(date("2026-06-03")).unwrap().unwrap();
        assert_eq!(stored.max_temp, reading.max_temp);
        assert!(store.find_by_date(date("2023-06-03")).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetches_run_in_order_one_year_apart() {
        let source = Arc::new(ScriptedSource::new());
        let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
        let averager = HistoricalAverager::new(source.clone(), store);

        let _ = averager
            .predict("Oslo", date("2023-06-03"), date("2026-06-03"))
            .await;

        let expected: Vec<NaiveDate> = (0..10)
            .map(|i| date(&format!("{}-06-03", 2023 - i)))
            .collect();
        assert_eq!(source.day_calls(), expected);
    }

    #[tokio::test]
    async fn test_single_surviving_year_is_enough() {
        let source = Arc::new(ScriptedSource::new());
        source.set_day(date("2017-12-25"), 41.0, 29.0);
        let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
        let averager = HistoricalAverager::new(source, store);

        let reading = averager
            .predict("Paris", date("2023-12-25"), date("2025-12-25"))
            .await
            .unwrap();

        assert_eq!(reading.max_temp, 41.0);
        assert_eq!(reading.min_temp, 29.0);
    }

    #[tokio::test]
    async fn test_no_usable_year_fails_and_stores_nothing() {
        let source = Arc::new(ScriptedSource::new());
        let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
        let averager = HistoricalAverager::new(source.clone(), store.clone());

        let err = averager
            .predict("Paris", date("2023-12-25"), date("2025-12-25"))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::NoPredictionData(_)));
        assert_eq!(source.day_calls().len(), 10);
        assert_eq!(store.count().unwrap(), 0);
    }
}
