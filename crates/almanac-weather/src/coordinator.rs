//! Per-request routing between live fetches, prediction and the cache.
//!
//! Each request returns its own outcome; nothing is shared between calls
//! except the in-flight counter behind `is_loading`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use almanac_core::WeatherError;
use chrono::NaiveDate;

use crate::averager::HistoricalAverager;
use crate::cache::{run_blocking, WeatherStore};
use crate::connectivity::ConnectivityProbe;
use crate::date::{anchor_date, parse_date_text, years_before};
use crate::source::WeatherSource;
use crate::types::{CachedReading, DailyReading};

/// Source of "today" for deciding whether a date is in the future.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// What a settled request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A reading to display (live, predicted or cached).
    Reading(DailyReading),
    /// A range was fetched and cached; there is no single reading to show.
    RangeStored {
        start: NaiveDate,
        end: NaiveDate,
        days: usize,
    },
}

impl Outcome {
    pub fn reading(&self) -> Option<&DailyReading> {
        match self {
            Outcome::Reading(reading) => Some(reading),
            Outcome::RangeStored { .. } => None,
        }
    }

    pub fn success_message(&self) -> Option<String> {
        match self {
            Outcome::Reading(_) => None,
            Outcome::RangeStored { start, end, days } => Some(format!(
                "Stored {} day(s) from {} to {}",
                days, start, end
            )),
        }
    }
}

/// Result of one request: the outcome, or the error to show.
pub type RequestOutcome = Result<Outcome, WeatherError>;

/// Raises the in-flight count for its lifetime.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn raise(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct WeatherQueryCoordinator {
    source: Arc<dyn WeatherSource>,
    store: Arc<dyn WeatherStore>,
    probe: Arc<dyn ConnectivityProbe>,
    clock: Arc<dyn Clock>,
    averager: HistoricalAverager<dyn WeatherSource, dyn WeatherStore>,
    in_flight: AtomicUsize,
}

impl WeatherQueryCoordinator {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        store: Arc<dyn WeatherStore>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        let averager = HistoricalAverager::new(Arc::clone(&source), Arc::clone(&store));
        Self {
            source,
            store,
            probe,
            clock: Arc::new(SystemClock),
            averager,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Replace the clock used to decide what "today" is.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// True while any request is running.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Look up one date: a live fetch for today or earlier, a prediction
    /// from past years for a future date.
    pub async fn request_single_date(&self, location: &str, date_text: &str) -> RequestOutcome {
        let _loading = LoadingGuard::raise(&self.in_flight);

        let result = self.single_date(location, date_text).await;
        settle("single date", result.map(Outcome::Reading))
    }

    /// Fetch `start..=end` in one call and cache every day.
    pub async fn request_range(
        &self,
        location: &str,
        start_text: &str,
        end_text: &str,
    ) -> RequestOutcome {
        let _loading = LoadingGuard::raise(&self.in_flight);

        let result = self.range(location, start_text, end_text).await;
        settle("range", result)
    }

    /// Fetch and cache the year ending at `end_text`: `end - 1 year ..= end`.
    pub async fn request_year_ending(&self, location: &str, end_text: &str) -> RequestOutcome {
        let _loading = LoadingGuard::raise(&self.in_flight);

        let result = self.year_ending(location, end_text).await;
        settle("range", result)
    }

    /// Read a cached reading by exact date.
    pub async fn request_from_cache(&self, date_text: &str) -> RequestOutcome {
        let _loading = LoadingGuard::raise(&self.in_flight);

        let result = self.cached(date_text).await;
        settle("cache", result.map(Outcome::Reading))
    }

    async fn single_date(&self, location: &str, date_text: &str) -> Result<DailyReading, WeatherError> {
        let entered = parse_date_text(date_text)?;
        self.ensure_connected().await?;

        let today = self.clock.today();
        if entered <= today {
            return self.fetch_single_day(location, entered).await;
        }

        let anchor = anchor_date(entered, today)
            .ok_or_else(|| WeatherError::InvalidDateFormat(date_text.to_string()))?;
        tracing::info!(
            "{} is in the future, predicting from years ending {}",
            entered,
            anchor
        );
        self.averager.predict(location, anchor, entered).await
    }

    async fn fetch_single_day(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> Result<DailyReading, WeatherError> {
        let reading = self.source.fetch_day(location, date).await?;

        let cached = CachedReading::from(&reading);
        run_blocking(&self.store, move |store| store.upsert(&cached)).await?;

        Ok(reading)
    }

    async fn range(
        &self,
        location: &str,
        start_text: &str,
        end_text: &str,
    ) -> Result<Outcome, WeatherError> {
        let start = parse_date_text(start_text)?;
        let end = parse_date_text(end_text)?;
        self.range_between(location, start, end).await
    }

    async fn year_ending(&self, location: &str, end_text: &str) -> Result<Outcome, WeatherError> {
        let end = parse_date_text(end_text)?;
        let start = years_before(end, 1)
            .ok_or_else(|| WeatherError::InvalidDateFormat(end_text.to_string()))?;
        self.range_between(location, start, end).await
    }

    async fn range_between(
        &self,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Outcome, WeatherError> {
        if end < start {
            return Err(WeatherError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        self.ensure_connected().await?;

        let days = self.source.fetch_range(location, start, end).await?;
        let rows: Vec<CachedReading> = days.iter().map(CachedReading::from).collect();
        let count = rows.len();
        run_blocking(&self.store, move |store| store.upsert_all(&rows)).await?;

        Ok(Outcome::RangeStored {
            start,
            end,
            days: count,
        })
    }

    async fn cached(&self, date_text: &str) -> Result<DailyReading, WeatherError> {
        let date = parse_date_text(date_text)?;

        run_blocking(&self.store, move |store| store.find_by_date(date))
            .await?
            .map(DailyReading::from)
            .ok_or_else(|| WeatherError::NotFound(date.to_string()))
    }

    async fn ensure_connected(&self) -> Result<(), WeatherError> {
        match self.probe.active_transport().await {
            Some(transport) => {
                tracing::debug!("Active transport: {:?}", transport);
                Ok(())
            }
            None => Err(WeatherError::NoConnectivity),
        }
    }
}

fn settle(kind: &str, result: RequestOutcome) -> RequestOutcome {
    match &result {
        Ok(outcome) => tracing::info!("{} request settled: {:?}", kind, outcome),
        Err(e) => tracing::warn!("{} request failed: {}", kind, e),
    }
    result
}
