//! Remote reading source seam.

use almanac_core::NetworkError;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::DailyReading;

/// Fetches readings from a remote weather provider.
///
/// Implementations perform no connectivity check; callers establish that first.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch a single day. A response without any day is an error.
    async fn fetch_day(&self, location: &str, date: NaiveDate)
        -> Result<DailyReading, NetworkError>;

    /// Fetch every day from `start` to `end` inclusive in one request.
    async fn fetch_range(
        &self,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>, NetworkError>;
}
