//! Weather lookups for Almanac
//!
//! Fetches daily readings from the Visual Crossing timeline API, predicts
//! future dates from the same day in past years, and keeps every result in a
//! local SQLite cache.

pub mod averager;
pub mod cache;
pub mod connectivity;
pub mod coordinator;
pub mod date;
pub mod provider;
pub mod source;
pub mod types;

#[cfg(test)]
mod testing;

pub use averager::{HistoricalAverager, LOOKBACK_YEARS};
pub use cache::{SqliteWeatherStore, WeatherStore};
pub use connectivity::{ConnectivityProbe, FixedConnectivity, SystemConnectivity, Transport};
pub use coordinator::{
    Clock, FixedClock, Outcome, RequestOutcome, SystemClock, WeatherQueryCoordinator,
};
pub use provider::VisualCrossingClient;
pub use source::WeatherSource;
pub use types::*;
