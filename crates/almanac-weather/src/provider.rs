//! Visual Crossing timeline API client.

use std::sync::Arc;
use std::time::Duration;

use almanac_core::{ConfigError, NetworkError, ReqwestErrorExt, WeatherConfig};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::instrument;
use url::Url;

use crate::source::WeatherSource;
use crate::types::{DailyReading, TimelineResponse};

const INCLUDE: &str = "days";
const ELEMENTS: &str = "datetime,tempmax,tempmin";
const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_ERROR_MESSAGE_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct VisualCrossingClient {
    client: Arc<Client>,
    base_url: Url,
    api_key: String,
}

impl VisualCrossingClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConfigError::Invalid(format!("weather.api_base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "weather.api_base_url: {} cannot carry a path",
                base_url
            )));
        }
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingSetting("weather.api_key".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Build a client from the `[weather]` config section.
    pub fn from_config(config: &WeatherConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .effective_api_key()
            .ok_or_else(|| ConfigError::MissingSetting("weather.api_key".to_string()))?;
        Self::new(
            &config.api_base_url,
            &api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// `{base}/timeline/{location}/{date}[/{date}]?key=..&include=days&elements=..`
    fn timeline_url(&self, location: &str, dates: &[NaiveDate]) -> Result<Url, NetworkError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                NetworkError::ConnectionFailed(format!("base URL {} cannot carry a path", self.base_url))
            })?;
            segments.pop_if_empty().push("timeline").push(location);
            for date in dates {
                segments.push(&date.format(DATE_FORMAT).to_string());
            }
        }
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("include", INCLUDE)
            .append_pair("elements", ELEMENTS);
        Ok(url)
    }

    /// Send the request and decode every day in the body.
    async fn get_timeline(&self, url: Url) -> Result<Vec<DailyReading>, NetworkError> {
        tracing::debug!("GET {}", url.path());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            tracing::warn!("Timeline request failed with status {}", status);
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;
        if body.trim().is_empty() {
            return Err(NetworkError::InvalidResponse("empty response body".to_string()));
        }

        let parsed: TimelineResponse = serde_json::from_str(&body)
            .map_err(|e| NetworkError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        parsed
            .days
            .into_iter()
            .filter(|day| {
                let complete = day.has_temperatures();
                if !complete {
                    tracing::debug!("Skipping {} without temperatures", day.datetime);
                }
                complete
            })
            .map(|day| {
                let datetime = day.datetime.clone();
                day.into_reading().ok_or_else(|| {
                    NetworkError::InvalidResponse(format!("unexpected datetime {:?}", datetime))
                })
            })
            .collect()
    }
}

/// First line of an error body, bounded in length.
fn error_message(body: &str) -> Option<String> {
    let line = body.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(line.chars().take(MAX_ERROR_MESSAGE_LEN).collect())
}

#[async_trait]
impl WeatherSource for VisualCrossingClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch_day(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> Result<DailyReading, NetworkError> {
        let url = self.timeline_url(location, &[date])?;
        self.get_timeline(url)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| NetworkError::InvalidResponse("no days in response".to_string()))
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_range(
        &self,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>, NetworkError> {
        let url = self.timeline_url(location, &[start, end])?;
        let days = self.get_timeline(url).await?;
        tracing::info!("Fetched {} days for {}", days.len(), location);
        Ok(days)
    }
}
