//! Daily weather client for the mining site.
//!
//! Issues a single GET to the configured forecast endpoint (Open-Meteo by
//! default) for an inclusive date range and decodes the parallel daily
//! series. The call is best-effort: any network, HTTP, or payload failure is
//! logged and degrades to an empty result, so the pipeline continues with
//! zero rainfall instead of aborting. A length mismatch between the parallel
//! series likewise yields an empty result rather than misaligned data.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::config::WeatherConfig;
use crate::models::WeatherRecord;

// ---

/// HTTP client for the daily weather series.
pub struct WeatherClient {
    // ---
    http: reqwest::Client,
    cfg: WeatherConfig,
}

/// Expected response shape: `{"daily": {"time": [...], ...}}` with three
/// parallel arrays. Missing pieces decode as empty rather than failing.
#[derive(Debug, Default, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    daily: DailySeries,
}

#[derive(Debug, Default, Deserialize)]
struct DailySeries {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

// ---

impl WeatherClient {
    /// Build a client with the configured request timeout.
    pub fn new(cfg: WeatherConfig) -> Result<Self> {
        // ---
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(cfg.timeout_secs)))
            .build()
            .context("failed to build weather HTTP client")?;

        Ok(Self { http, cfg })
    }

    /// Fetch one [`WeatherRecord`] per day in `[start, end]` (inclusive).
    ///
    /// Never fails: on any error the failure is logged and an empty vec is
    /// returned, leaving the run to proceed without rainfall data.
    pub async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<WeatherRecord> {
        // ---
        match self.try_fetch(start, end).await {
            Ok(records) => {
                tracing::info!("Fetched {} weather records", records.len());
                records
            }
            Err(e) => {
                tracing::error!(
                    "Weather fetch failed, continuing without rainfall data: {e:#}"
                );
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<WeatherRecord>> {
        // ---
        tracing::debug!(
            "Requesting weather for {start}..={end} from {}",
            self.cfg.api_url
        );

        let response = self
            .http
            .get(&self.cfg.api_url)
            .query(&[
                ("latitude", self.cfg.latitude.to_string()),
                ("longitude", self.cfg.longitude.to_string()),
                (
                    "daily",
                    "temperature_2m_mean,precipitation_sum".to_string(),
                ),
                ("timezone", self.cfg.timezone.clone()),
                ("start_date", start.format("%Y-%m-%d").to_string()),
                ("end_date", end.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ForecastResponse = response.json().await?;
        records_from_daily(body.daily)
    }
}

/// Turn the parallel daily series into aligned [`WeatherRecord`]s.
///
/// Days with an unparsable date or a null observation are dropped; a length
/// mismatch between the three series is an error (the caller degrades it to
/// an empty set).
fn records_from_daily(daily: DailySeries) -> Result<Vec<WeatherRecord>> {
    // ---
    let n = daily.time.len();
    if daily.temperature_2m_mean.len() != n || daily.precipitation_sum.len() != n {
        bail!(
            "mismatched weather series lengths: {} dates, {} temperatures, {} precipitation sums",
            n,
            daily.temperature_2m_mean.len(),
            daily.precipitation_sum.len()
        );
    }

    let mut records = Vec::with_capacity(n);
    for ((raw_date, temperature), precipitation) in daily
        .time
        .iter()
        .zip(daily.temperature_2m_mean)
        .zip(daily.precipitation_sum)
    {
        let Ok(date) = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") else {
            tracing::debug!("Dropping weather day with bad date: {raw_date}");
            continue;
        };
        let (Some(temperature_mean), Some(precipitation_sum)) = (temperature, precipitation)
        else {
            tracing::debug!("Dropping weather day {raw_date} with null observation");
            continue;
        };

        records.push(WeatherRecord {
            date,
            temperature_mean,
            precipitation_sum,
        });
    }

    Ok(records)
}
