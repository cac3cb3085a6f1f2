//! API client for the clist.by contest listing service.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use tracing::{debug, warn};

use crate::cache::ContestFetcher;
use crate::models::{ContestsResponse, RawContest, UserSettings};
use crate::utils::iso_no_ms;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the contest listing endpoint
const API_BASE_URL: &str = "https://clist.by/api/v4/contest/";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Number of days to look back for contest starts.
/// Long-running contests that started weeks ago must still appear while
/// they are ongoing; 32 days covers the longest known marathons.
const START_LOOKBACK_DAYS: i64 = 32;

/// Maximum number of contests per request.
const PAGE_LIMIT: u32 = 1000;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for clist.by.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch contests that end after `now`, ordered by start time.
    ///
    /// Empty credentials short-circuit with `MissingCredentials` before any
    /// network access.
    pub async fn fetch_contests(
        &self,
        settings: &UserSettings,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawContest>, ApiError> {
        let username = settings.clist_username.trim();
        let api_key = settings.clist_api_key.trim();
        if username.is_empty() || api_key.is_empty() {
            return Err(ApiError::MissingCredentials);
        }

        let query = contest_query(username, api_key, now);

        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(API_BASE_URL)
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let parsed: ContestsResponse = response.json().await?;
                debug!(count = parsed.objects.len(), "Contests response received");
                return Ok(parsed.objects);
            }

            if status.as_u16() == 429 {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited);
                }
                warn!(retry = retries, backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2; // Exponential backoff
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
    }
}

#[async_trait]
impl ContestFetcher for ApiClient {
    async fn fetch_contests(
        &self,
        settings: &UserSettings,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawContest>, ApiError> {
        ApiClient::fetch_contests(self, settings, now).await
    }
}

/// Query parameters for the contest endpoint: still-running or upcoming
/// contests (`end__gt = now`) whose start is no older than the lookback
/// window, start-ascending so the projection never has to reorder.
fn contest_query(username: &str, api_key: &str, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    let lookback = now - chrono::Duration::days(START_LOOKBACK_DAYS);
    let start_from = lookback
        .with_time(NaiveTime::MIN)
        .earliest()
        .unwrap_or(lookback);

    vec![
        ("username", username.to_string()),
        ("api_key", api_key.to_string()),
        ("format", "json".to_string()),
        ("order_by", "start".to_string()),
        ("limit", PAGE_LIMIT.to_string()),
        ("end__gt", iso_no_ms(now)),
        ("start__gt", iso_no_ms(start_from)),
    ]
}
