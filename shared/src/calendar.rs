//! Google Calendar events fetch.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{Error, Result};

/// Earliest event start included in the published feed.
pub const TIME_MIN: &str = "2025-01-01T00:00:00Z";

/// Upper bound on returned events; no pagination beyond this.
pub const MAX_RESULTS: u32 = 2500;

/// Source of calendar events.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Fetch the events of `calendar_id` as raw JSON.
    async fn fetch_events(&self, calendar_id: &str, api_key: &str) -> Result<serde_json::Value>;
}

/// Google Calendar v3 client authenticated by API key.
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(http_client: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http_client,
            api_base: api_base.into(),
        }
    }

    /// Events endpoint for a calendar.
    pub fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        )
    }
}

/// Fixed query for the events listing, excluding the API key.
pub fn events_query() -> [(&'static str, String); 4] {
    [
        ("singleEvents", "true".to_string()),
        ("orderBy", "startTime".to_string()),
        ("timeMin", TIME_MIN.to_string()),
        ("maxResults", MAX_RESULTS.to_string()),
    ]
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    async fn fetch_events(&self, calendar_id: &str, api_key: &str) -> Result<serde_json::Value> {
        let url = self.events_url(calendar_id);
        debug!("Fetching calendar events from {}", url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("key", api_key)])
            .query(&events_query())
            .send()
            .await
            .map_err(|e| Error::CalendarFetch(format!("Calendar API request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::CalendarFetch(format!(
                "Calendar API returned {}: {}",
                status, error_text
            )));
        }

        let events: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::CalendarFetch(format!("Failed to parse calendar response: {}", e.without_url())))?;

        let count = events
            .get("items")
            .and_then(|items| items.as_array())
            .map(Vec::len)
            .unwrap_or(0);
        info!("Fetched {} calendar events", count);

        Ok(events)
    }
}
