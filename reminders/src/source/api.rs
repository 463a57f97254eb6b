//! Backend API habit source.
//!
//! Polls `GET {api_url}/habits` with a Bearer token and publishes the decoded
//! list. Failed refreshes keep the previous list; a rejected token is logged
//! as an error on every attempt until it is fixed.

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::{parse_habits, publish, SourceError, SourceHandle};
use crate::types::HabitReminder;

/// HTTP request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default time between refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Habit source backed by the HealthyHabits REST API.
#[derive(Debug, Clone)]
pub struct ApiSource {
    habits_url: String,
    token: String,
    refresh_interval: Duration,
    client: Client,
}

impl ApiSource {
    /// Creates a source for the API rooted at `api_url` (e.g. `https://host/api`).
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Http` if the HTTP client cannot be built.
    pub fn new(
        api_url: &str,
        token: String,
        refresh_interval: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            habits_url: format!("{}/habits", api_url.trim_end_matches('/')),
            token,
            refresh_interval,
            client,
        })
    }

    /// The full URL polled for habits.
    #[must_use]
    pub fn habits_url(&self) -> &str {
        &self.habits_url
    }

    /// Fetches the current habit list once.
    ///
    /// # Errors
    ///
    /// - `SourceError::AuthFailed` on 401
    /// - `SourceError::ServerError` on any other non-2xx status
    /// - `SourceError::Http` on transport failure
    /// - `SourceError::Json` if the body is not a JSON array
    pub async fn fetch(&self) -> Result<Vec<HabitReminder>, SourceError> {
        debug!(url = %self.habits_url, "Fetching habits");

        let response = self
            .client
            .get(&self.habits_url)
            .bearer_auth(&self.token)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let status = response.status();
        match status {
            _ if status.is_success() => {
                let body = response.text().await?;
                parse_habits(&body)
            }
            StatusCode::UNAUTHORIZED => Err(SourceError::AuthFailed),
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(SourceError::ServerError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Polls the API in the background, publishing each new list into `tx`.
    ///
    /// The first fetch happens immediately. The task ends when every receiver
    /// of `tx` has been dropped or the returned handle is dropped.
    pub fn spawn(self, tx: watch::Sender<Vec<HabitReminder>>) -> SourceHandle {
        let task = tokio::spawn(async move {
            let mut refresh = time::interval(self.refresh_interval);
            refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                url = %self.habits_url,
                refresh_secs = self.refresh_interval.as_secs(),
                "Polling habits from API"
            );

            loop {
                tokio::select! {
                    () = tx.closed() => {
                        debug!("No habit receivers left, stopping API polling");
                        break;
                    }
                    _ = refresh.tick() => self.refresh(&tx).await,
                }
            }
        });

        SourceHandle::new(task, None)
    }

    async fn refresh(&self, tx: &watch::Sender<Vec<HabitReminder>>) {
        match self.fetch().await {
            Ok(habits) => {
                let count = habits.len();
                if publish(tx, habits) {
                    info!(habits = count, "Habit list refreshed");
                }
            }
            Err(SourceError::AuthFailed) => {
                error!("API token rejected; keeping last known habits");
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh habits; keeping last known habits");
            }
        }
    }
}
