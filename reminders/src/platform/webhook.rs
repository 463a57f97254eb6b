//! Webhook notification platform.
//!
//! Delivers each reminder as a JSON `POST` to a configured URL, so reminders
//! can be relayed to a phone push service or a chat channel. Delivery happens
//! on a background task; `show` returns as soon as the request is queued.
//!
//! # Payload
//!
//! ```json
//! {
//!   "id": "6f1c...",
//!   "deviceId": "laptop",
//!   "title": "HealthyHabits Reminder 🌿",
//!   "body": "💧 Time to Drink Water! Stay hydrated.",
//!   "tag": "habit-h1",
//!   "requireInteraction": false,
//!   "sentAt": "2026-03-10T08:30:00Z"
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    NotificationHandle, NotificationPlatform, NotificationRequest, PermissionState, PlatformError,
};

/// HTTP request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// JSON body posted for each reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Unique delivery identifier.
    pub id: Uuid,
    /// Device the reminder originated from.
    pub device_id: String,
    pub title: String,
    pub body: String,
    pub tag: String,
    pub require_interaction: bool,
    pub sent_at: DateTime<Utc>,
}

impl WebhookPayload {
    /// Builds the payload for a notification request.
    #[must_use]
    pub fn from_request(device_id: &str, request: &NotificationRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            device_id: device_id.to_string(),
            title: request.title.clone(),
            body: request.body.clone(),
            tag: request.tag.clone(),
            require_interaction: request.require_interaction,
            sent_at: Utc::now(),
        }
    }
}

/// Posts reminders to an HTTP endpoint. Permission is always granted.
#[derive(Debug, Clone)]
pub struct WebhookPlatform {
    url: String,
    device_id: String,
    client: Client,
}

impl WebhookPlatform {
    /// Creates a webhook platform posting to `url`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Delivery` if the HTTP client cannot be built.
    pub fn new(url: String, device_id: String) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| PlatformError::Delivery(e.to_string()))?;

        Ok(Self {
            url,
            device_id,
            client,
        })
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts a payload and waits for the response.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Delivery` on transport failure or a non-2xx status.
    pub async fn deliver(&self, payload: &WebhookPayload) -> Result<(), PlatformError> {
        post_payload(&self.client, &self.url, payload).await
    }
}

async fn post_payload(
    client: &Client,
    url: &str,
    payload: &WebhookPayload,
) -> Result<(), PlatformError> {
    debug!(url = %url, tag = %payload.tag, "Posting reminder webhook");

    let response = client
        .post(url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .json(payload)
        .send()
        .await
        .map_err(|e| PlatformError::Delivery(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        info!(tag = %payload.tag, "Reminder webhook delivered");
        return Ok(());
    }

    let message = response.text().await.unwrap_or_default();
    Err(PlatformError::Delivery(format!(
        "webhook returned {}: {message}",
        status.as_u16()
    )))
}

impl NotificationPlatform for WebhookPlatform {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn request_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn show(
        &self,
        request: NotificationRequest,
    ) -> Result<Arc<dyn NotificationHandle>, PlatformError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| PlatformError::Delivery("no async runtime available".to_string()))?;

        let payload = WebhookPayload::from_request(&self.device_id, &request);
        let client = self.client.clone();
        let url = self.url.clone();
        runtime.spawn(async move {
            if let Err(e) = post_payload(&client, &url, &payload).await {
                warn!(tag = %payload.tag, error = %e, "Reminder webhook failed");
            }
        });

        Ok(Arc::new(WebhookNotification {
            tag: request.tag,
            open: AtomicBool::new(true),
        }))
    }
}

/// A reminder handed to the webhook. Closing only updates local state.
#[derive(Debug)]
struct WebhookNotification {
    tag: String,
    open: AtomicBool,
}

impl NotificationHandle for WebhookNotification {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> NotificationRequest {
        NotificationRequest {
            title: "HealthyHabits Reminder 🌿".to_string(),
            body: "💧 Time to Drink Water! Stay hydrated.".to_string(),
            tag: "habit-h1".to_string(),
            require_interaction: false,
            on_click: None,
        }
    }

    #[test]
    fn payload_serializes_camel_case() {
        let payload = WebhookPayload::from_request("laptop", &request());
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["deviceId"], "laptop");
        assert_eq!(value["tag"], "habit-h1");
        assert_eq!(value["requireInteraction"], false);
        assert!(value.get("sentAt").is_some());
    }

    #[tokio::test]
    async fn deliver_posts_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/reminders"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "deviceId": "laptop",
                "tag": "habit-h1",
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let platform =
            WebhookPlatform::new(format!("{}/hooks/reminders", server.uri()), "laptop".into())
                .unwrap();
        let payload = WebhookPayload::from_request("laptop", &request());

        platform.deliver(&payload).await.unwrap();
    }

    #[tokio::test]
    async fn deliver_reports_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let platform = WebhookPlatform::new(server.uri(), "laptop".into()).unwrap();
        let payload = WebhookPayload::from_request("laptop", &request());

        let err = platform.deliver(&payload).await.unwrap_err();
        assert!(err.to_string().contains("500"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn show_returns_open_handle_and_posts_in_background() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let platform = WebhookPlatform::new(server.uri(), "laptop".into()).unwrap();
        let handle = platform.show(request()).unwrap();
        assert!(handle.is_open());
        assert_eq!(handle.tag(), "habit-h1");

        let mut delivered = false;
        for _ in 0..50 {
            if !server.received_requests().await.unwrap_or_default().is_empty() {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(delivered, "webhook was never posted");
    }

    #[test]
    fn show_without_runtime_fails() {
        let platform = WebhookPlatform::new("http://localhost:9".into(), "laptop".into()).unwrap();
        assert!(matches!(
            platform.show(request()),
            Err(PlatformError::Delivery(_))
        ));
    }
}
