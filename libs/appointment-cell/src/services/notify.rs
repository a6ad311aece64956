// libs/appointment-cell/src/services/notify.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;

/// The cross-service notification calls the core is allowed to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    AppointmentCreated,
    Email,
}

/// Best-effort notification dispatch. Implementations must never surface a
/// failure to the caller: a booking succeeds or fails on its own merits, and
/// the notification outcome is logged and forgotten.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, kind: NotificationKind, payload: Value);
}

/// HTTP client for the notifications service. Each dispatch is attempted
/// once with a short timeout; any error is swallowed.
pub struct HttpNotifier {
    client: Client,
    base_url: String,
}

impl HttpNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.notifications_service_url.clone(),
        }
    }

    fn route(kind: NotificationKind) -> (&'static str, Duration) {
        match kind {
            NotificationKind::AppointmentCreated => {
                ("/api/v1/notifications/appointment-created", Duration::from_secs(3))
            }
            NotificationKind::Email => {
                ("/api/v1/notifications/send-email", Duration::from_secs(5))
            }
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, kind: NotificationKind, payload: Value) {
        let (path, timeout) = Self::route(kind);
        let url = format!("{}{}", self.base_url, path);

        match self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("Notification dispatched to {}", url);
            }
            Ok(response) => {
                warn!("Notification endpoint {} returned {}", url, response.status());
            }
            Err(e) => {
                warn!("Notification dispatch to {} failed: {}", url, e);
            }
        }
    }
}
