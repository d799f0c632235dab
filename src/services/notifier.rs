use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Events the group services announce to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Sent to every admin when a new application arrives
    ApplicationSubmitted {
        recipients: Vec<Uuid>,
        group_id: Uuid,
        group_name: String,
        application_id: Uuid,
        applicant_id: Uuid,
    },
    ApplicationApproved {
        recipient: Uuid,
        group_id: Uuid,
        group_name: String,
    },
    EmailInvitation {
        email: String,
        group_id: Uuid,
        group_name: String,
        link: String,
        message: Option<String>,
    },
    UserInvited {
        recipient: Uuid,
        group_id: Uuid,
        group_name: String,
        link: String,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ApplicationSubmitted { .. } => "usergroups_application",
            Notification::ApplicationApproved { .. } => "usergroups_application_approved",
            Notification::EmailInvitation { .. } => "usergroups_email_invitation",
            Notification::UserInvited { .. } => "usergroups_invitation",
        }
    }
}

/// Fire-and-forget notification dispatch. Delivery failures never reach the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification);
}

/// Drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, _notification: Notification) {}
}

/// Emits notifications as structured log events
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) {
        match serde_json::to_string(&notification) {
            Ok(payload) => info!(kind = notification.kind(), %payload, "notification"),
            Err(e) => warn!("Failed to serialize notification: {}", e),
        }
    }
}

/// POSTs each notification as JSON to a webhook on a background task
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: Notification) {
        let client = self.client.clone();
        let url = self.url.clone();

        tokio::spawn(async move {
            let kind = notification.kind();
            match client.post(&url).json(&notification).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(kind, "Notification delivered to webhook");
                }
                Ok(response) => {
                    warn!(kind, status = %response.status(), "Webhook rejected notification");
                }
                Err(e) => {
                    warn!(kind, "Failed to deliver notification: {}", e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_json_shape() {
        let n = Notification::ApplicationApproved {
            recipient: Uuid::nil(),
            group_id: Uuid::nil(),
            group_name: "Readers".to_string(),
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "application_approved");
        assert_eq!(value["group_name"], "Readers");
        assert_eq!(n.kind(), "usergroups_application_approved");
    }
}
