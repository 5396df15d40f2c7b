//! Outbound user notifications.
//!
//! Delivery is fire-and-forget: the lifecycle manager spawns the send after
//! its transaction commits and only logs failures.
use async_trait::async_trait;
use tracing::info;

/// Email event handed to the delivery collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailNotification {
    pub email: String,
    pub name: String,
    pub title: String,
    pub body: String,
}

impl EmailNotification {
    /// Welcome message sent once a credential is registered
    pub fn welcome(email: &str) -> Self {
        let name = email.split('@').next().unwrap_or(email).to_string();
        Self {
            email: email.to_string(),
            title: "Welcome".to_string(),
            body: format!("Hi {name}, your account has been created."),
            name,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: EmailNotification) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: EmailNotification) -> anyhow::Result<()> {
        info!(
            email = %notification.email,
            title = %notification.title,
            "notification queued"
        );
        Ok(())
    }
}

/// Drops every notification
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: EmailNotification) -> anyhow::Result<()> {
        Ok(())
    }
}
