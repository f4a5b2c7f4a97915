pub mod discord;
pub mod noop;

use async_trait::async_trait;

use wikirelay_common::types::NotificationPayload;

/// Pluggable delivery backend for formatted notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification to a destination channel.
    async fn send(&self, destination: &str, payload: &NotificationPayload) -> anyhow::Result<()>;
}

pub use discord::DiscordApi;
pub use noop::NoopNotifier;
