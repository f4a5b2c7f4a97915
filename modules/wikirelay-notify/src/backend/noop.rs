use async_trait::async_trait;

use wikirelay_common::types::NotificationPayload;

use super::Notifier;

/// No-op delivery backend for degraded mode and tests.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, _destination: &str, _payload: &NotificationPayload) -> anyhow::Result<()> {
        Ok(())
    }
}
