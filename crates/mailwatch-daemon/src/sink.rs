//! Log-backed delivery target: renders each notification as one info
//! line. Chat adapters implement the same trait against their platform.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use mailwatch_core::{DeliverySink, Notification, TargetId};

pub(crate) struct LogSink;

#[async_trait]
impl DeliverySink for LogSink {
    async fn deliver(&self, target: &TargetId, notification: &Notification) -> Result<()> {
        let received = notification
            .received_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            target = %target,
            user = %notification.account_user,
            received = %received,
            subject = %notification.subject,
            body = %notification.body_excerpt,
            "new mail notification"
        );
        Ok(())
    }
}
