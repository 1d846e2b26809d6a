use std::time::Duration;

use async_trait::async_trait;

use super::server::BridgeServer;
use crate::session::Notifier;

/// Shows results as browser prompts through the bridge.
pub struct BridgeNotifier {
    server: BridgeServer,
    confirm_timeout: Duration,
}

impl BridgeNotifier {
    pub fn new(server: BridgeServer, confirm_timeout: Duration) -> Self {
        Self { server, confirm_timeout }
    }
}

#[async_trait]
impl Notifier for BridgeNotifier {
    async fn notice(&self, message: &str) {
        if let Err(e) = self.server.notify(message) {
            // keep the export visible somewhere
            log::warn!("[WS] Notice not delivered ({}):\n{}", e, message);
        }
    }

    async fn confirm(&self, message: &str) -> bool {
        self.server.confirm(message, self.confirm_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        page::SnapshotPage,
        websocket::types::ConnectedClient,
    };

    #[tokio::test]
    async fn test_notice_reaches_connected_client() {
        let (triggers, _rx) = mpsc::unbounded_channel();
        let server = BridgeServer::new(Arc::new(SnapshotPage::empty()), triggers);
        let (tx, mut client) = mpsc::channel(32);
        server.register(ConnectedClient { tx });

        let notifier = BridgeNotifier::new(server, Duration::from_secs(1));
        notifier.notice("2 sentences were synced").await;

        let sent: serde_json::Value = serde_json::from_str(&client.recv().await.unwrap()).unwrap();
        assert_eq!(sent["command"], "notify");
        assert_eq!(sent["body"]["text"], "2 sentences were synced");
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_without_clients_declines() {
        let (triggers, _rx) = mpsc::unbounded_channel();
        let server = BridgeServer::new(Arc::new(SnapshotPage::empty()), triggers);
        let notifier = BridgeNotifier::new(server, Duration::from_secs(1));
        assert!(!notifier.confirm("Continue to the skill tree?").await);
    }
}
