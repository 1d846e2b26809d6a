use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};

use tokio::{
    net::TcpListener,
    sync::{
        mpsc,
        oneshot,
    },
    task::JoinHandle,
};
use uuid::Uuid;

use super::{
    connection,
    types::{
        ClientMessage,
        CommandBody,
        ConnectedClient,
        ServerCommand,
    },
};
use crate::{
    core::DuoSyncError,
    page::SnapshotPage,
};

/// Local WebSocket endpoint the browser companion connects to.
///
/// Incoming snapshots update the shared [`SnapshotPage`]; clicks and prompts
/// go back out as commands tagged with a fresh message id.
#[derive(Clone)]
pub struct BridgeServer {
    page: Arc<SnapshotPage>,
    triggers: mpsc::UnboundedSender<()>,
    connected_clients: Arc<Mutex<Vec<ConnectedClient>>>,
    pending_confirmations: Arc<Mutex<HashMap<String, oneshot::Sender<bool>>>>,
}

impl BridgeServer {
    pub fn new(page: Arc<SnapshotPage>, triggers: mpsc::UnboundedSender<()>) -> Self {
        Self {
            page,
            triggers,
            connected_clients: Arc::new(Mutex::new(Vec::new())),
            pending_confirmations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn bind(addr: &str) -> Result<TcpListener, DuoSyncError> {
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| DuoSyncError::Custom(format!("Invalid bridge address {}: {}", addr, e)))?;
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| DuoSyncError::Custom(format!("Failed to bind to address: {}", e)))?;
        log::info!("[WS] Bridge running on ws://{}", addr);
        Ok(listener)
    }

    /// Accept connections until the listener fails.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), DuoSyncError> {
        loop {
            let (stream, addr) = listener.accept().await?;
            log::info!("[WS] New connection from: {}", addr);

            let server = self.clone();
            tokio::spawn(async move {
                if let Err(e) = connection::handle_connection(stream, addr, server).await {
                    log::error!("[WS] Error handling connection from {}: {}", addr, e);
                }
            });
        }
    }

    /// Route clicks made on the page to the browser as `click` commands.
    pub fn forward_clicks(&self) -> JoinHandle<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.page.set_click_sink(tx);

        let server = self.clone();
        tokio::spawn(async move {
            while let Some(path) = rx.recv().await {
                if let Err(e) = server.send_command("click", CommandBody::Click { path }) {
                    log::warn!("[WS] Click not delivered: {}", e);
                }
            }
        })
    }

    pub(crate) fn register(&self, client: ConnectedClient) {
        let mut clients = self.connected_clients.lock().unwrap();
        clients.push(client);
        log::info!("[WS] Client registered. Total clients: {}", clients.len());
    }

    /// Drop closed or stalled clients; returns how many are left.
    pub(crate) fn prune_clients(&self) -> usize {
        let mut clients = self.connected_clients.lock().unwrap();
        let initial_count = clients.len();
        clients.retain(ConnectedClient::is_valid);

        let removed = initial_count - clients.len();
        if removed > 0 {
            log::debug!("[WS] Removed {} invalid clients", removed);
        }
        clients.len()
    }

    fn client_senders(&self) -> Vec<mpsc::Sender<String>> {
        let clients = self.connected_clients.lock().unwrap();
        clients.iter().filter(|c| c.is_valid()).map(|c| c.tx.clone()).collect()
    }

    pub fn has_clients(&self) -> bool {
        self.prune_clients() > 0
    }

    /// Handle one text frame. Returns the reply to send back, if any.
    pub(crate) fn handle_message(&self, message: &str) -> Option<String> {
        if message == "PING" {
            return Some("PONG".to_string());
        }

        match serde_json::from_str::<ClientMessage>(message) {
            Ok(ClientMessage::Snapshot { html }) => {
                log::debug!("[WS] Snapshot received ({} bytes)", html.len());
                self.page.replace(html);
            }
            Ok(ClientMessage::Trigger) => {
                log::info!("[WS] Manual trigger received");
                if self.triggers.send(()).is_err() {
                    log::warn!("[WS] Session is not listening for triggers");
                }
            }
            Ok(ClientMessage::Response { message_id, confirmed }) => {
                self.resolve_confirmation(&message_id, confirmed);
            }
            Err(e) => {
                log::debug!("[WS] Ignoring message that is not a valid client message: {}", e);
            }
        }
        None
    }

    fn resolve_confirmation(&self, message_id: &str, confirmed: bool) {
        let pending = self.pending_confirmations.lock().unwrap().remove(message_id);
        match pending {
            Some(sender) => {
                log::debug!("[WS] Confirmation {} answered: {}", message_id, confirmed);
                let _ = sender.send(confirmed);
            }
            None => log::debug!("[WS] No pending confirmation for message ID: {}", message_id),
        }
    }

    /// Send a command to every client and return its message id.
    pub(crate) fn send_command(
        &self,
        command: &'static str,
        body: CommandBody,
    ) -> Result<String, DuoSyncError> {
        let message_id = Uuid::new_v4().to_string();
        let json = serde_json::to_string(&ServerCommand {
            command,
            message_id: message_id.clone(),
            body,
        })?;

        let senders = self.client_senders();
        if senders.is_empty() {
            return Err(DuoSyncError::WebSocketSend(format!(
                "no clients connected for {}",
                command
            )));
        }

        for (index, sender) in senders.iter().enumerate() {
            if let Err(e) = sender.try_send(json.clone()) {
                log::warn!("[WS] Failed to send {} to client #{}: {}", command, index + 1, e);
            }
        }
        log::debug!("[WS] Sent {} ({}) to {} clients", command, message_id, senders.len());
        Ok(message_id)
    }

    pub fn notify(&self, text: &str) -> Result<(), DuoSyncError> {
        self.send_command("notify", CommandBody::Text { text: text.to_string() }).map(|_| ())
    }

    /// Ask the browser a yes/no question. Anything but an explicit yes within
    /// `timeout` counts as no.
    pub async fn confirm(&self, text: &str, timeout: Duration) -> bool {
        let (tx, rx) = oneshot::channel();
        let message_id = Uuid::new_v4().to_string();
        let json = match serde_json::to_string(&ServerCommand {
            command: "confirm",
            message_id: message_id.clone(),
            body: CommandBody::Text { text: text.to_string() },
        }) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("[WS] Failed to encode confirm: {}", e);
                return false;
            }
        };

        let senders = self.client_senders();
        if senders.is_empty() {
            log::info!("[WS] No clients connected, treating confirm as declined");
            return false;
        }

        self.pending_confirmations.lock().unwrap().insert(message_id.clone(), tx);
        for sender in &senders {
            if let Err(e) = sender.send(json.clone()).await {
                log::warn!("[WS] Failed to send confirm: {}", e);
            }
        }

        let answer = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(confirmed)) => confirmed,
            Ok(Err(_)) => false,
            Err(_) => {
                log::info!("[WS] Confirm {} timed out", message_id);
                false
            }
        };
        self.pending_confirmations.lock().unwrap().remove(&message_id);
        answer
    }
}
