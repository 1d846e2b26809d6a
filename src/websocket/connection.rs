use std::net::SocketAddr;

use futures_util::{
    SinkExt,
    StreamExt,
};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;

use super::{
    server::BridgeServer,
    types::ConnectedClient,
};
use crate::core::DuoSyncError;

pub async fn handle_connection(
    stream: tokio::net::TcpStream,
    addr: SocketAddr,
    server: BridgeServer,
) -> Result<(), DuoSyncError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;

    log::info!("[WS] WebSocket connection established with: {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (tx, mut rx) = mpsc::channel::<String>(32);
    server.register(ConnectedClient { tx: tx.clone() });

    let forward_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::text(msg)).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(message)) => {
                if let Some(reply) = server.handle_message(message.as_str()) {
                    if let Err(e) = tx.send(reply).await {
                        log::error!("[WS] Failed to reply to {}: {}", addr, e);
                    }
                }
            }
            Ok(Message::Close(_)) => {
                log::info!("[WS] Client {} disconnected", addr);
                break;
            }
            Err(e) => {
                log::error!("[WS] Error from client {}: {}", addr, e);
                break;
            }
            _ => {}
        }
    }

    forward_task.abort();
    let _ = forward_task.await;
    drop(tx);

    let remaining = server.prune_clients();
    log::info!("[WS] Client {} gone. Total clients remaining: {}", addr, remaining);

    Ok(())
}
