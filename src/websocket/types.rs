use serde::{
    Deserialize,
    Serialize,
};
use tokio::sync::mpsc;

use crate::page::ElementPath;

/// Messages the browser companion sends.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum ClientMessage {
    /// Serialized document after a mutation.
    Snapshot { html: String },
    /// The user pressed the manual-trigger shortcut.
    Trigger,
    /// Answer to a `confirm` command.
    Response {
        #[serde(rename = "messageId")]
        message_id: String,
        confirmed: bool,
    },
}

#[derive(Debug, Serialize)]
pub(crate) struct ServerCommand {
    pub command: &'static str,
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub body: CommandBody,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum CommandBody {
    Click { path: ElementPath },
    Text { text: String },
}

#[derive(Clone)]
pub struct ConnectedClient {
    pub tx: mpsc::Sender<String>,
}

impl ConnectedClient {
    pub fn is_valid(&self) -> bool {
        !self.tx.is_closed() && self.tx.capacity() > 0
    }
}
