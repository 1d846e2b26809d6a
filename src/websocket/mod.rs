pub mod connection;
pub mod notifier;
pub mod server;
pub mod types;

pub use notifier::BridgeNotifier;
pub use server::BridgeServer;
