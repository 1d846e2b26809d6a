pub mod anki;
pub mod core;
pub mod export;
pub mod extract;
pub mod page;
pub mod persistence;
pub mod session;
pub mod watch;
pub mod websocket;
