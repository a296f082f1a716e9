//! Real-time todo list sync over a WebSocket.
//!
//! [`client::TodoSyncClient`] keeps a local copy of the todo list, replaces it
//! with every snapshot the host pushes, renders it, and sends the whole list
//! back whenever a todo is toggled. It reconnects forever, one second apart.
//! [`adapters::TodoHost`] is a minimal host speaking the same protocol.

pub mod adapters;
pub mod client;
pub mod core;
pub mod render;
pub mod storage;
pub mod transport;
