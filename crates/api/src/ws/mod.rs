//! Per-job WebSocket observation sessions.

pub mod session;

pub use session::ws_handler;
