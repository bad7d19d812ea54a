//! Call Bridge API Library Crate
//!
//! Everything the call bridge service needs besides the protocol state machine:
//! configuration, the HTTP handlers and router, the websocket bridge runtime and
//! the clients for the two upstream providers. The `api` binary is a thin
//! wrapper around this library.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod twilio;
pub mod twiml;
pub mod ws;
