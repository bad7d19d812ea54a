//! Shared Application State
//!
//! Holds the resources every handler and call needs: configuration, the call
//! registry and the connectors to the two upstream providers.

use crate::{
    config::Config,
    twilio::TwilioClient,
    ws::{provider::AgentConnector, registry::CallRegistry},
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: CallRegistry,
    pub connector: Arc<dyn AgentConnector>,
    /// Present only when telephony REST credentials are configured.
    pub twilio: Option<Arc<TwilioClient>>,
}
