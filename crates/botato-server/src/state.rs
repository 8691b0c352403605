//! Application State

use std::sync::Arc;

use botato_core::{InferenceClient, SessionManager};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Conversation front door
    pub sessions: Arc<SessionManager>,

    /// Inference client, for health reporting
    pub inference: Arc<dyn InferenceClient>,
}

impl AppState {
    pub fn new(sessions: SessionManager) -> Self {
        let inference = sessions.agent().inference().clone();
        Self {
            sessions: Arc::new(sessions),
            inference,
        }
    }
}
