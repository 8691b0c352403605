//! Session Management
//!
//! [`SessionManager`] is the entry point an outer surface (HTTP server, CLI, UI)
//! talks to. It hands out thread ids and runs turns, allowing at most one
//! in-flight turn per thread: a second `send` on a busy thread waits its turn.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::message::Message;
use crate::reasoning::Agent;
use crate::thread::ThreadId;
use crate::tool::ToolSchema;

/// Front door for conversations
pub struct SessionManager {
    agent: Agent,
    /// One gate per thread with a turn queued or running; pruned when idle
    turn_gates: Mutex<HashMap<ThreadId, Arc<Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            turn_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Start a new conversation
    pub async fn new_session(&self) -> Result<ThreadId> {
        let id = self.agent.store().create_thread().await?;
        tracing::info!(thread_id = %id, "Starting session");
        Ok(id)
    }

    /// Run one turn and return the assistant's answer
    pub async fn send(&self, thread_id: &ThreadId, text: &str) -> Result<String> {
        let gate = self.turn_gate(thread_id).await?;
        let outcome = {
            let _turn = gate.lock().await;
            self.agent.run_turn(thread_id, text).await
        };
        self.release_gate(thread_id, &gate).await;
        outcome
    }

    /// Copy of a conversation's history
    pub async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Message>> {
        self.agent.store().history(thread_id).await
    }

    /// Tools advertised to the model, in registration order
    pub fn tools(&self) -> Vec<ToolSchema> {
        self.agent.tools().describe()
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Drop the gate once nobody but the map and this caller holds it
    async fn release_gate(&self, thread_id: &ThreadId, gate: &Arc<Mutex<()>>) {
        let mut gates = self.turn_gates.lock().await;
        let ours = gates.get(thread_id).is_some_and(|g| Arc::ptr_eq(g, gate));
        if ours && Arc::strong_count(gate) == 2 {
            gates.remove(thread_id);
        }
    }

    async fn turn_gate(&self, thread_id: &ThreadId) -> Result<Arc<Mutex<()>>> {
        if let Some(gate) = self.turn_gates.lock().await.get(thread_id) {
            return Ok(gate.clone());
        }

        // Only threads the store knows get a gate.
        self.agent.store().history(thread_id).await?;

        let mut gates = self.turn_gates.lock().await;
        Ok(gates
            .entry(thread_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }
}
