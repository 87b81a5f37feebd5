//! Mock agent invoker for testing

use crate::abstractions::{AgentDescriptor, AgentInvoker, AgentResult};
use crate::deal::DealContext;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockResponse {
    Success(AgentResult),
    Error(String),
}

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub agent_id: String,
    pub input: String,
    pub context: DealContext,
}

/// Builder for creating configured mock invokers
///
/// Responses are queued per agent id. Each call takes the next queued
/// response; the last one is repeated once the queue is down to one entry.
#[derive(Default)]
pub struct MockAgentInvokerBuilder {
    responses: HashMap<String, VecDeque<MockResponse>>,
    default_text: Option<String>,
    delay: Option<Duration>,
}

impl MockAgentInvokerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_success(self, agent_id: &str, text: &str) -> Self {
        self.with_result(agent_id, AgentResult::new(text))
    }

    pub fn with_result(mut self, agent_id: &str, result: AgentResult) -> Self {
        self.responses
            .entry(agent_id.to_string())
            .or_default()
            .push_back(MockResponse::Success(result));
        self
    }

    pub fn with_error(mut self, agent_id: &str, message: &str) -> Self {
        self.responses
            .entry(agent_id.to_string())
            .or_default()
            .push_back(MockResponse::Error(message.to_string()));
        self
    }

    /// Text returned for agents with no scripted response
    pub fn with_default_text(mut self, text: &str) -> Self {
        self.default_text = Some(text.to_string());
        self
    }

    /// Sleep inside every call, to widen any overlap between calls
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn build(self) -> MockAgentInvoker {
        MockAgentInvoker {
            responses: Mutex::new(self.responses),
            default_text: self.default_text,
            delay: self.delay,
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

/// Scriptable [`AgentInvoker`] that records every call
pub struct MockAgentInvoker {
    responses: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    default_text: Option<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockAgentInvoker {
    pub fn builder() -> MockAgentInvokerBuilder {
        MockAgentInvokerBuilder::new()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Agent ids in invocation order
    pub fn invoked_agents(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .map(|call| call.agent_id.clone())
            .collect()
    }

    pub fn was_invoked(&self, agent_id: &str) -> bool {
        lock(&self.calls).iter().any(|call| call.agent_id == agent_id)
    }

    /// Inputs passed to `agent_id`, in invocation order
    pub fn inputs_for(&self, agent_id: &str) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.agent_id == agent_id)
            .map(|call| call.input.clone())
            .collect()
    }

    /// Largest number of calls that were ever in progress at once
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, agent_id: &str) -> Option<MockResponse> {
        let mut responses = lock(&self.responses);
        let queue = responses.get_mut(agent_id)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl AgentInvoker for MockAgentInvoker {
    async fn invoke(
        &self,
        agent: &AgentDescriptor,
        context: &DealContext,
        input: &str,
    ) -> Result<AgentResult> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        lock(&self.calls).push(RecordedCall {
            agent_id: agent.id.clone(),
            input: input.to_string(),
            context: context.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.next_response(&agent.id) {
            Some(MockResponse::Success(result)) => Ok(result),
            Some(MockResponse::Error(message)) => Err(anyhow!(message)),
            None => match &self.default_text {
                Some(text) => Ok(AgentResult::new(text.clone())),
                None => Err(anyhow!("No mock response for agent '{}'", agent.id)),
            },
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
