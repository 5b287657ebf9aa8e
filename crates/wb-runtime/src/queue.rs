//! The work-queue boundary.
//!
//! Workers in queue mode pull waterbody uids one message at a time. The
//! queue provides at-least-once delivery; redelivery of unacknowledged
//! messages is its own policy (visibility timeout, max receive count,
//! dead-letter routing), never the consumer's. Engine idempotence plus
//! disjoint per-uid output paths make duplicate delivery safe.

use std::collections::VecDeque;

use async_trait::async_trait;
use orion_error::prelude::*;
use tokio::sync::Mutex;

use crate::error::{RuntimeReason, RuntimeResult};

// ---------------------------------------------------------------------------
// WorkQueue
// ---------------------------------------------------------------------------

/// One delivered unit of work. The body is a waterbody uid, nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Receipt handle identifying this delivery for acknowledgement.
    pub receipt: String,
    pub body: String,
}

/// Boundary to the message queue distributing waterbody uids.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Pull at most one message. `None` means the queue is drained.
    async fn receive(&self) -> RuntimeResult<Option<QueueMessage>>;

    /// Acknowledge (delete) a delivered message.
    async fn acknowledge(&self, message: &QueueMessage) -> RuntimeResult<()>;
}

// ---------------------------------------------------------------------------
// MemoryQueue
// ---------------------------------------------------------------------------

/// In-process queue for tests and single-host runs. Received messages stay
/// in flight until acknowledged, so a test can assert what a real queue
/// would redeliver.
pub struct MemoryQueue {
    state: Mutex<MemoryQueueState>,
}

struct MemoryQueueState {
    pending: VecDeque<QueueMessage>,
    in_flight: Vec<QueueMessage>,
}

impl MemoryQueue {
    pub fn new<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pending = bodies
            .into_iter()
            .enumerate()
            .map(|(ix, body)| QueueMessage {
                receipt: format!("receipt-{ix}"),
                body: body.into(),
            })
            .collect();
        Self {
            state: Mutex::new(MemoryQueueState {
                pending,
                in_flight: Vec::new(),
            }),
        }
    }

    /// Deliveries that were received but never acknowledged: what a real
    /// queue would make visible again after the visibility timeout.
    pub async fn unacknowledged(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.in_flight.iter().map(|m| m.body.clone()).collect()
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn receive(&self) -> RuntimeResult<Option<QueueMessage>> {
        let mut state = self.state.lock().await;
        let Some(message) = state.pending.pop_front() else {
            return Ok(None);
        };
        state.in_flight.push(message.clone());
        Ok(Some(message))
    }

    async fn acknowledge(&self, message: &QueueMessage) -> RuntimeResult<()> {
        let mut state = self.state.lock().await;
        let Some(ix) = state
            .in_flight
            .iter()
            .position(|m| m.receipt == message.receipt)
        else {
            return StructError::from(RuntimeReason::Queue)
                .with_detail(format!("unknown receipt {:?}", message.receipt))
                .err();
        };
        state.in_flight.swap_remove(ix);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
