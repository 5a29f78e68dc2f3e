//! In-process broker.
//!
//! Queue contents live behind a shared handle, so a clone kept by the caller
//! sees everything published through the clone handed to the pipeline.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::Publisher;
use crate::error::ConnectionError;

#[derive(Debug, Default)]
struct QueueState {
    durable: bool,
    messages: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
struct BrokerState {
    queues: BTreeMap<String, QueueState>,
    unroutable: u64,
    published: u64,
    close_calls: u64,
    closed: bool,
    unreachable: bool,
    fail_after: Option<u64>,
}

/// A broker that keeps durable queues in memory.
///
/// Publishing to a queue that was never declared drops the message, as the
/// default exchange does on a real broker.
#[derive(Debug, Clone)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
    description: String,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            description: "memory broker".to_string(),
        }
    }

    /// Every operation fails as if the broker could not be reached.
    pub fn unreachable() -> Self {
        let broker = Self::new();
        broker.lock().unreachable = true;
        broker
    }

    /// Let `n` publishes through, then fail every later one.
    pub fn fail_after(self, n: u64) -> Self {
        self.lock().fail_after = Some(n);
        self
    }

    /// Put a message on a queue, declaring it if needed.
    pub fn seed(&self, queue: &str, payload: &[u8]) {
        self.lock()
            .queues
            .entry(queue.to_string())
            .or_insert_with(|| QueueState {
                durable: true,
                messages: Vec::new(),
            })
            .messages
            .push(payload.to_vec());
    }

    /// Messages currently held by `queue`, as text.
    pub fn messages(&self, queue: &str) -> Vec<String> {
        self.lock()
            .queues
            .get(queue)
            .map(|q| {
                q.messages
                    .iter()
                    .map(|m| String::from_utf8_lossy(m).into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Declared queues with their message counts.
    pub fn queue_depths(&self) -> BTreeMap<String, usize> {
        self.lock()
            .queues
            .iter()
            .map(|(name, q)| (name.clone(), q.messages.len()))
            .collect()
    }

    pub fn is_declared(&self, queue: &str) -> bool {
        self.lock().queues.contains_key(queue)
    }

    pub fn is_durable(&self, queue: &str) -> bool {
        self.lock().queues.get(queue).is_some_and(|q| q.durable)
    }

    /// Total messages accepted across all queues.
    pub fn published(&self) -> u64 {
        self.lock().published
    }

    /// Messages dropped because their queue was not declared.
    pub fn unroutable(&self) -> u64 {
        self.lock().unroutable
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn close_calls(&self) -> u64 {
        self.lock().close_calls
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        // a poisoned lock only means a test panicked mid-update
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_open(state: &BrokerState) -> Result<(), ConnectionError> {
        if state.unreachable {
            return Err(ConnectionError::Connect {
                url: "memory://".to_string(),
                reason: "broker unreachable".to_string(),
            });
        }
        if state.closed {
            return Err(ConnectionError::Channel("connection closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for MemoryBroker {
    async fn reset_queue(&mut self, queue: &str) -> Result<(), ConnectionError> {
        let mut state = self.lock();
        Self::check_open(&state)?;
        state.queues.remove(queue);
        state.queues.insert(
            queue.to_string(),
            QueueState {
                durable: true,
                messages: Vec::new(),
            },
        );
        Ok(())
    }

    async fn publish(&mut self, queue: &str, payload: &[u8]) -> Result<(), ConnectionError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        Self::check_open(state)?;
        if state.fail_after.is_some_and(|n| state.published >= n) {
            return Err(ConnectionError::Publish {
                queue: queue.to_string(),
                reason: "connection reset by peer".to_string(),
            });
        }

        match state.queues.get_mut(queue) {
            Some(q) => {
                q.messages.push(payload.to_vec());
                state.published += 1;
                debug!(
                    "[x] Sent {} on {}",
                    String::from_utf8_lossy(payload),
                    queue
                );
            }
            None => state.unroutable += 1,
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        let mut state = self.lock();
        state.close_calls += 1;
        state.closed = true;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_clears_stale_messages() {
        let mut broker = MemoryBroker::new();
        broker.seed("01-smoker", b"old, 1.0");
        broker.seed("01-smoker", b"old, 2.0");
        assert_eq!(broker.messages("01-smoker").len(), 2);

        broker.reset_queue("01-smoker").await.unwrap();
        assert!(broker.messages("01-smoker").is_empty());
        assert!(broker.is_durable("01-smoker"));
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let mut broker = MemoryBroker::new();
        broker.reset_queue("02-food-A").await.unwrap();
        let once = broker.queue_depths();
        broker.reset_queue("02-food-A").await.unwrap();
        assert_eq!(broker.queue_depths(), once);
        assert!(broker.is_durable("02-food-A"));
    }

    #[tokio::test]
    async fn test_publish_to_undeclared_queue_is_dropped() {
        let mut broker = MemoryBroker::new();
        broker.publish("nowhere", b"t, 1.0").await.unwrap();
        assert_eq!(broker.published(), 0);
        assert_eq!(broker.unroutable(), 1);
        assert!(!broker.is_declared("nowhere"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let broker = MemoryBroker::new();
        let mut handle = broker.clone();
        handle.reset_queue("q").await.unwrap();
        handle.publish("q", b"t, 1.0").await.unwrap();
        assert_eq!(broker.messages("q"), vec!["t, 1.0"]);
    }

    #[tokio::test]
    async fn test_unreachable_broker() {
        let mut broker = MemoryBroker::unreachable();
        let err = broker.reset_queue("q").await.unwrap_err();
        assert!(matches!(err, ConnectionError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_fail_after() {
        let mut broker = MemoryBroker::new().fail_after(1);
        broker.reset_queue("q").await.unwrap();
        broker.publish("q", b"a").await.unwrap();
        let err = broker.publish("q", b"b").await.unwrap_err();
        assert!(matches!(err, ConnectionError::Publish { .. }));
        assert_eq!(broker.messages("q"), vec!["a"]);
    }

    #[tokio::test]
    async fn test_closed_broker_rejects_publish() {
        let mut broker = MemoryBroker::new();
        broker.reset_queue("q").await.unwrap();
        broker.close().await.unwrap();
        broker.close().await.unwrap();
        assert!(broker.is_closed());
        assert_eq!(broker.close_calls(), 2);
        assert!(broker.publish("q", b"a").await.is_err());
    }
}
