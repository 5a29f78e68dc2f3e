//! Broker publishing.
//!
//! The [`Publisher`] trait is the seam between the pipeline and the broker:
//! [`AmqpPublisher`] talks AMQP 0-9-1 to a real broker, and [`MemoryBroker`]
//! keeps queues in process for dry runs and tests.

#[cfg(feature = "amqp")]
mod amqp;
mod memory;

#[cfg(feature = "amqp")]
pub use amqp::{AmqpPublisher, BrokerAddress};
pub use memory::MemoryBroker;

use async_trait::async_trait;

use crate::error::ConnectionError;

/// An open broker connection that can reset queues and deliver messages.
///
/// Every method failure is a [`ConnectionError`] and ends the run.
#[async_trait]
pub trait Publisher: Send {
    /// Delete `queue` if present, then declare it durable and empty.
    ///
    /// Calling this twice in a row leaves the same state as calling it once.
    async fn reset_queue(&mut self, queue: &str) -> Result<(), ConnectionError>;

    /// Hand `payload` to the broker on the default exchange, routed by `queue`.
    ///
    /// Returns once the broker publish call has been made; no confirm is
    /// awaited.
    async fn publish(&mut self, queue: &str, payload: &[u8]) -> Result<(), ConnectionError>;

    /// Release the connection. Safe to call more than once.
    async fn close(&mut self) -> Result<(), ConnectionError>;

    /// Returns a human-readable description of the broker.
    fn description(&self) -> &str;
}
