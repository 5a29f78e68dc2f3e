//! # smoker-producer
//!
//! Reads timestamped temperature readings from a CSV feed and publishes each
//! channel's value as its own message on a per-channel RabbitMQ queue.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   Row    ┌────────────┐  (queue, "<ts>, <value>")  ┌───────────┐
//! │ RowSource │────────▶│  Pipeline  │──────────────────────────▶│ Publisher │──▶ broker
//! │ (csv)     │         │ parse+pace │                            │ (amqp)    │
//! └───────────┘         └─────┬──────┘                            └───────────┘
//!                             │
//!                     ChannelRegistry
//!                   column i+1 → queue i
//! ```
//!
//! - **[`channels`]**: the fixed signal-name to queue mapping
//! - **[`source`]**: the [`RowSource`] trait, [`CsvSource`], and the row parser
//! - **[`publish`]**: the [`Publisher`] trait with AMQP and in-memory brokers
//! - **[`pipeline`]**: the driver state machine, pacing and shutdown
//! - **[`config`]**: layered settings (file, environment, CLI)
//!
//! ## Usage
//!
//! ```bash
//! # Publish smoker-temps.csv to a local broker, one row every 30 seconds
//! smoker-producer
//!
//! # Quick local check with no broker and no waiting
//! smoker-producer --dry-run --pacing 0s
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::time::Duration;
//! use smoker_producer::{ChannelRegistry, MemoryBroker, MemorySource, Pipeline};
//!
//! # tokio_test::block_on(async {
//! let broker = MemoryBroker::new();
//! let source = MemorySource::from_lines(["ts,a,b,c", "2023-01-01T00:00,225.5,110.3,95.2"]);
//!
//! let mut pipeline = Pipeline::new(broker.clone(), ChannelRegistry::smoker())
//!     .with_pacing(Duration::ZERO);
//! let summary = pipeline.run(source).await.unwrap();
//!
//! assert_eq!(summary.published, 3);
//! assert_eq!(broker.messages("01-smoker"), vec!["2023-01-01T00:00, 225.5"]);
//! # });
//! ```

pub mod channels;
pub mod config;
pub mod duration;
pub mod error;
pub mod monitor;
pub mod pipeline;
pub mod publish;
pub mod source;

// Re-export main types for convenience
pub use channels::{Channel, ChannelRegistry};
pub use config::Settings;
pub use error::{ConnectionError, FieldError, PipelineError, SourceError};
pub use monitor::MonitorLinks;
pub use pipeline::{Pipeline, PipelineState, RunSummary};
#[cfg(feature = "amqp")]
pub use publish::{AmqpPublisher, BrokerAddress};
pub use publish::{MemoryBroker, Publisher};
pub use source::{CsvSource, MemorySource, Message, Reading, Row, RowSource};
