//! Error types for the producer.

use std::path::PathBuf;

use thiserror::Error;

/// Broker-level failures. Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The broker was unreachable or refused the connection.
    #[error("Connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    /// A channel could not be opened on an established connection.
    #[error("Failed to open channel: {0}")]
    Channel(String),

    /// Deleting or declaring a queue failed.
    #[error("Failed to reset queue {queue}: {reason}")]
    Queue { queue: String, reason: String },

    /// Handing a message to the broker failed.
    #[error("Failed to publish to {queue}: {reason}")]
    Publish { queue: String, reason: String },

    /// Closing the connection failed.
    #[error("Failed to close connection: {0}")]
    Close(String),
}

/// A single channel field that could not become a reading.
///
/// Produced by the row parser and absorbed there; it never aborts a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The row has no field for this channel.
    #[error("field missing")]
    Missing,

    /// The field is blank or not a number.
    #[error("not a number: {0:?}")]
    NotNumeric(String),

    /// The field parsed to NaN or an infinity.
    #[error("not a finite number: {0:?}")]
    NonFinite(String),
}

/// Failures reading the tabular data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read error at line {line}: {source}")]
    Read {
        line: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that ends a run early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Source(#[from] SourceError),
}
