//! Pipeline driver: rows in, one message per valid channel field out.
//!
//! ## State machine
//!
//! ```text
//! Idle ──reset queues──▶ Connected ──skip header──▶ Streaming ──exhausted──▶ Done
//!   │                        │                          │
//!   └────────────────────────┴──── ConnectionError ─────┴──▶ Failed
//!                                  shutdown signal ─────────▶ Interrupted
//! ```
//!
//! Execution is strictly sequential: each row is parsed, its readings are
//! published in channel order, then the pacing delay runs before the next
//! row is read. The publisher is closed on every exit path.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::channels::ChannelRegistry;
use crate::error::PipelineError;
use crate::publish::Publisher;
use crate::source::{parse_row, Reading, RowSource};

/// Where the driver is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    /// Created, nothing sent to the broker yet.
    Idle,
    /// Queues reset and declared.
    Connected,
    /// Reading and publishing rows.
    Streaming,
    /// Source exhausted, connection closed.
    Done,
    /// Stopped by a shutdown signal, connection closed.
    Interrupted,
    /// Stopped by a fatal error, connection closed.
    Failed,
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Data rows read (the header is not counted).
    pub rows: u64,
    /// Messages handed to the broker.
    pub published: u64,
    /// Channel fields that failed numeric conversion.
    pub dropped_fields: u64,
    /// Messages per destination queue.
    pub per_queue: BTreeMap<String, u64>,
    pub interrupted: bool,
}

/// Callback run once before the broker is touched.
pub type StartHook = Box<dyn FnOnce(&ChannelRegistry) + Send>;

/// Drives rows from a [`RowSource`] through a [`Publisher`].
pub struct Pipeline<P> {
    publisher: P,
    registry: ChannelRegistry,
    pacing: Duration,
    skip_header: bool,
    on_start: Option<StartHook>,
    state: PipelineState,
}

impl<P: std::fmt::Debug> std::fmt::Debug for Pipeline<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("publisher", &self.publisher)
            .field("registry", &self.registry)
            .field("pacing", &self.pacing)
            .field("skip_header", &self.skip_header)
            .field("state", &self.state)
            .finish()
    }
}

impl<P: Publisher> Pipeline<P> {
    /// Default pacing between rows, the sampling interval of the smoker feed.
    pub const DEFAULT_PACING: Duration = Duration::from_secs(30);

    pub fn new(publisher: P, registry: ChannelRegistry) -> Self {
        Self {
            publisher,
            registry,
            pacing: Self::DEFAULT_PACING,
            skip_header: true,
            on_start: None,
            state: PipelineState::Idle,
        }
    }

    /// Set the delay applied after each row.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Whether the first record is a header to discard (default: true).
    pub fn skip_header(mut self, skip: bool) -> Self {
        self.skip_header = skip;
        self
    }

    /// Run `hook` once at startup, before any queue is touched.
    pub fn on_start(mut self, hook: impl FnOnce(&ChannelRegistry) + Send + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Run until the source is exhausted or a fatal error occurs.
    pub async fn run<S: RowSource>(&mut self, source: S) -> Result<RunSummary, PipelineError> {
        self.run_until(source, std::future::pending()).await
    }

    /// Run until the source is exhausted, a fatal error occurs, or
    /// `shutdown` completes.
    ///
    /// The publisher is closed before this returns, whatever the outcome.
    pub async fn run_until<S, F>(
        &mut self,
        mut source: S,
        shutdown: F,
    ) -> Result<RunSummary, PipelineError>
    where
        S: RowSource,
        F: Future<Output = ()>,
    {
        if let Some(hook) = self.on_start.take() {
            hook(&self.registry);
        }

        let mut summary = RunSummary {
            per_queue: self.registry.queues().map(|q| (q.to_string(), 0)).collect(),
            ..RunSummary::default()
        };

        let outcome = tokio::select! {
            result = self.drive(&mut source, &mut summary) => Some(result),
            _ = shutdown => None,
        };

        let result = match outcome {
            Some(Ok(())) => {
                self.state = PipelineState::Done;
                Ok(summary)
            }
            Some(Err(e)) => {
                self.state = PipelineState::Failed;
                Err(e)
            }
            None => {
                info!("Shutdown requested, closing connection");
                self.state = PipelineState::Interrupted;
                summary.interrupted = true;
                Ok(summary)
            }
        };

        if let Err(e) = self.publisher.close().await {
            warn!("{}", e);
        }

        result
    }

    async fn drive<S: RowSource>(
        &mut self,
        source: &mut S,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        for queue in self.registry.queues() {
            self.publisher.reset_queue(queue).await?;
        }
        self.state = PipelineState::Connected;
        info!(
            "Reset {} queues on {}",
            self.registry.len(),
            self.publisher.description()
        );

        if self.skip_header {
            if let Some(header) = source.next_row()? {
                debug!(line = header.line, "skipping header");
            }
        }
        self.state = PipelineState::Streaming;
        info!("Streaming rows from {}", source.description());

        while let Some(row) = source.next_row()? {
            summary.rows += 1;
            let parsed = parse_row(&row, &self.registry);

            for (channel, value) in &parsed.fields {
                match value {
                    Ok(value) => {
                        let message = Reading::new(parsed.timestamp.as_str(), *value).to_message();
                        self.publisher
                            .publish(&channel.queue, message.as_bytes())
                            .await?;
                        summary.published += 1;
                        *summary.per_queue.entry(channel.queue.clone()).or_default() += 1;
                    }
                    Err(e) => {
                        summary.dropped_fields += 1;
                        trace!(line = row.line, channel = %channel.name, "dropped field: {}", e);
                    }
                }
            }

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        Ok(())
    }
}
