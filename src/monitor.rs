//! Links into the RabbitMQ management UI.
//!
//! Used as the pipeline's optional startup hook: it only logs where the
//! queues can be watched and never blocks on the operator.

use tracing::info;

use crate::channels::ChannelRegistry;

/// Management UI location for the queues of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorLinks {
    endpoint: String,
    vhost: String,
}

impl MonitorLinks {
    pub fn new(endpoint: impl Into<String>, vhost: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            vhost: vhost.into(),
        }
    }

    /// The queue overview page.
    pub fn overview_url(&self) -> String {
        format!("{}/#/queues", self.endpoint)
    }

    /// The detail page of one queue.
    pub fn queue_url(&self, queue: &str) -> String {
        format!(
            "{}/#/queues/{}/{}",
            self.endpoint,
            urlencoded(&self.vhost),
            urlencoded(queue)
        )
    }

    /// Log the overview page and one page per registered queue.
    pub fn announce(&self, registry: &ChannelRegistry) {
        info!("Monitor queues at {}", self.overview_url());
        for channel in registry.iter() {
            info!("  {} -> {}", channel.name, self.queue_url(&channel.queue));
        }
    }
}

// URL encode a string for use in paths
fn urlencoded(s: &str) -> String {
    s.replace('%', "%25").replace('/', "%2F")
}
