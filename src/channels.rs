//! Channel registry: the fixed mapping from signal name to destination queue.
//!
//! The registry is built once at startup and never changes during a run.
//! Its order defines which CSV column feeds which channel: column `i + 1`
//! of every data row belongs to the channel at index `i`.

use serde::{Deserialize, Serialize};

/// One logical measurement stream and the queue it is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Signal name, e.g. "smoker".
    pub name: String,
    /// Destination queue on the broker, e.g. "01-smoker".
    pub queue: String,
}

impl Channel {
    pub fn new(name: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: queue.into(),
        }
    }
}

/// Ordered, read-only set of channels for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    /// Create a registry from channels in column order.
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    /// The smoker feed: one smoker probe and two food probes.
    pub fn smoker() -> Self {
        Self::new(vec![
            Channel::new("smoker", "01-smoker"),
            Channel::new("food-A", "02-food-A"),
            Channel::new("food-B", "03-food-B"),
        ])
    }

    /// Channel at a positional index (0-based, column `index + 1`).
    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// Queue for a channel name.
    pub fn queue_for(&self, name: &str) -> Option<&str> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.queue.as_str())
    }

    /// Queue for a positional index.
    pub fn queue_at(&self, index: usize) -> Option<&str> {
        self.get(index).map(|c| c.queue.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// All destination queues, in channel order.
    pub fn queues(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.queue.as_str())
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::smoker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoker_registry_order() {
        let registry = ChannelRegistry::smoker();
        assert_eq!(registry.len(), 3);
        let queues: Vec<&str> = registry.queues().collect();
        assert_eq!(queues, vec!["01-smoker", "02-food-A", "03-food-B"]);
    }

    #[test]
    fn test_lookup_by_name_and_index() {
        let registry = ChannelRegistry::smoker();
        assert_eq!(registry.queue_for("food-A"), Some("02-food-A"));
        assert_eq!(registry.queue_at(2), Some("03-food-B"));
        assert_eq!(registry.get(0).map(|c| c.name.as_str()), Some("smoker"));
    }

    #[test]
    fn test_unknown_lookups() {
        let registry = ChannelRegistry::smoker();
        assert_eq!(registry.queue_for("food-C"), None);
        assert_eq!(registry.queue_at(3), None);
    }

    #[test]
    fn test_custom_registry() {
        let registry = ChannelRegistry::new(vec![Channel::new("probe", "probe-q")]);
        assert_eq!(registry.queue_for("probe"), Some("probe-q"));
        assert!(!registry.is_empty());
    }
}
