//! Per-connection subscription manager.
//!
//! Tracks which topics a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::Topic;

/// Manages the set of topic subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed topics. If `subscribe_all` is true, this set is ignored.
    topics: HashSet<Topic>,
    /// Whether the client subscribes to every topic (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds topics to the subscription set.
    pub fn subscribe(&mut self, topics: &[Topic], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.topics.extend(topics.iter().copied());
    }

    /// Removes topics from the subscription set. `wildcard` also clears the
    /// wildcard subscription.
    pub fn unsubscribe(&mut self, topics: &[Topic], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for topic in topics {
            self.topics.remove(topic);
        }
    }

    /// Returns `true` if the given topic matches the subscription filter.
    #[must_use]
    pub fn matches(&self, topic: Topic) -> bool {
        self.subscribe_all || self.topics.contains(&topic)
    }

    /// Returns the number of explicitly subscribed topics.
    #[must_use]
    pub fn count(&self) -> usize {
        self.topics.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

/// Splits raw topic names into known topics, the wildcard flag and the
/// names that match no topic.
#[must_use]
pub fn parse_topics(raw: &[String]) -> (Vec<Topic>, bool, Vec<String>) {
    let mut topics = Vec::new();
    let mut wildcard = false;
    let mut unknown = Vec::new();
    for name in raw {
        if name == "*" {
            wildcard = true;
        } else {
            match name.parse::<Topic>() {
                Ok(topic) => topics.push(topic),
                Err(_) => unknown.push(name.clone()),
            }
        }
    }
    (topics, wildcard, unknown)
}
