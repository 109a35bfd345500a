use std::collections::BTreeSet;

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Published once per committed batch for each collection it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: String,
}

/// In-process fan-out of store changes to live listeners.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish<'a>(&self, collections: impl IntoIterator<Item = &'a str>) {
        let touched: BTreeSet<&str> = collections.into_iter().collect();
        for collection in touched {
            // No receivers is fine: nobody is listening right now.
            let _ = self.sender.send(ChangeEvent {
                collection: collection.to_string(),
            });
        }
    }

    pub fn subscribe(&self, collection: &str) -> Subscription {
        Subscription {
            collection: collection.to_string(),
            receiver: self.sender.subscribe(),
        }
    }
}

/// Change notifications for one collection.
///
/// Listeners re-read the whole collection on every notification, so missed
/// events after a lag collapse into a single wake-up.
pub struct Subscription {
    collection: String,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Waits for the next change. Returns `false` once the feed is closed.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.collection == self.collection => return true,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        "Subscription on {} lagged by {} events",
                        self.collection,
                        skipped
                    );
                    return true;
                }
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscription_ignores_other_collections() {
        let feed = ChangeFeed::new();
        let mut sub = feed.subscribe("contacts");

        feed.publish(["menus"]);
        feed.publish(["contacts", "contacts"]);

        assert!(sub.changed().await);
        // The duplicate collection name is published once.
        assert!(sub.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_feed_ends_subscription() {
        let feed = ChangeFeed::new();
        let mut sub = feed.subscribe("contacts");
        drop(feed);
        assert!(!sub.changed().await);
    }
}
