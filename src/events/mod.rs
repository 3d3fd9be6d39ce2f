//! Catalog event notifications
//!
//! Broadcast channel for observability consumers (live catalog updates,
//! audit logging). Each subscriber gets its own receiver handle; a slow or
//! dropped subscriber never blocks publishers.

use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// A page render completed and was returned to a caller.
    PageRendered { document_id: String, page: i64 },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CatalogEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: CatalogEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(CatalogEvent::PageRendered {
            document_id: "d1".to_string(),
            page: 3,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            CatalogEvent::PageRendered {
                document_id: "d1".to_string(),
                page: 3,
            }
        );
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.publish(CatalogEvent::PageRendered {
            document_id: "d1".to_string(),
            page: 1,
        });
    }
}
