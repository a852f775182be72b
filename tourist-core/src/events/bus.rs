use std::fmt;

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tourist_model::TouristEvent;

/// Lightweight in-process event bus that fans out outbound notifications to
/// observers. Publishing never blocks; a subscriber that falls more than
/// `capacity` events behind observes a `Lagged` error and skips ahead.
pub struct EventBus {
    sender: broadcast::Sender<TouristEvent>,
    capacity: usize,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    pub fn publish(&self, event: TouristEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TouristEvent> {
        self.sender.subscribe()
    }

    pub fn stream(&self) -> BroadcastStream<TouristEvent> {
        BroadcastStream::new(self.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourist_model::PinID;

    #[tokio::test]
    async fn subscribers_receive_events_in_publish_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let pin_id = PinID::new();

        bus.publish(TouristEvent::PinValidated { pin_id });
        bus.publish(TouristEvent::AcquisitionAborted {
            pin_id,
            reason: "offline".into(),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            TouristEvent::PinValidated { pin_id }
        );
        assert!(matches!(
            rx.recv().await.unwrap(),
            TouristEvent::AcquisitionAborted { .. }
        ));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new(1);
        bus.publish(TouristEvent::PinValidated { pin_id: PinID::new() });
    }
}
