//! Notification transport (spec.md §4.5, §6): an in-process broadcast bus
//! carrying signed `Notification` envelopes, the stand-in for the cluster
//! pub/sub channel spec.md §1 places out of scope.

use crate::models::{Notification, NotificationCommand};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Publishes and subscribes to gateway-wide notifications. Cloning shares
/// the same underlying channel (cheap, like `tokio::sync::broadcast::Sender`).
#[derive(Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
    secret: Vec<u8>,
}

impl NotificationBus {
    pub fn new(secret: Vec<u8>) -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender, secret }
    }

    pub fn publish(&self, command: NotificationCommand, payload: String) {
        let notification = Notification::sign(command, payload, &self.secret);
        // No subscribers is not an error: nothing in this process currently
        // cares, which is normal right after startup.
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_notification() {
        let bus = NotificationBus::new(b"secret".to_vec());
        let mut receiver = bus.subscribe();

        bus.publish(NotificationCommand::ApiUpdated, "api-1".to_string());

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.command, NotificationCommand::ApiUpdated);
        assert!(received.verify(b"secret"));
    }
}
