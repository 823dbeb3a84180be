/*!
 * Event Broadcasting
 * Fan-out of translated watch events to async subscribers
 */

use std::sync::Arc;
use tokio::sync::broadcast;

use super::event::WatchEvent;

/// Event broadcaster implementation
/// Uses tokio broadcast channel for lock-free MPMC
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: Arc<broadcast::Sender<WatchEvent>>,
}

impl EventBroadcaster {
    /// Create new broadcaster with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.sender.subscribe()
    }

    /// Emit event to all subscribers
    pub fn emit(&self, event: WatchEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
