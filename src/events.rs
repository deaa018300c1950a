use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted after successful writes. Consumers are in-process
/// only: the event loop logs them and is where outbound hooks would attach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted {
        product_id: Uuid,
        /// Orders removed by the referential cleanup cascade.
        removed_orders: u64,
    },
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its receiving half.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event. Failure to deliver is reported, never propagated: event
    /// delivery must not fail the write that produced it.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }
}

/// Drains the event channel for the lifetime of the process.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ProductCreated(id) => info!(product_id = %id, "event: product created"),
            Event::ProductUpdated(id) => info!(product_id = %id, "event: product updated"),
            Event::ProductDeleted {
                product_id,
                removed_orders,
            } => info!(
                product_id = %product_id,
                removed_orders = removed_orders,
                "event: product deleted"
            ),
            Event::OrderCreated(id) => info!(order_id = %id, "event: order created"),
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => info!(
                order_id = %order_id,
                old_status = %old_status,
                new_status = %new_status,
                "event: order status changed"
            ),
        }
    }
}
