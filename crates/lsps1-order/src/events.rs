//! Typed subscription handles for order lifecycle events.
//!
//! Replaces an ambient document-level publish/subscribe medium with a pair
//! of explicit handles: the host keeps the [`OrderEventBus`] and hands the
//! matching [`OrderSubscriptions`] to the reconciler. Dropping either side
//! releases the listeners; nothing is registered globally.

use tokio::sync::mpsc;

use crate::error::{OrderUiError, Result};
use crate::model::{ChannelRecord, OrderStatus};

/// Publisher half of the order event streams.
///
/// `update_status` is the public re-publication entry point: any caller may
/// push a new snapshot into the system without being the polling
/// collaborator itself.
#[derive(Clone)]
pub struct OrderEventBus {
    status_tx: mpsc::Sender<OrderStatus>,
    channels_tx: mpsc::Sender<Vec<ChannelRecord>>,
}

/// Subscriber half: one receiver per stream, consumed by the reconciler's
/// event loop. Dropping this detaches both listeners.
pub struct OrderSubscriptions {
    pub(crate) status_rx: mpsc::Receiver<OrderStatus>,
    pub(crate) channels_rx: mpsc::Receiver<Vec<ChannelRecord>>,
}

impl OrderEventBus {
    /// Create a connected bus/subscription pair with bounded buffers.
    pub fn channel(capacity: usize) -> (Self, OrderSubscriptions) {
        let (status_tx, status_rx) = mpsc::channel(capacity);
        let (channels_tx, channels_rx) = mpsc::channel(capacity);
        (
            Self {
                status_tx,
                channels_tx,
            },
            OrderSubscriptions {
                status_rx,
                channels_rx,
            },
        )
    }

    /// Publish a polled order snapshot.
    pub async fn update_status(&self, status: OrderStatus) -> Result<()> {
        self.status_tx
            .send(status)
            .await
            .map_err(|_| OrderUiError::Subscription("order status listener dropped".to_string()))
    }

    /// Publish the latest channel snapshot (full replacement).
    pub async fn publish_channels(&self, channels: Vec<ChannelRecord>) -> Result<()> {
        self.channels_tx
            .send(channels)
            .await
            .map_err(|_| OrderUiError::Subscription("channel listener dropped".to_string()))
    }
}
