//! Reference-counted realtime channel membership.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::TransportError;

/// Seam to the realtime transport. The registry only asks the transport to
/// open a subscription when the first subscriber joins and to close it when
/// the last one leaves; everything in between is local bookkeeping.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn open_channel(&self, channel_id: &str) -> Result<(), TransportError>;
    async fn close_channel(&self, channel_id: &str) -> Result<(), TransportError>;
}

#[derive(Debug)]
struct ChannelEntry {
    subscribers: usize,
}

/// Tracks active realtime subscriptions per entity id, join/leave
/// reference-counted. The registry is a raw counter: it does not deduplicate
/// repeated joins from the same logical owner — owners balance their own
/// join/leave pairs.
pub struct ChannelRegistry {
    transport: Arc<dyn RealtimeTransport>,
    channels: Mutex<HashMap<String, ChannelEntry>>,
}

impl ChannelRegistry {
    pub fn new(transport: Arc<dyn RealtimeTransport>) -> Self {
        Self {
            transport,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Increment the subscriber count for `channel_id`, opening the
    /// underlying subscription on the 0 -> 1 transition.
    ///
    /// The registry lock is held across the transport call, so joins and
    /// leaves for the same channel are applied strictly in call order: a
    /// fresh join can never be undone by a stale close racing it.
    pub async fn join(&self, channel_id: &str) -> Result<(), TransportError> {
        let mut channels = self.channels.lock().await;
        if let Some(entry) = channels.get_mut(channel_id) {
            entry.subscribers = entry.subscribers.saturating_add(1);
            return Ok(());
        }

        // First subscriber: the count only becomes visible once the open
        // succeeded, so a failed open leaves the registry untouched.
        self.transport.open_channel(channel_id).await?;
        channels.insert(channel_id.to_string(), ChannelEntry { subscribers: 1 });
        debug!(channel = channel_id, "channel subscription opened");
        Ok(())
    }

    /// Decrement the subscriber count, closing the underlying subscription on
    /// the 1 -> 0 transition. Leaving a channel with no subscribers is a
    /// silent no-op: unmount ordering races make this a common, benign call.
    pub async fn leave(&self, channel_id: &str) -> Result<(), TransportError> {
        let mut channels = self.channels.lock().await;
        let Some(entry) = channels.get_mut(channel_id) else {
            return Ok(());
        };

        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers > 0 {
            return Ok(());
        }

        // The scope is gone either way; drop the entry before surfacing a
        // close failure so the registry never counts a dead subscription.
        channels.remove(channel_id);
        self.transport.close_channel(channel_id).await?;
        debug!(channel = channel_id, "channel subscription closed");
        Ok(())
    }

    /// Close every open subscription regardless of its count. Teardown path:
    /// close failures are logged, not surfaced, so one bad channel cannot
    /// block the rest of the shutdown.
    pub async fn close_all(&self) {
        let mut channels = self.channels.lock().await;
        for (channel_id, entry) in channels.drain() {
            if let Err(error) = self.transport.close_channel(&channel_id).await {
                debug!(
                    channel = %channel_id,
                    subscribers = entry.subscribers,
                    %error,
                    "channel close failed during teardown"
                );
            }
        }
    }

    #[must_use]
    pub async fn subscriber_count(&self, channel_id: &str) -> usize {
        self.channels
            .lock()
            .await
            .get(channel_id)
            .map_or(0, |entry| entry.subscribers)
    }

    #[must_use]
    pub async fn is_open(&self, channel_id: &str) -> bool {
        self.channels.lock().await.contains_key(channel_id)
    }

    /// Snapshot of currently open channel ids, sorted for stable output.
    #[must_use]
    pub async fn active_channels(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.channels.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
