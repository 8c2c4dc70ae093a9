use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use vcp_types::{Amount, ChannelId, MinerId};

use crate::miner::Miner;
use crate::reward::BlockReward;

/// Notification published after every successful state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PoolEvent {
    /// A miner joined and its channel was opened.
    MinerAdmitted(Miner),
    /// A settlement distributed a pot.
    Settled(BlockReward),
    /// A miner was removed and its channel moved to `Closing`.
    ChannelClosed {
        miner_id: MinerId,
        channel_id: ChannelId,
        final_balance: Amount,
    },
}

/// Classification of pool events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolEventKind {
    MinerAdmitted,
    Settled,
    ChannelClosed,
}

impl PoolEvent {
    pub fn kind(&self) -> PoolEventKind {
        match self {
            Self::MinerAdmitted(_) => PoolEventKind::MinerAdmitted,
            Self::Settled(_) => PoolEventKind::Settled,
            Self::ChannelClosed { .. } => PoolEventKind::ChannelClosed,
        }
    }
}

impl fmt::Display for PoolEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MinerAdmitted => "MinerAdmitted",
            Self::Settled => "Settled",
            Self::ChannelClosed => "ChannelClosed",
        };
        write!(f, "{s}")
    }
}

/// A broadcast channel receiver for pool events.
pub type EventStream = broadcast::Receiver<PoolEvent>;

/// Fan-out of pool events to any number of subscribers.
///
/// Publishing never blocks. Subscribers that fall more than the configured
/// capacity behind observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: PoolEvent) {
        let kind = event.kind();
        // No subscribers is not an error.
        let delivered = self.sender.send(event).unwrap_or(0);
        debug!(%kind, delivered, "pool event published");
    }

    pub fn subscribe(&self) -> EventStream {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed() -> PoolEvent {
        PoolEvent::ChannelClosed {
            miner_id: MinerId::new(),
            channel_id: ChannelId::new(),
            final_balance: 10,
        }
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new(4);
        bus.publish(closed());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_receive_in_order() {
        let bus = EventBus::new(4);
        let mut stream = bus.subscribe();
        let first = closed();
        let second = closed();
        bus.publish(first.clone());
        bus.publish(second.clone());

        assert_eq!(stream.try_recv().unwrap(), first);
        assert_eq!(stream.try_recv().unwrap(), second);
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn kind_display() {
        assert_eq!(closed().kind(), PoolEventKind::ChannelClosed);
        assert_eq!(PoolEventKind::Settled.to_string(), "Settled");
    }

    #[test]
    fn serializes_as_tagged_payload() {
        let json = serde_json::to_value(closed()).unwrap();
        assert_eq!(json["type"], "channel_closed");
        assert_eq!(json["payload"]["final_balance"], 10);
    }
}
