//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use super::types::{CombatEvent, DiceEvent, Event, ProgressionEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Die lifecycle (roll finished)
    Dice,
    /// Round resolution (outcomes, damage, deaths)
    Combat,
    /// Levels, materia, hearts, spawns
    Progression,
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Dice(_) => Topic::Dice,
            Event::Combat(_) => Topic::Combat,
            Event::Progression(_) => Topic::Progression,
        }
    }
}

impl From<DiceEvent> for Event {
    fn from(e: DiceEvent) -> Self {
        Event::Dice(e)
    }
}

impl From<CombatEvent> for Event {
    fn from(e: CombatEvent) -> Self {
        Event::Combat(e)
    }
}

impl From<ProgressionEvent> for Event {
    fn from(e: ProgressionEvent) -> Self {
        Event::Progression(e)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about.
pub struct EventBus {
    channels: Arc<RwLock<HashMap<Topic, broadcast::Sender<Event>>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let mut channels = HashMap::new();

        // Pre-create channels for each topic
        channels.insert(Topic::Dice, broadcast::channel(capacity).0);
        channels.insert(Topic::Combat, broadcast::channel(capacity).0);
        channels.insert(Topic::Progression, broadcast::channel(capacity).0);

        Self {
            channels: Arc::new(RwLock::new(channels)),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        // Use try_read to avoid blocking in async context.
        // If we can't get the lock, just skip (events are best-effort).
        match self.channels.try_read() {
            Ok(channels) => {
                if let Some(tx) = channels.get(&topic)
                    && tx.send(event).is_err()
                {
                    // No subscribers for this topic - normal, not an error
                    tracing::trace!("No subscribers for topic {:?}", topic);
                }
            }
            Err(_) => {
                tracing::debug!("Failed to acquire event bus lock for topic {:?}", topic);
            }
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        let channels = self
            .channels
            .try_read()
            .expect("Failed to acquire read lock on event channels");
        channels
            .get(&topic)
            .expect("Topic channel not initialized")
            .subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        let channels = self
            .channels
            .try_read()
            .expect("Failed to acquire read lock on event channels");
        topics
            .iter()
            .map(|&topic| {
                let rx = channels
                    .get(&topic)
                    .expect("Topic channel not initialized")
                    .subscribe();
                (topic, rx)
            })
            .collect()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::RoundOutcome;

    #[tokio::test]
    async fn routes_events_by_topic() {
        let bus = EventBus::new();
        let mut combat_rx = bus.subscribe(Topic::Combat);
        let mut dice_rx = bus.subscribe(Topic::Dice);

        bus.publish(CombatEvent::OutcomeDecided {
            outcome: RoundOutcome::Draw,
        });

        let got = combat_rx.recv().await.unwrap();
        assert!(matches!(
            got,
            Event::Combat(CombatEvent::OutcomeDecided { .. })
        ));
        assert!(dice_rx.try_recv().is_err());
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(ProgressionEvent::HardReset);
    }
}
