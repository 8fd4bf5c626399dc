//! Notifications for UI/audio/analytics collaborators
//!
//! Subscribers register explicitly and get their own queue, so a torn-down
//! listener can never be called back: it unsubscribes and its queue is gone.

use std::collections::{BTreeMap, VecDeque};

/// Everything the core tells the outside world
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    AchievementUnlocked {
        id: String,
        title: String,
        description: String,
    },
    /// Lethal hit with a continue still possible
    RunPending {
        score: i64,
        best: i64,
        can_continue: bool,
        is_new_record: bool,
    },
    /// Run is over for good
    RunFinal {
        score: i64,
        best: i64,
        is_new_record: bool,
    },
    Revived,
    /// Pool levels normalized to [0, 1]
    EnergyChanged { light01: f32, dark01: f32 },
}

/// Per-subscriber queue bound; the oldest entries are dropped beyond it
pub const MAX_QUEUED: usize = 4096;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u32);

#[derive(Debug, Default)]
pub struct EventBus {
    queues: BTreeMap<SubscriberId, VecDeque<Notification>>,
    next_id: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener (call on activation).
    ///
    /// The listener must `drain` its queue regularly: energy updates arrive
    /// every simulation step, and past [`MAX_QUEUED`] entries the oldest
    /// notifications are discarded.
    pub fn subscribe(&mut self) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.queues.insert(id, VecDeque::new());
        id
    }

    /// Deregister a listener (call on teardown). Returns false if unknown.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.queues.remove(&id).is_some()
    }

    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.queues.contains_key(&id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.queues.len()
    }

    /// Deliver to every current subscriber, in publish order
    pub fn publish(&mut self, notification: Notification) {
        log::trace!("publish {:?}", notification);
        for (id, queue) in self.queues.iter_mut() {
            if queue.len() >= MAX_QUEUED {
                queue.pop_front();
                log::trace!("Subscriber {:?} queue full, dropped oldest", id);
            }
            queue.push_back(notification.clone());
        }
    }

    /// Take everything queued for `id` (empty for unknown ids)
    pub fn drain(&mut self, id: SubscriberId) -> Vec<Notification> {
        self.queues
            .get_mut(&id)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn pending(&self, id: SubscriberId) -> usize {
        self.queues.get(&id).map(VecDeque::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_subscriber_gets_a_copy() {
        let mut bus = EventBus::new();
        let ui = bus.subscribe();
        let audio = bus.subscribe();

        bus.publish(Notification::Revived);

        assert_eq!(bus.drain(ui), vec![Notification::Revived]);
        assert_eq!(bus.drain(audio), vec![Notification::Revived]);
        assert!(bus.drain(ui).is_empty());
    }

    #[test]
    fn test_unsubscribed_listener_stops_receiving() {
        let mut bus = EventBus::new();
        let ui = bus.subscribe();
        assert!(bus.unsubscribe(ui));
        assert!(!bus.unsubscribe(ui));

        bus.publish(Notification::Revived);
        assert!(!bus.is_subscribed(ui));
        assert_eq!(bus.pending(ui), 0);
        assert!(bus.drain(ui).is_empty());
    }

    #[test]
    fn test_undrained_queue_is_bounded() {
        let mut bus = EventBus::new();
        let idle = bus.subscribe();
        for i in 0..MAX_QUEUED + 10 {
            bus.publish(Notification::EnergyChanged {
                light01: i as f32,
                dark01: 0.0,
            });
        }
        assert_eq!(bus.pending(idle), MAX_QUEUED);

        let queued = bus.drain(idle);
        assert_eq!(
            queued.first(),
            Some(&Notification::EnergyChanged {
                light01: 10.0,
                dark01: 0.0,
            })
        );
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let mut bus = EventBus::new();
        bus.publish(Notification::Revived);
        let late = bus.subscribe();
        assert_eq!(bus.pending(late), 0);
    }
}
