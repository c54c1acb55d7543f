//! Min-heap event queue.
//!
//! Events carry a `tick` at which they become due, a callback, a
//! human-readable description for feedback/logging, and a random `uid`
//! that orders and cockpits use to detect a stale callback (one scheduled
//! by an order that has since been superseded). The queue is generic over
//! a context type `C` so this module stays decoupled from `Universe` while
//! still letting callbacks mutate it; `Universe` uses `EventQueue<Universe>`.

use rand::Rng;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A random token identifying the order (or other source) that scheduled
/// an event, so a callback can check it is still the current order before
/// acting.
pub type EventUid = f64;

/// Sentinel used when no uid was supplied to [`EventQueue::add`]; a fresh
/// random uid is substituted before the event is stored.
pub const NULL_EVENT_UID: EventUid = -1.0;

/// Generate a fresh random event uid in `[0, 1)` (never [`NULL_EVENT_UID`]).
pub fn new_event_uid() -> EventUid {
    rand::rng().random::<f64>()
}

/// A callback invoked when its event becomes due, given mutable access to
/// the context it was scheduled against and the tick it fired at (which
/// may be later than the originally-scheduled `tick` if the event shared a
/// pop with earlier ones, but is never earlier).
pub type EventCallback<C> = Box<dyn FnOnce(&mut C, f64) + Send>;

/// A scheduled event. Ordered by `tick` ascending; ties broken by
/// insertion sequence so that events scheduled earlier for the same tick
/// fire first, matching the deterministic behavior required of
/// same-tick event ordering.
pub struct Event<C> {
    pub tick: f64,
    pub callback: EventCallback<C>,
    pub description: String,
    pub uid: EventUid,
    sequence: u64,
}

impl<C> Event<C> {
    fn key(&self) -> (f64, std::cmp::Reverse<u64>) {
        (self.tick, std::cmp::Reverse(self.sequence))
    }
}

impl<C> PartialEq for Event<C> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl<C> Eq for Event<C> {}

impl<C> PartialOrd for Event<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Event<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest (smallest)
        // tick, then earliest insertion sequence, pops first.
        other.key().partial_cmp(&self.key()).unwrap_or(Ordering::Equal)
    }
}

/// A min-heap of pending [`Event`]s scheduled against a context `C`.
pub struct EventQueue<C> {
    queue: BinaryHeap<Event<C>>,
    next_sequence: u64,
}

impl<C> Default for EventQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EventQueue<C> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue holds no events.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedule `callback` to fire at `tick`. If `uid` is `None`, a fresh
    /// uid is generated and returned; otherwise the given uid is used
    /// (and also returned) so the caller can correlate multiple events
    /// from the same order.
    pub fn add(
        &mut self,
        tick: f64,
        callback: EventCallback<C>,
        description: impl Into<String>,
        uid: Option<EventUid>,
    ) -> EventUid {
        let uid = uid.unwrap_or_else(new_event_uid);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push(Event {
            tick,
            callback,
            description: description.into(),
            uid,
            sequence,
        });
        uid
    }

    /// Peek at the next event to fire, if any.
    pub fn peek_next(&self) -> Option<&Event<C>> {
        self.queue.peek()
    }

    /// Pop and return the next event if its tick is `<= horizon`.
    pub fn pop_next(&mut self, horizon: f64) -> Option<Event<C>> {
        match self.queue.peek() {
            Some(event) if event.tick <= horizon => self.queue.pop(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_tick_order() {
        let mut q: EventQueue<()> = EventQueue::new();
        q.add(5.0, Box::new(|_, _| {}), "late", None);
        q.add(1.0, Box::new(|_, _| {}), "early", None);
        q.add(3.0, Box::new(|_, _| {}), "mid", None);

        let first = q.pop_next(f64::INFINITY).unwrap();
        assert_eq!(first.description, "early");
        let second = q.pop_next(f64::INFINITY).unwrap();
        assert_eq!(second.description, "mid");
        let third = q.pop_next(f64::INFINITY).unwrap();
        assert_eq!(third.description, "late");
    }

    #[test]
    fn same_tick_events_fire_in_insertion_order() {
        let mut q: EventQueue<()> = EventQueue::new();
        q.add(2.0, Box::new(|_, _| {}), "first", None);
        q.add(2.0, Box::new(|_, _| {}), "second", None);
        q.add(2.0, Box::new(|_, _| {}), "third", None);

        let order: Vec<_> = (0..3)
            .map(|_| q.pop_next(f64::INFINITY).unwrap().description)
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn pop_next_respects_horizon() {
        let mut q: EventQueue<()> = EventQueue::new();
        q.add(10.0, Box::new(|_, _| {}), "future", None);
        assert!(q.pop_next(5.0).is_none());
        assert_eq!(q.len(), 1);
        assert!(q.pop_next(10.0).is_some());
    }

    #[test]
    fn add_returns_and_reuses_uid() {
        let mut q: EventQueue<()> = EventQueue::new();
        let uid = q.add(1.0, Box::new(|_, _| {}), "a", None);
        let same_uid = q.add(2.0, Box::new(|_, _| {}), "b", Some(uid));
        assert_eq!(uid, same_uid);
    }

    #[test]
    fn callback_runs_with_fire_tick_and_context() {
        let mut q: EventQueue<f64> = EventQueue::new();
        q.add(
            3.0,
            Box::new(|ctx: &mut f64, tick| {
                *ctx = tick;
            }),
            "fires",
            None,
        );
        let event = q.pop_next(f64::INFINITY).unwrap();
        let mut ctx = 0.0;
        (event.callback)(&mut ctx, 3.0);
        assert_eq!(ctx, 3.0);
    }
}
