//! Timer capability.
//!
//! ANTIC owns two timers: the WSYNC halt assert and the deferred register
//! update. The host machine already runs a clock-driven event queue, so the
//! chip only asks for "fire this event in N clocks" and gets a handle back.
//! When an event comes due the host hands it to
//! [`Antic::on_scheduled_event`](crate::Antic::on_scheduled_event).
//!
//! [`EventScheduler`] is a small heap-backed implementation for hosts that
//! have nothing better, and for tests.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

/// Handle returned by [`Scheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

/// Timers ANTIC registers with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnticEvent {
    /// Try to pull RDY low for a pending WSYNC.
    WsyncAssert,
    /// Apply the deferred register write at the head of the queue.
    RegisterUpdate,
}

pub trait Scheduler {
    /// Monotonic clock count, advancing once per ANTIC clock.
    fn current_tick(&self) -> u64;

    /// Fire `event` `delay` clocks from now.
    fn schedule(&mut self, delay: u32, event: AnticEvent) -> EventId;

    /// Drop a pending event. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: EventId);
}

struct ScheduledEvent {
    fire_at: u64,
    id: EventId,
    event: AnticEvent,
}

impl Eq for ScheduledEvent {}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.id == other.id
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: earliest first, then registration order.
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Binary-heap event queue driven one clock at a time.
pub struct EventScheduler {
    tick: u64,
    next_id: u64,
    queue: BinaryHeap<ScheduledEvent>,
}

impl EventScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick: 0,
            next_id: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Advance the clock by one.
    pub fn tick(&mut self) {
        self.tick += 1;
    }

    /// Next event due at or before the current tick.
    pub fn pop_due(&mut self) -> Option<AnticEvent> {
        if self.queue.peek().is_some_and(|e| e.fire_at <= self.tick) {
            self.queue.pop().map(|e| e.event)
        } else {
            None
        }
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_pending(&self, id: EventId) -> bool {
        self.queue.iter().any(|e| e.id == id)
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for EventScheduler {
    fn current_tick(&self) -> u64 {
        self.tick
    }

    fn schedule(&mut self, delay: u32, event: AnticEvent) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.queue.push(ScheduledEvent {
            fire_at: self.tick + u64::from(delay),
            id,
            event,
        });
        id
    }

    fn cancel(&mut self, id: EventId) {
        self.queue.retain(|e| e.id != id);
    }
}
