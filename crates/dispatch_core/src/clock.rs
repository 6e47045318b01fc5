//! Dispatch event queue: the single-writer ordering point for all
//! state-changing operations.
//!
//! Every trigger (order ready, rider update, rejection, admin request)
//! becomes an [Event] on this queue. One logical worker pops events in
//! timestamp order and runs the schedule against each, so no two
//! dispatch-apply phases ever interleave and concurrent triggers are
//! serialized rather than racing.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

pub const ONE_SEC_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    /// An order entered Preparing with no rider.
    OrderReady,
    /// A rider's location or availability changed.
    RiderUpdated,
    /// The assigned rider declined the order.
    AssignmentRejected,
    /// The assigned rider accepted and is heading to the store.
    AssignmentAccepted,
    /// The rider handed the order to the client.
    OrderDelivered,
    /// The store or client cancelled the order.
    OrderCancelled,
    /// Run one Gathering -> Matching -> Applying cycle.
    DispatchRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSubject {
    Order(Entity),
    Rider(Entity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering makes the BinaryHeap a min-heap: earliest
        // timestamp first, then declaration order of kind as the
        // deterministic tie-break. DispatchRun is declared last, so a run
        // scheduled at the same instant as the trigger that requested it
        // always sees the trigger's effects.
        (other.timestamp, other.kind, other.subject).cmp(&(
            self.timestamp,
            self.kind,
            self.subject,
        ))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event currently being processed; inserted by the runner before
/// each schedule pass so systems can match on it.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct DispatchClock {
    now: u64,
    events: BinaryHeap<Event>,
}

impl DispatchClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn schedule_at(&mut self, timestamp: u64, kind: EventKind, subject: Option<EventSubject>) {
        debug_assert!(
            timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        self.events.push(Event {
            timestamp,
            kind,
            subject,
        });
    }

    pub fn schedule_in_ms(&mut self, delay_ms: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_at(self.now + delay_ms, kind, subject);
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|e| e.timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
