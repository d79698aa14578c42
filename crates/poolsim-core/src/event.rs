//! Simulation events and the time-ordered event queue.
//!
//! The queue is a min-heap keyed on `(time_us, sequence)`. The sequence
//! number is assigned at scheduling time, so events sharing a timestamp are
//! dispatched in the order they were scheduled and replays are exact.

use serde::{Deserialize, Serialize};
use std::collections::BinaryHeap;

/// Events in the discrete-event simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A user request arrives and must be allocated a unit.
    RequestArrival { request_id: u64 },
    /// A user session finishes; its unit returns to the warm pool.
    SessionEnd { request_id: u64 },
    /// A unit started for a specific request is ready to serve it.
    UnitReadyForRequest { request_id: u64 },
    /// A unit started by replenishment joins the warm pool.
    WarmUnitReady,
    /// A host finished provisioning.
    HostReady {
        /// Request whose unit will start on this host, if any.
        reserved_for: Option<u64>,
        /// Whether the host was promoted from the standby pool.
        from_standby: bool,
    },
    /// Fixed-interval scaling and replenishment check.
    PeriodicCheck,
    /// The external pool manager restocks the standby pool.
    StandbyReplenish,
}

impl SimEvent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SimEvent::RequestArrival { .. } => "request_arrival",
            SimEvent::SessionEnd { .. } => "session_end",
            SimEvent::UnitReadyForRequest { .. } => "unit_ready_for_request",
            SimEvent::WarmUnitReady => "warm_unit_ready",
            SimEvent::HostReady { .. } => "host_ready",
            SimEvent::PeriodicCheck => "periodic_check",
            SimEvent::StandbyReplenish => "standby_replenish",
        }
    }
}

/// An event to be scheduled `delay_secs` after the current time.
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred {
    pub delay_secs: f64,
    pub event: SimEvent,
}

impl Deferred {
    pub fn new(delay_secs: f64, event: SimEvent) -> Self {
        Self { delay_secs, event }
    }
}

/// A timestamped event for the priority queue.
#[derive(Debug, Clone)]
pub struct TimedEvent {
    pub time_us: u64,
    pub sequence: u64,
    pub event: SimEvent,
}

impl PartialEq for TimedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time_us == other.time_us && self.sequence == other.sequence
    }
}

impl Eq for TimedEvent {}

impl PartialOrd for TimedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; we want min-heap
        other
            .time_us
            .cmp(&self.time_us)
            .then(other.sequence.cmp(&self.sequence))
    }
}

/// Time-ordered event queue with FIFO tie-breaking.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<TimedEvent>,
    sequence: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event at an absolute time.
    pub fn schedule(&mut self, time_us: u64, event: SimEvent) {
        self.heap.push(TimedEvent {
            time_us,
            sequence: self.sequence,
            event,
        });
        self.sequence += 1;
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<TimedEvent> {
        self.heap.pop()
    }

    /// Timestamp of the earliest event, if any.
    pub fn peek_time_us(&self) -> Option<u64> {
        self.heap.peek().map(|e| e.time_us)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
