//! Discrete-event simulation driver.
//!
//! The engine owns one run's [`CapacityState`], event queue and collector.
//! Each iteration pops the earliest event, advances the virtual clock,
//! dispatches the event to the allocation cascade, a capacity handler or the
//! scaling controller, and appends a capacity snapshot. The run drains when
//! the queue empties or the next event lies past the horizon.

use crate::allocation::{allocate, AllocationTier};
use crate::capacity::CapacityState;
use crate::clock::{secs_to_us, us_to_secs, SimClock};
use crate::config::{ConfigError, SimConfig};
use crate::event::{Deferred, EventQueue, SimEvent};
use crate::metrics::{
    CapacitySnapshot, MetricsCollector, RequestRecord, RunSummary, SimulationResult,
};
use crate::random::{RandomStream, SeededStream, SessionDistribution};
use crate::scaling::ScalingController;
use log::{debug, info, warn};
use std::collections::VecDeque;

/// Lifecycle of the driver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Drained,
}

/// A request waiting for the host ceiling to free a unit.
#[derive(Debug, Clone)]
struct BacklogEntry {
    request_id: u64,
    arrival_us: u64,
    session_secs: f64,
}

/// The main simulation engine.
pub struct SimulationEngine {
    config: SimConfig,
    /// Virtual clock.
    pub clock: SimClock,
    queue: EventQueue,
    capacity: CapacityState,
    controller: ScalingController,
    stream: Box<dyn RandomStream>,
    session_dist: SessionDistribution,
    /// Metrics collector.
    pub metrics: MetricsCollector,
    backlog: VecDeque<BacklogEntry>,
    next_request_id: u64,
    /// Arrival that schedules the next generated arrival when it fires.
    chained_arrival: Option<u64>,
    /// Total events dispatched.
    pub events_processed: u64,
    horizon_us: u64,
    state: DriverState,
    seed: u64,
}

impl SimulationEngine {
    /// Create an engine drawing from a ChaCha stream seeded with `seed`.
    pub fn new(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        let mut engine = Self::with_stream(config, Box::new(SeededStream::new(seed)))?;
        engine.seed = seed;
        Ok(engine)
    }

    /// Create an engine with a caller-supplied random stream.
    pub fn with_stream(
        config: SimConfig,
        stream: Box<dyn RandomStream>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let controller = ScalingController::from_config(&config)?;
        let capacity = CapacityState::new(&config.capacity);

        Ok(Self {
            clock: SimClock::new(),
            queue: EventQueue::new(),
            metrics: MetricsCollector::new(capacity.running_hosts),
            capacity,
            controller,
            stream,
            session_dist: SessionDistribution::from(&config.workload.session),
            backlog: VecDeque::new(),
            next_request_id: 0,
            chained_arrival: None,
            events_processed: 0,
            horizon_us: secs_to_us(config.duration_secs()),
            state: DriverState::Idle,
            seed: config.simulation.seed,
            config,
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn capacity(&self) -> &CapacityState {
        &self.capacity
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Requests still waiting in the backlog.
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Schedule an event at an absolute time.
    pub fn schedule_event(&mut self, time_us: u64, event: SimEvent) {
        self.queue.schedule(time_us, event);
    }

    /// Schedule explicit arrivals at the given times in seconds.
    ///
    /// These arrivals do not chain further generated arrivals.
    pub fn load_arrivals(&mut self, times_secs: &[f64]) {
        for &t in times_secs {
            let request_id = self.take_request_id();
            self.schedule_event(secs_to_us(t), SimEvent::RequestArrival { request_id });
        }
    }

    /// Run the simulation until it drains and aggregate the result.
    ///
    /// Calling `run` again on a drained engine re-aggregates without
    /// dispatching anything.
    pub fn run(&mut self) -> SimulationResult {
        if self.state == DriverState::Idle {
            self.start();
            while let Some(timed) = self.queue.pop() {
                if timed.time_us > self.horizon_us {
                    break;
                }
                self.clock.advance_to_us(timed.time_us);
                self.process_event(timed.event);
                self.events_processed += 1;
                let snapshot = CapacitySnapshot::capture(self.clock.now_secs(), &self.capacity);
                self.metrics.record_snapshot(snapshot);
                debug_assert!(
                    self.capacity.check_invariants().is_ok(),
                    "capacity invariant violated: {:?}",
                    self.capacity.check_invariants()
                );
            }
            self.state = DriverState::Drained;
            self.log_finish();
        }

        self.metrics.aggregate(
            &self.config,
            RunSummary {
                trigger: self.controller.trigger_name(),
                seed: self.seed,
                end_secs: self.clock.now_secs(),
                horizon_secs: us_to_secs(self.horizon_us),
                events_processed: self.events_processed,
                proactive_hosts: self.controller.proactive_hosts(),
                unserved_waits_secs: self.unserved_waits_secs(),
            },
        )
    }

    fn start(&mut self) {
        info!(
            "starting run '{}' (seed={}, trigger={}, horizon={}s, rate={}/min)",
            self.config.simulation.name,
            self.seed,
            self.controller.trigger_name(),
            self.config.duration_secs(),
            self.config.workload.requests_per_minute
        );

        let rate = self.config.arrival_rate_per_sec();
        let gap = self.stream.inter_arrival_secs(rate);
        if gap.is_finite() && secs_to_us(gap) <= self.horizon_us {
            let request_id = self.take_request_id();
            self.chained_arrival = Some(request_id);
            self.schedule_event(secs_to_us(gap), SimEvent::RequestArrival { request_id });
        }

        let check_us = secs_to_us(self.config.simulation.check_interval_secs);
        if check_us > 0 && check_us <= self.horizon_us {
            self.schedule_event(check_us, SimEvent::PeriodicCheck);
        }

        if !self.queue.is_empty() {
            self.state = DriverState::Running;
        }
    }

    fn log_finish(&self) {
        info!(
            "run '{}' drained at {:.1}s: {} arrivals, {} events, {} backlogged unserved",
            self.config.simulation.name,
            self.clock.now_secs(),
            self.metrics.arrivals(),
            self.events_processed,
            self.backlog.len()
        );
    }

    /// Waits of still-backlogged requests, censored at the horizon.
    fn unserved_waits_secs(&self) -> Vec<f64> {
        self.backlog
            .iter()
            .map(|e| us_to_secs(self.horizon_us.saturating_sub(e.arrival_us)))
            .collect()
    }

    fn take_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    fn schedule_all(&mut self, deferred: Vec<Deferred>) {
        for d in deferred {
            let at = self.clock.after_secs(d.delay_secs);
            self.schedule_event(at, d.event);
        }
    }

    /// Process a single event.
    fn process_event(&mut self, event: SimEvent) {
        match event {
            SimEvent::RequestArrival { request_id } => self.handle_arrival(request_id),
            SimEvent::SessionEnd { request_id } => self.handle_session_end(request_id),
            SimEvent::UnitReadyForRequest { request_id } => self.handle_unit_ready(request_id),
            SimEvent::WarmUnitReady => self.handle_warm_unit_ready(),
            SimEvent::HostReady {
                reserved_for,
                from_standby,
            } => self.handle_host_ready(reserved_for, from_standby),
            SimEvent::PeriodicCheck => self.handle_periodic_check(),
            SimEvent::StandbyReplenish => self.controller.restock_standby(&mut self.capacity),
        }
    }

    /// Route an arrival through the allocation cascade.
    fn handle_arrival(&mut self, request_id: u64) {
        let now_us = self.clock.now_us();
        let session_secs = self.stream.session_duration_secs(&self.session_dist);

        if self.chained_arrival == Some(request_id) {
            self.chained_arrival = None;
            let gap = self
                .stream
                .inter_arrival_secs(self.config.arrival_rate_per_sec());
            if gap.is_finite() {
                let next_us = now_us.saturating_add(secs_to_us(gap));
                if next_us <= self.horizon_us {
                    let next_id = self.take_request_id();
                    self.chained_arrival = Some(next_id);
                    self.schedule_event(next_us, SimEvent::RequestArrival { request_id: next_id });
                }
            }
        }

        if !self.backlog.is_empty() {
            // Queue behind earlier backlogged requests.
            self.metrics.record_arrival(AllocationTier::Backlogged);
            debug!("request {} backlogged behind {}", request_id, self.backlog.len());
            self.backlog.push_back(BacklogEntry {
                request_id,
                arrival_us: now_us,
                session_secs,
            });
            self.drain_backlog();
            let deferred = self
                .controller
                .check_proactive_scaling(&mut self.capacity, &self.config.latency);
            self.schedule_all(deferred);
            return;
        }

        let allocation = allocate(&mut self.capacity, &self.config.latency, request_id);
        self.metrics.record_arrival(allocation.tier);

        match allocation.wait_secs {
            None => {
                if self.backlog.is_empty() {
                    warn!(
                        "host ceiling of {} reached at {:.1}s, backlogging requests",
                        self.capacity.max_hosts,
                        self.clock.now_secs()
                    );
                }
                debug!("request {} backlogged", request_id);
                self.backlog.push_back(BacklogEntry {
                    request_id,
                    arrival_us: now_us,
                    session_secs,
                });
            }
            Some(wait_secs) => {
                debug!(
                    "request {} -> {} (wait {:.2}s)",
                    request_id,
                    allocation.tier.name(),
                    wait_secs
                );
                self.schedule_all(allocation.follow_ups);
                let end_us = self
                    .clock
                    .after_secs(wait_secs)
                    .saturating_add(secs_to_us(session_secs));
                self.schedule_event(end_us, SimEvent::SessionEnd { request_id });
                self.metrics.record_served(RequestRecord {
                    request_id,
                    arrival_secs: self.clock.now_secs(),
                    tier: allocation.tier,
                    wait_secs,
                    session_secs,
                });

                if allocation.tier == AllocationTier::WarmUnit {
                    let deferred = self
                        .controller
                        .replenish_warm_units(&mut self.capacity, &self.config.latency);
                    self.schedule_all(deferred);
                }
            }
        }

        let deferred = self
            .controller
            .check_proactive_scaling(&mut self.capacity, &self.config.latency);
        self.schedule_all(deferred);
    }

    /// A finished session returns its unit to the warm pool.
    fn handle_session_end(&mut self, request_id: u64) {
        self.capacity.active_sessions = self.capacity.active_sessions.saturating_sub(1);
        self.capacity.warm_units += 1;
        debug!("session {} ended, warm={}", request_id, self.capacity.warm_units);
        self.drain_backlog();
    }

    fn handle_unit_ready(&mut self, request_id: u64) {
        self.capacity.pending_units = self.capacity.pending_units.saturating_sub(1);
        self.capacity.active_sessions += 1;
        debug!("unit ready for request {}", request_id);
    }

    fn handle_warm_unit_ready(&mut self) {
        self.capacity.pending_units = self.capacity.pending_units.saturating_sub(1);
        self.capacity.warm_units += 1;
        self.drain_backlog();
    }

    fn handle_host_ready(&mut self, reserved_for: Option<u64>, from_standby: bool) {
        self.capacity.pending_hosts = self.capacity.pending_hosts.saturating_sub(1);
        self.capacity.running_hosts += 1;
        if reserved_for.is_some() {
            // The request's unit starts on this host.
            self.capacity.pending_units += 1;
        }
        debug!(
            "{} host ready at {:.1}s, running={}",
            if from_standby { "standby" } else { "cold" },
            self.clock.now_secs(),
            self.capacity.running_hosts
        );
        self.drain_backlog();
        let deferred = self
            .controller
            .replenish_warm_units(&mut self.capacity, &self.config.latency);
        self.schedule_all(deferred);
    }

    fn handle_periodic_check(&mut self) {
        self.drain_backlog();
        let deferred = self
            .controller
            .check_proactive_scaling(&mut self.capacity, &self.config.latency);
        self.schedule_all(deferred);
        let deferred = self
            .controller
            .replenish_warm_units(&mut self.capacity, &self.config.latency);
        self.schedule_all(deferred);

        let next = self
            .clock
            .after_secs(self.config.simulation.check_interval_secs);
        if next <= self.horizon_us {
            self.schedule_event(next, SimEvent::PeriodicCheck);
        }
    }

    /// Serve backlogged requests in arrival order.
    ///
    /// Idle warm units are handed out first; once they run out, free unit
    /// slots start a new unit for the request at the head of the queue.
    fn drain_backlog(&mut self) {
        let mut granted = false;
        while let Some(entry) = self.backlog.front().cloned() {
            let latency = &self.config.latency;
            let wait_secs = if self.capacity.warm_units > 0 {
                self.capacity.warm_units -= 1;
                self.capacity.active_sessions += 1;
                granted = true;
                latency.warm_assign_secs
            } else if self.capacity.available_unit_slots() > 0 {
                self.capacity.pending_units += 1;
                let new_unit_secs = latency.new_unit_secs;
                let ready_us = self.clock.after_secs(new_unit_secs);
                self.schedule_event(
                    ready_us,
                    SimEvent::UnitReadyForRequest {
                        request_id: entry.request_id,
                    },
                );
                new_unit_secs
            } else {
                break;
            };
            self.backlog.pop_front();

            let queued_secs = us_to_secs(self.clock.now_us() - entry.arrival_us);
            let end_us = self
                .clock
                .after_secs(wait_secs)
                .saturating_add(secs_to_us(entry.session_secs));
            self.schedule_event(
                end_us,
                SimEvent::SessionEnd {
                    request_id: entry.request_id,
                },
            );
            debug!(
                "backlogged request {} granted after {:.2}s",
                entry.request_id,
                queued_secs + wait_secs
            );
            self.metrics.record_served(RequestRecord {
                request_id: entry.request_id,
                arrival_secs: us_to_secs(entry.arrival_us),
                tier: AllocationTier::Backlogged,
                wait_secs: queued_secs + wait_secs,
                session_secs: entry.session_secs,
            });
        }

        if granted {
            let deferred = self
                .controller
                .replenish_warm_units(&mut self.capacity, &self.config.latency);
            self.schedule_all(deferred);
        }
    }
}
