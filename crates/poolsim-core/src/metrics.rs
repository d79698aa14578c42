//! Metrics collection and aggregation for simulation runs.
//!
//! Tracks per-request allocation records and a capacity time series, then
//! derives wait-time percentiles, tier distribution, host averages and the
//! monthly cost estimate once the run has drained.

use crate::allocation::AllocationTier;
use crate::capacity::CapacityState;
use crate::config::SimConfig;
use serde::{Deserialize, Serialize};

/// Per-request allocation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub request_id: u64,
    pub arrival_secs: f64,
    pub tier: AllocationTier,
    pub wait_secs: f64,
    pub session_secs: f64,
}

/// Capacity counters after one dispatched event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    pub time_secs: f64,
    pub running_hosts: u32,
    pub standby_hosts: u32,
    pub pending_hosts: u32,
    pub active_sessions: u32,
    pub warm_units: u32,
    pub pending_units: u32,
}

impl CapacitySnapshot {
    pub fn capture(time_secs: f64, state: &CapacityState) -> Self {
        Self {
            time_secs,
            running_hosts: state.running_hosts,
            standby_hosts: state.standby_hosts,
            pending_hosts: state.pending_hosts,
            active_sessions: state.active_sessions,
            warm_units: state.warm_units,
            pending_units: state.pending_units,
        }
    }
}

/// Wait-time distribution summary, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitStatistics {
    pub count: u64,
    pub mean: f64,
    pub min: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

impl WaitStatistics {
    /// Summarize a set of waits; all zeros when empty.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = sorted.len();

        Self {
            count: n as u64,
            mean: sorted.iter().sum::<f64>() / n as f64,
            min: sorted[0],
            p50: percentile_sorted(&sorted, 0.50),
            p90: percentile_sorted(&sorted, 0.90),
            p95: percentile_sorted(&sorted, 0.95),
            p99: percentile_sorted(&sorted, 0.99),
            max: sorted[n - 1],
        }
    }
}

/// `sorted[floor(n * fraction)]`, clamped to the last element.
fn percentile_sorted(sorted: &[f64], fraction: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (sorted.len() as f64 * fraction) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Requests per allocation tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub warm_unit: u64,
    pub spare_slot: u64,
    pub standby_host: u64,
    pub cold_host: u64,
    pub backlogged: u64,
}

impl TierCounts {
    pub fn record(&mut self, tier: AllocationTier) {
        *self.slot(tier) += 1;
    }

    pub fn get(&self, tier: AllocationTier) -> u64 {
        match tier {
            AllocationTier::WarmUnit => self.warm_unit,
            AllocationTier::SpareSlot => self.spare_slot,
            AllocationTier::StandbyHost => self.standby_host,
            AllocationTier::ColdHost => self.cold_host,
            AllocationTier::Backlogged => self.backlogged,
        }
    }

    pub fn total(&self) -> u64 {
        AllocationTier::ALL.iter().map(|t| self.get(*t)).sum()
    }

    fn slot(&mut self, tier: AllocationTier) -> &mut u64 {
        match tier {
            AllocationTier::WarmUnit => &mut self.warm_unit,
            AllocationTier::SpareSlot => &mut self.spare_slot,
            AllocationTier::StandbyHost => &mut self.standby_host,
            AllocationTier::ColdHost => &mut self.cold_host,
            AllocationTier::Backlogged => &mut self.backlogged,
        }
    }
}

/// Share of served requests that waited longer than a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitExceedance {
    pub threshold_secs: f64,
    pub fraction: f64,
}

/// Aggregated result of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Policy name from the configuration.
    pub policy: String,
    /// Scaling trigger in effect.
    pub trigger: String,
    pub seed: u64,
    /// Simulated time at which the run drained.
    pub duration_secs: f64,
    /// Arrivals, served or not.
    pub total_requests: u64,
    pub tiers: TierCounts,
    /// Fraction of arrivals served by a warm unit.
    pub instant_ratio: f64,
    /// Waits of served requests only.
    pub wait: WaitStatistics,
    /// Shares of served requests above each configured threshold.
    pub wait_exceedance: Vec<WaitExceedance>,
    /// Waits of requests still backlogged at the horizon, measured up to
    /// the horizon. Lower bounds on what those requests would have waited.
    pub unserved_wait: WaitStatistics,
    /// Time-weighted mean of running hosts over the whole horizon.
    pub avg_running_hosts: f64,
    pub peak_running_hosts: u32,
    pub monthly_cost: f64,
    /// Hosts started by the proactive trigger.
    pub proactive_hosts: u64,
    /// Backlogged requests never granted a unit before the horizon.
    pub unserved_requests: u64,
    pub events_processed: u64,
    /// Per-request history in service order.
    pub requests: Vec<RequestRecord>,
    /// Capacity after every dispatched event.
    pub snapshots: Vec<CapacitySnapshot>,
}

impl SimulationResult {
    /// True when no request arrived.
    pub fn is_empty(&self) -> bool {
        self.total_requests == 0
    }

    /// Wait times in the order requests were served.
    pub fn wait_times(&self) -> Vec<f64> {
        self.requests.iter().map(|r| r.wait_secs).collect()
    }
}

/// Run-level counters handed to [`MetricsCollector::aggregate`].
#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    pub trigger: &'a str,
    pub seed: u64,
    pub end_secs: f64,
    pub horizon_secs: f64,
    pub events_processed: u64,
    pub proactive_hosts: u64,
    /// Censored waits of requests left in the backlog.
    pub unserved_waits_secs: Vec<f64>,
}

/// Collector that accumulates history during a run.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    records: Vec<RequestRecord>,
    snapshots: Vec<CapacitySnapshot>,
    tiers: TierCounts,
    arrivals: u64,
    initial_running_hosts: u32,
}

impl MetricsCollector {
    pub fn new(initial_running_hosts: u32) -> Self {
        Self {
            records: Vec::new(),
            snapshots: Vec::new(),
            tiers: TierCounts::default(),
            arrivals: 0,
            initial_running_hosts,
        }
    }

    /// Count an arrival and the tier it was routed to.
    pub fn record_arrival(&mut self, tier: AllocationTier) {
        self.arrivals += 1;
        self.tiers.record(tier);
    }

    /// Record a request whose wait is now known.
    pub fn record_served(&mut self, record: RequestRecord) {
        self.records.push(record);
    }

    pub fn record_snapshot(&mut self, snapshot: CapacitySnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    pub fn snapshots(&self) -> &[CapacitySnapshot] {
        &self.snapshots
    }

    pub fn arrivals(&self) -> u64 {
        self.arrivals
    }

    /// Running hosts averaged over simulated time up to `until_secs`.
    ///
    /// Each snapshot's host count holds until the next snapshot, and the
    /// last one holds until `until_secs`. With no elapsed time the latest
    /// observed count is returned.
    pub fn avg_running_hosts(&self, until_secs: f64) -> f64 {
        let mut prev_time = 0.0;
        let mut prev_hosts = self.initial_running_hosts as f64;
        let mut area = 0.0;
        for snap in &self.snapshots {
            area += prev_hosts * (snap.time_secs - prev_time);
            prev_time = snap.time_secs;
            prev_hosts = snap.running_hosts as f64;
        }
        if until_secs > prev_time {
            area += prev_hosts * (until_secs - prev_time);
            prev_time = until_secs;
        }
        if prev_time > 0.0 {
            area / prev_time
        } else {
            prev_hosts
        }
    }

    /// Derive the final result. Safe on an empty history.
    pub fn aggregate(&self, config: &SimConfig, run: RunSummary<'_>) -> SimulationResult {
        let waits: Vec<f64> = self.records.iter().map(|r| r.wait_secs).collect();
        let served = waits.len();

        let wait_exceedance = config
            .statistics
            .wait_thresholds_secs
            .iter()
            .map(|&threshold_secs| WaitExceedance {
                threshold_secs,
                fraction: if served == 0 {
                    0.0
                } else {
                    waits.iter().filter(|&&w| w > threshold_secs).count() as f64 / served as f64
                },
            })
            .collect();

        let avg_running_hosts = self.avg_running_hosts(run.horizon_secs);
        let peak_running_hosts = self
            .snapshots
            .iter()
            .map(|s| s.running_hosts)
            .max()
            .unwrap_or(self.initial_running_hosts)
            .max(self.initial_running_hosts);

        let cost = &config.cost;
        let monthly_cost = avg_running_hosts * cost.running_host_hourly * cost.billing_hours_per_month
            + config.capacity.standby_pool_size as f64
                * cost.standby_host_hourly
                * cost.billing_hours_per_month;

        SimulationResult {
            policy: config.simulation.name.clone(),
            trigger: run.trigger.to_string(),
            seed: run.seed,
            duration_secs: run.end_secs,
            total_requests: self.arrivals,
            tiers: self.tiers.clone(),
            instant_ratio: if self.arrivals > 0 {
                self.tiers.warm_unit as f64 / self.arrivals as f64
            } else {
                0.0
            },
            wait: WaitStatistics::from_values(&waits),
            wait_exceedance,
            unserved_wait: WaitStatistics::from_values(&run.unserved_waits_secs),
            avg_running_hosts,
            peak_running_hosts,
            monthly_cost,
            proactive_hosts: run.proactive_hosts,
            unserved_requests: run.unserved_waits_secs.len() as u64,
            events_processed: run.events_processed,
            requests: self.records.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}
