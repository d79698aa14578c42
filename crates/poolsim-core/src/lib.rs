//! Poolsim: discrete-event simulator for tiered warm-pool capacity.
//!
//! A request is served by the cheapest-latency capacity tier available:
//! an idle warm unit, a free slot on a running host, a promoted standby
//! host, or a cold-provisioned host. Background replenishment keeps the
//! warm and standby pools near target, and a pluggable trigger from
//! `poolsim-policies` grows the host fleet ahead of demand.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐     ┌───────────┐     ┌──────────────┐
//! │ Arrivals │────▶│  Engine   │────▶│   Metrics    │
//! │ (Poisson)│     │ (Events)  │     │  Collection  │
//! └──────────┘     └─────┬─────┘     └──────────────┘
//!                        │
//!          ┌─────────────┼─────────────┐
//!          ▼             ▼             ▼
//!    ┌──────────┐  ┌──────────┐  ┌──────────┐
//!    │Allocation│  │ Capacity │  │ Scaling  │
//!    │ Cascade  │  │  State   │  │Controller│
//!    └──────────┘  └──────────┘  └────┬─────┘
//!                                     │
//!                               ┌─────┴─────┐
//!                               │  Trigger  │
//!                               │ (policies)│
//!                               └───────────┘
//! ```

pub mod allocation;
pub mod capacity;
pub mod clock;
pub mod config;
pub mod engine;
pub mod event;
pub mod metrics;
pub mod random;
pub mod scaling;
pub mod trials;

// Re-export key types for convenience.
pub use allocation::{allocate, Allocation, AllocationTier};
pub use capacity::CapacityState;
pub use clock::SimClock;
pub use config::{ConfigError, SimConfig};
pub use engine::{DriverState, SimulationEngine};
pub use event::{EventQueue, SimEvent};
pub use metrics::{MetricsCollector, SimulationResult, WaitStatistics};
pub use random::{RandomStream, ScriptedStream, SeededStream, SessionDistribution};
pub use scaling::ScalingController;
pub use trials::{compare_policies, reference_policies, run_simulation, run_trials, TrialSummary};
