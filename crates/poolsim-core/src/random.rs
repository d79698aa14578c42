//! Random streams for arrivals and session lengths.
//!
//! The engine draws all randomness through the [`RandomStream`] trait so a
//! run can be replayed from a seed or driven by a scripted stream in tests.

use crate::config::{SessionKind, SessionSection};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal};

/// Session-duration distribution, floored at `min_secs`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionDistribution {
    Exponential {
        mean_secs: f64,
        min_secs: f64,
    },
    Gaussian {
        mean_secs: f64,
        std_secs: f64,
        min_secs: f64,
    },
}

impl SessionDistribution {
    /// Lower bound applied to every draw.
    pub fn min_secs(&self) -> f64 {
        match self {
            SessionDistribution::Exponential { min_secs, .. }
            | SessionDistribution::Gaussian { min_secs, .. } => *min_secs,
        }
    }
}

impl From<&SessionSection> for SessionDistribution {
    fn from(s: &SessionSection) -> Self {
        match s.distribution {
            SessionKind::Exponential => SessionDistribution::Exponential {
                mean_secs: s.mean_secs,
                min_secs: s.min_secs,
            },
            SessionKind::Gaussian => SessionDistribution::Gaussian {
                mean_secs: s.mean_secs,
                std_secs: s.std_secs,
                min_secs: s.min_secs,
            },
        }
    }
}

/// Source of stochastic samples for one simulation run.
pub trait RandomStream: Send {
    /// Time until the next Poisson arrival at `rate_per_sec`.
    ///
    /// Returns `f64::INFINITY` when the rate is not positive.
    fn inter_arrival_secs(&mut self, rate_per_sec: f64) -> f64;

    /// Length of a user session, never below the distribution's floor.
    fn session_duration_secs(&mut self, dist: &SessionDistribution) -> f64;
}

/// ChaCha8-backed stream; identical seeds give identical sequences.
pub struct SeededStream {
    rng: ChaCha8Rng,
}

impl SeededStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomStream for SeededStream {
    fn inter_arrival_secs(&mut self, rate_per_sec: f64) -> f64 {
        if rate_per_sec.is_nan() || rate_per_sec <= 0.0 {
            return f64::INFINITY;
        }
        match Exp::new(rate_per_sec) {
            Ok(exp) => exp.sample(&mut self.rng),
            Err(_) => f64::INFINITY,
        }
    }

    fn session_duration_secs(&mut self, dist: &SessionDistribution) -> f64 {
        let raw = match *dist {
            SessionDistribution::Exponential { mean_secs, .. } => Exp::new(1.0 / mean_secs)
                .map(|exp| exp.sample(&mut self.rng))
                .unwrap_or(mean_secs),
            SessionDistribution::Gaussian {
                mean_secs,
                std_secs,
                ..
            } => Normal::new(mean_secs, std_secs)
                .map(|normal| normal.sample(&mut self.rng))
                .unwrap_or(mean_secs),
        };
        raw.max(dist.min_secs())
    }
}

/// Stream replaying fixed values, cycling when exhausted.
///
/// Used for scripted scenarios where exact timings matter.
pub struct ScriptedStream {
    gaps: Vec<f64>,
    sessions: Vec<f64>,
    gap_idx: usize,
    session_idx: usize,
}

impl ScriptedStream {
    pub fn new(gaps: Vec<f64>, sessions: Vec<f64>) -> Self {
        Self {
            gaps,
            sessions,
            gap_idx: 0,
            session_idx: 0,
        }
    }
}

impl RandomStream for ScriptedStream {
    fn inter_arrival_secs(&mut self, rate_per_sec: f64) -> f64 {
        if rate_per_sec.is_nan() || rate_per_sec <= 0.0 || self.gaps.is_empty() {
            return f64::INFINITY;
        }
        let gap = self.gaps[self.gap_idx % self.gaps.len()];
        self.gap_idx += 1;
        gap
    }

    fn session_duration_secs(&mut self, dist: &SessionDistribution) -> f64 {
        if self.sessions.is_empty() {
            return dist.min_secs();
        }
        let secs = self.sessions[self.session_idx % self.sessions.len()];
        self.session_idx += 1;
        secs.max(dist.min_secs())
    }
}
