// Daywatch - Synthetic activity generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Synthetic day-series generation.
//!
//! Each event draws one batch of day-values from a normal distribution
//! parameterized by its target mean and standard deviation, then the batch
//! is accepted or redrawn whole based on its empirical statistics.

use crate::error::GenerateError;
use crate::schema::{EventEntry, EventKind, EventTable};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Default ceiling on whole-batch redraws before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of day-values per event.
    pub days: usize,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Retry ceiling for the rejection-sampling loop.
    pub max_attempts: usize,
}

impl GeneratorConfig {
    /// Create a config for the given simulation length.
    pub fn new(days: usize) -> Self {
        Self {
            days,
            seed: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the retry ceiling.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// One event's ordered sequence of day-values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySeries {
    /// Event name.
    pub event: String,
    /// One value per simulated day.
    pub values: Vec<f64>,
}

impl DaySeries {
    /// Number of days.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Generate one series per table entry, in table order.
///
/// A single RNG drives the whole run: seeded from the config when a seed
/// is present, from entropy otherwise.
pub fn generate_activity(
    table: &EventTable,
    config: &GeneratorConfig,
) -> Result<Vec<DaySeries>, GenerateError> {
    let mut rng: Box<dyn RngCore> = match config.seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(StdRng::from_entropy()),
    };

    table
        .entries()
        .iter()
        .map(|entry| generate_series(entry, config.days, config.max_attempts, &mut *rng))
        .collect()
}

/// Generate a day-series for one event by bounded rejection sampling.
///
/// Samples are rounded per the event kind before any check. The range
/// check against [minimum, maximum] is advisory: out-of-range samples are
/// counted and reported, never redrawn individually. The whole batch is
/// redrawn until its empirical mean and sample standard deviation land
/// within tolerance of the targets (±5% for 10 days or more, ±10% below),
/// or until `max_attempts` rejections.
pub fn generate_series(
    entry: &EventEntry,
    days: usize,
    max_attempts: usize,
    rng: &mut dyn RngCore,
) -> Result<DaySeries, GenerateError> {
    let def = &entry.definition;
    let params = &entry.params;

    if days == 0 {
        return Ok(DaySeries {
            event: def.name.clone(),
            values: Vec::new(),
        });
    }

    // Zero spread: the batch is the rounded mean repeated, acceptance
    // is trivially true.
    if params.stddev == 0.0 {
        let value = round_value(params.mean, def.kind);
        if value < def.minimum || value > def.maximum {
            warn!(
                "constant value {} for {} falls outside [{}, {}]",
                value, def.name, def.minimum, def.maximum
            );
        }
        return Ok(DaySeries {
            event: def.name.clone(),
            values: vec![value; days],
        });
    }

    let normal = Normal::new(params.mean, params.stddev).map_err(|e| {
        GenerateError::InvalidDistribution {
            event: def.name.clone(),
            reason: e.to_string(),
        }
    })?;

    let tolerance = if days >= 10 { 0.05 } else { 0.10 };

    for attempt in 1..=max_attempts {
        let mut values: Vec<f64> = (0..days).map(|_| normal.sample(&mut *rng)).collect();

        let mut out_of_range = 0usize;
        for value in &mut values {
            *value = round_value(*value, def.kind);
            // Advisory range check: noted, not enforced.
            if *value < def.minimum || *value > def.maximum {
                out_of_range += 1;
            }
        }

        if batch_accepted(&values, params.mean, params.stddev, tolerance) {
            if out_of_range > 0 {
                warn!(
                    "{} of {} samples for {} fall outside [{}, {}]",
                    out_of_range, days, def.name, def.minimum, def.maximum
                );
            }
            trace!("accepted batch for {} after {} attempt(s)", def.name, attempt);
            return Ok(DaySeries {
                event: def.name.clone(),
                values,
            });
        }
    }

    Err(GenerateError::RetryLimitExceeded {
        event: def.name.clone(),
        attempts: max_attempts,
    })
}

/// Round a raw sample per the event kind: nearest integer for discrete
/// events, 2 decimal places for continuous ones.
fn round_value(value: f64, kind: EventKind) -> f64 {
    match kind {
        EventKind::Discrete => value.round(),
        EventKind::Continuous => (value * 100.0).round() / 100.0,
    }
}

/// Acceptance test on the batch's empirical statistics.
///
/// The spread check uses the sample standard deviation (n − 1) and passes
/// trivially for batches too short to define one.
fn batch_accepted(values: &[f64], target_mean: f64, target_stddev: f64, tolerance: f64) -> bool {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if (mean - target_mean).abs() > tolerance * target_mean.abs() {
        return false;
    }

    if values.len() < 2 {
        return true;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (variance.sqrt() - target_stddev).abs() <= tolerance * target_stddev
}
