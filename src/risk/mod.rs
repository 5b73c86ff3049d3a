//! Monte Carlo sensitivity analysis of a financial base case.
//!
//! Deliberately a single-pass proportional-scaling model: each trial scales
//! the base case's NPV and payback by normally-distributed price/load/
//! generation multipliers rather than re-running the dispatch simulator.
//! This is far cheaper than a structural Monte Carlo and underestimates
//! correlation effects between load and generation variance; keep it this
//! way — changing it changes every numeric output downstream.

pub mod sampling;

use tracing::debug;

use crate::error::PlanError;
use crate::finance::FinancialResult;

pub use sampling::{BoxMuller, FixedSource, NormalSource};

/// Relative standard deviations for the three uncertain inputs.
#[derive(Debug, Clone, Copy)]
pub struct VarianceFactors {
    /// Grid price uncertainty.
    pub price: f64,
    /// Load uncertainty.
    pub load: f64,
    /// Renewable generation uncertainty.
    pub generation: f64,
}

impl Default for VarianceFactors {
    fn default() -> Self {
        Self {
            price: 0.15,
            load: 0.10,
            generation: 0.12,
        }
    }
}

/// Fixed marginal-impact weights for the tornado ranking.
const TORNADO_WEIGHTS: [(&str, f64); 3] =
    [("grid_price", 1.0), ("generation", 0.9), ("load", 0.8)];

/// One variable's ranked marginal impact on NPV.
#[derive(Debug, Clone, Copy)]
pub struct TornadoEntry {
    pub variable: &'static str,
    pub impact: f64,
}

/// Distribution statistics across all Monte Carlo trials.
#[derive(Debug, Clone)]
pub struct SensitivityResult {
    /// Number of trials run.
    pub iterations: usize,
    /// Mean NPV across trials.
    pub expected_npv: f64,
    /// 2.5th percentile of NPV (lower 95% bound).
    pub npv_p2_5: f64,
    /// 97.5th percentile of NPV (upper 95% bound).
    pub npv_p97_5: f64,
    /// 5th percentile of NPV (value at risk).
    pub value_at_risk_p5: f64,
    /// Fraction of trials with strictly positive NPV.
    pub prob_positive_npv: f64,
    /// 95% bounds on payback months; `None` when the base payback is
    /// undefined.
    pub payback_p2_5: Option<f64>,
    /// Upper 95% bound on payback months.
    pub payback_p97_5: Option<f64>,
    /// Variables ranked by marginal NPV impact, descending.
    pub tornado: Vec<TornadoEntry>,
}

/// Nearest-rank percentile of a sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Runs `iterations` randomized trials around the base case.
///
/// Each trial draws three independent standard-normal deviates, scales them
/// by the variance factors, and applies the combined multiplier to the base
/// NPV (payback is divided by it — better outcomes shorten payback).
///
/// # Errors
///
/// Returns `PlanError::Degraded` (recoverable) for zero iterations or a
/// negative variance factor.
pub fn analyze(
    base: &FinancialResult,
    factors: &VarianceFactors,
    iterations: usize,
    source: &mut impl NormalSource,
) -> Result<SensitivityResult, PlanError> {
    if iterations == 0 {
        return Err(PlanError::Degraded(
            "sensitivity: iterations must be > 0".into(),
        ));
    }
    if factors.price < 0.0 || factors.load < 0.0 || factors.generation < 0.0 {
        return Err(PlanError::Degraded(
            "sensitivity: variance factors must be >= 0".into(),
        ));
    }

    let mut npv_trials = Vec::with_capacity(iterations);
    let mut payback_trials = base.payback_months.map(|_| Vec::with_capacity(iterations));

    for _ in 0..iterations {
        let z_price = source.sample();
        let z_load = source.sample();
        let z_gen = source.sample();
        let multiplier = (1.0 + z_price * factors.price)
            * (1.0 + z_load * factors.load)
            * (1.0 + z_gen * factors.generation);

        npv_trials.push(base.npv * multiplier);
        if let (Some(p), Some(trials)) = (base.payback_months, payback_trials.as_mut()) {
            // Guard against a near-zero multiplier exploding the payback.
            trials.push(p / multiplier.max(0.01));
        }
    }

    npv_trials.sort_by(|a, b| a.total_cmp(b));
    let positive = npv_trials.iter().filter(|v| **v > 0.0).count();
    let expected_npv = npv_trials.iter().sum::<f64>() / iterations as f64;

    let (payback_p2_5, payback_p97_5) = match payback_trials.as_mut() {
        Some(trials) => {
            trials.sort_by(|a, b| a.total_cmp(b));
            (
                Some(percentile(trials, 2.5)),
                Some(percentile(trials, 97.5)),
            )
        }
        None => (None, None),
    };

    let mut tornado: Vec<TornadoEntry> = TORNADO_WEIGHTS
        .iter()
        .map(|&(variable, weight)| {
            let factor = match variable {
                "grid_price" => factors.price,
                "generation" => factors.generation,
                _ => factors.load,
            };
            TornadoEntry {
                variable,
                impact: base.npv.abs() * factor * weight,
            }
        })
        .collect();
    tornado.sort_by(|a, b| b.impact.total_cmp(&a.impact));

    debug!(
        iterations,
        expected_npv,
        prob_positive = positive as f64 / iterations as f64,
        "sensitivity trials complete"
    );

    Ok(SensitivityResult {
        iterations,
        expected_npv,
        npv_p2_5: percentile(&npv_trials, 2.5),
        npv_p97_5: percentile(&npv_trials, 97.5),
        value_at_risk_p5: percentile(&npv_trials, 5.0),
        prob_positive_npv: positive as f64 / iterations as f64,
        payback_p2_5,
        payback_p97_5,
        tornado,
    })
}
