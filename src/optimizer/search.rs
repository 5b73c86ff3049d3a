//! Local-search refinement over the capacity decision vector.

use tracing::debug;

use crate::data::{ConstraintSet, CostModel};
use crate::dispatch::Capacities;

use super::OptimizerSettings;

/// Candidate scoring function injected into the search.
///
/// Production code passes the simulator-backed lifetime-cost objective; tests
/// substitute cheap synthetic objectives so search logic is exercised without
/// the simulator.
pub trait Objective {
    /// Total cost of a candidate mix; lower is better.
    fn cost(&self, caps: &Capacities) -> f64;
}

impl<F: Fn(&Capacities) -> f64> Objective for F {
    fn cost(&self, caps: &Capacities) -> f64 {
        self(caps)
    }
}

/// Result of the refinement loop.
#[derive(Debug, Clone, Copy)]
pub(super) struct SearchOutcome {
    pub caps: Capacities,
    pub objective: f64,
    /// Accepted improvement steps; zero means the seed was already a local
    /// optimum, which is a valid outcome.
    pub iterations: usize,
}

/// Per-axis minimum step sizes (typical capacity scales).
#[derive(Debug, Clone, Copy)]
pub(super) struct StepScale {
    pub solar_kw: f64,
    pub wind_kw: f64,
    pub battery_kwh: f64,
}

/// Perturbation step: 10% of the current value, floored at the axis scale.
const STEP_FRACTION: f64 = 0.1;

fn feasible(caps: &Capacities, costs: &CostModel, constraints: &ConstraintSet) -> bool {
    if caps.solar_kw < 0.0 || caps.wind_kw < 0.0 || caps.battery_kwh < 0.0 {
        return false;
    }
    if let Some(c) = constraints.solar_max_kw
        && caps.solar_kw > c
    {
        return false;
    }
    if let Some(c) = constraints.wind_max_kw
        && caps.wind_kw > c
    {
        return false;
    }
    if let Some(c) = constraints.battery_max_kwh
        && caps.battery_kwh > c
    {
        return false;
    }
    // Budget is a hard constraint with zero tolerance.
    caps.capital_cost(costs) <= constraints.max_budget
}

/// Refines the seed by first-improvement local search.
///
/// Each iteration probes six directions (± on each axis) and accepts the
/// first candidate that improves the objective by more than the convergence
/// threshold. Stops at a local optimum or at the iteration cap; an iteration
/// evaluates at most six candidates, so total objective evaluations are
/// bounded by `6 * max_iterations`.
///
/// `accept` is an extra feasibility gate on top of budget and ceilings; the
/// optimizer uses it to hold the renewable-fraction mandate, which needs a
/// dispatch simulation to check.
pub(super) fn refine(
    seed: Capacities,
    costs: &CostModel,
    constraints: &ConstraintSet,
    settings: &OptimizerSettings,
    scale: StepScale,
    objective: &impl Objective,
    accept: &dyn Fn(&Capacities) -> bool,
) -> SearchOutcome {
    let mut current = seed;
    let mut current_cost = objective.cost(&current);
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        let solar_step = (current.solar_kw * STEP_FRACTION).max(scale.solar_kw);
        let wind_step = (current.wind_kw * STEP_FRACTION).max(scale.wind_kw);
        let battery_step = (current.battery_kwh * STEP_FRACTION).max(scale.battery_kwh);

        let candidates = [
            Capacities {
                solar_kw: current.solar_kw + solar_step,
                ..current
            },
            Capacities {
                solar_kw: (current.solar_kw - solar_step).max(0.0),
                ..current
            },
            Capacities {
                wind_kw: current.wind_kw + wind_step,
                ..current
            },
            Capacities {
                wind_kw: (current.wind_kw - wind_step).max(0.0),
                ..current
            },
            Capacities {
                battery_kwh: current.battery_kwh + battery_step,
                ..current
            },
            Capacities {
                battery_kwh: (current.battery_kwh - battery_step).max(0.0),
                ..current
            },
        ];

        let mut improved = false;
        for candidate in candidates {
            if candidate == current || !feasible(&candidate, costs, constraints) {
                continue;
            }
            if !accept(&candidate) {
                continue;
            }
            let cost = objective.cost(&candidate);
            if current_cost - cost > settings.convergence_threshold {
                debug!(
                    iteration = iterations,
                    objective = cost,
                    solar_kw = candidate.solar_kw,
                    wind_kw = candidate.wind_kw,
                    battery_kwh = candidate.battery_kwh,
                    "accepted perturbation"
                );
                current = candidate;
                current_cost = cost;
                improved = true;
                break;
            }
        }
        if !improved {
            break;
        }
        iterations += 1;
    }

    SearchOutcome {
        caps: current,
        objective: current_cost,
        iterations,
    }
}
