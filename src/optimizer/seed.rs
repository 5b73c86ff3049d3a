//! Greedy proportional seed for the capacity search.

use tracing::debug;

use crate::data::{ConstraintSet, CostModel, HourlySeries};
use crate::dispatch::{BatteryParams, Capacities, DispatchSummary, simulate};
use crate::error::PlanError;

use super::OptimizerSettings;

/// Share of the budget the seed allocates to generation; the rest goes to
/// storage.
const GENERATION_SHARE: f64 = 0.8;

/// Multiplier applied per scale-up step when chasing a minimum renewable
/// fraction.
const SCALE_STEP: f64 = 1.25;

/// Upper bound on scale-up steps before declaring the target unreachable.
const MAX_SCALE_STEPS: usize = 64;

/// Builds the initial capacity mix.
///
/// Splits 80% of the budget across solar and wind inversely by an LCOE proxy
/// (`capex / (mean_yield * 8760 * lifetime)`) and 20% to battery, clamped to
/// technology ceilings and to a peak-demand-derived useful capacity so the
/// local search starts near the feasible basin. If a minimum renewable
/// fraction is set and the seed's simulated fraction undershoots it, the
/// generation mix is scaled up uniformly until the target is met.
///
/// # Errors
///
/// Returns `PlanError::Infeasible` when the renewable-fraction target cannot
/// be reached within the budget and ceilings.
pub(super) fn greedy_seed(
    series: &HourlySeries,
    costs: &CostModel,
    constraints: &ConstraintSet,
    battery: &BatteryParams,
    settings: &OptimizerSettings,
) -> Result<Capacities, PlanError> {
    let budget = constraints.max_budget;
    let mean_solar = series.mean_solar_yield();
    let mean_wind = series.mean_wind_yield();
    let peak_demand = series
        .records
        .iter()
        .map(|r| r.demand_kw)
        .fold(0.0_f64, f64::max);

    let lifetime_hours = 8760.0 * settings.lifetime_years as f64;
    let lcoe = |capex: f64, mean_yield: f64| -> f64 {
        if mean_yield > 0.0 {
            capex.max(f64::MIN_POSITIVE) / (mean_yield * lifetime_hours)
        } else {
            f64::INFINITY
        }
    };
    let solar_lcoe = lcoe(costs.solar_capex_per_kw, mean_solar);
    let wind_lcoe = lcoe(costs.wind_capex_per_kw, mean_wind);

    // Inverse-LCOE weights: the cheaper technology gets proportionally more.
    let inv_s = if solar_lcoe.is_finite() { 1.0 / solar_lcoe } else { 0.0 };
    let inv_w = if wind_lcoe.is_finite() { 1.0 / wind_lcoe } else { 0.0 };
    let inv_total = inv_s + inv_w;

    let gen_budget = budget * GENERATION_SHARE;
    let (solar_spend, wind_spend) = if inv_total > 0.0 {
        (gen_budget * inv_s / inv_total, gen_budget * inv_w / inv_total)
    } else {
        (0.0, 0.0)
    };

    // Capacity beyond roughly twice what peak demand can absorb at mean
    // yield is never dispatched; clamping there keeps an oversized budget
    // from seeding an absurd starting point.
    let useful = |mean_yield: f64| {
        if mean_yield > 0.0 {
            2.0 * peak_demand / mean_yield
        } else {
            0.0
        }
    };
    // A zero-capex technology is effectively unlimited; hand it infinity and
    // let the useful-capacity clamp pick the actual seed size.
    let spend_to_kw = |spend: f64, capex: f64| {
        if capex > 0.0 {
            spend / capex
        } else if spend > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    };

    let mut solar_kw = spend_to_kw(solar_spend, costs.solar_capex_per_kw).min(useful(mean_solar));
    let mut wind_kw = spend_to_kw(wind_spend, costs.wind_capex_per_kw).min(useful(mean_wind));
    if let Some(c) = constraints.solar_max_kw {
        solar_kw = solar_kw.min(c);
    }
    if let Some(c) = constraints.wind_max_kw {
        wind_kw = wind_kw.min(c);
    }

    let mut battery_kwh =
        spend_to_kw(budget - gen_budget, costs.battery_capex_per_kwh).min(48.0 * series.mean_demand_kw());
    if let Some(c) = constraints.battery_max_kwh {
        battery_kwh = battery_kwh.min(c);
    }

    let mut caps = Capacities {
        solar_kw,
        wind_kw,
        battery_kwh,
    };
    debug!(
        solar_kw = caps.solar_kw,
        wind_kw = caps.wind_kw,
        battery_kwh = caps.battery_kwh,
        "greedy seed before fraction check"
    );

    let Some(target) = constraints.min_renewable_fraction else {
        return Ok(caps);
    };
    if target <= 0.0 {
        return Ok(caps);
    }

    // Scale generation up uniformly until the simulated fraction meets the
    // target, respecting ceilings and the hard budget.
    for _ in 0..MAX_SCALE_STEPS {
        let trace = simulate(&caps, series, battery);
        let fraction = DispatchSummary::from_trace(&trace, series).renewable_fraction();
        if fraction + 1e-9 >= target {
            return Ok(caps);
        }

        let mut scaled = Capacities {
            solar_kw: caps.solar_kw * SCALE_STEP,
            wind_kw: caps.wind_kw * SCALE_STEP,
            battery_kwh: caps.battery_kwh,
        };
        if let Some(c) = constraints.solar_max_kw {
            scaled.solar_kw = scaled.solar_kw.min(c);
        }
        if let Some(c) = constraints.wind_max_kw {
            scaled.wind_kw = scaled.wind_kw.min(c);
        }
        let stuck = scaled.solar_kw == caps.solar_kw && scaled.wind_kw == caps.wind_kw;
        if stuck || scaled.capital_cost(costs) > budget {
            return Err(PlanError::Infeasible(format!(
                "minimum renewable fraction {target:.2} unreachable: \
                 reached {fraction:.3} before hitting budget/ceilings"
            )));
        }
        caps = scaled;
    }
    Err(PlanError::Infeasible(format!(
        "minimum renewable fraction {target:.2} not reached after {MAX_SCALE_STEPS} scale-ups"
    )))
}
