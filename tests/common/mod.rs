//! Shared test fixtures for integration tests.

use renplan::data::{ConstraintSet, CostModel, HourlySeries, SyntheticProfile};
use renplan::dispatch::BatteryParams;
use renplan::optimizer::OptimizerSettings;

/// One-week synthetic series (seed 42).
pub fn week_series() -> HourlySeries {
    SyntheticProfile {
        hours: 168,
        ..SyntheticProfile::default()
    }
    .build()
}

/// Default cost model matching the baseline preset.
pub fn default_costs() -> CostModel {
    CostModel {
        solar_capex_per_kw: 900.0,
        wind_capex_per_kw: 1300.0,
        battery_capex_per_kwh: 350.0,
        solar_opex_per_kw_yr: 15.0,
        wind_opex_per_kw_yr: 40.0,
        battery_opex_per_kwh_yr: 8.0,
        carbon_cost_per_kg: 0.05,
    }
}

/// Constraints with the given budget, no ceilings, no mandate.
pub fn constraints_with_budget(max_budget: f64) -> ConstraintSet {
    ConstraintSet {
        max_budget,
        solar_max_kw: None,
        wind_max_kw: None,
        battery_max_kwh: None,
        min_renewable_fraction: None,
        round_trip_efficiency: 0.90,
    }
}

/// Default battery operating envelope.
pub fn default_battery() -> BatteryParams {
    BatteryParams::default()
}

/// Optimizer settings with the standard iteration cap.
pub fn default_optimizer() -> OptimizerSettings {
    OptimizerSettings::default()
}
