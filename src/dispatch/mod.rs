//! Deterministic hourly dispatch: capacities in, per-hour allocation out.

pub mod battery;
pub mod simulator;

pub use battery::BatteryParams;
pub use simulator::{DispatchRecord, DispatchSummary, dispatch_hour, simulate};

use crate::data::CostModel;

/// The sizing decision vector: installed capacity per technology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capacities {
    /// Installed solar capacity (kW).
    pub solar_kw: f64,
    /// Installed wind capacity (kW).
    pub wind_kw: f64,
    /// Installed battery capacity (kWh).
    pub battery_kwh: f64,
}

impl Capacities {
    pub const ZERO: Self = Self {
        solar_kw: 0.0,
        wind_kw: 0.0,
        battery_kwh: 0.0,
    };

    /// Total capital cost of this mix under the given cost model.
    pub fn capital_cost(&self, costs: &CostModel) -> f64 {
        self.solar_kw * costs.solar_capex_per_kw
            + self.wind_kw * costs.wind_capex_per_kw
            + self.battery_kwh * costs.battery_capex_per_kwh
    }

    /// Annual operating cost of this mix.
    pub fn annual_opex(&self, costs: &CostModel) -> f64 {
        self.solar_kw * costs.solar_opex_per_kw_yr
            + self.wind_kw * costs.wind_opex_per_kw_yr
            + self.battery_kwh * costs.battery_opex_per_kwh_yr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs() -> CostModel {
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

    #[test]
    fn capital_cost_sums_per_technology() {
        let c = Capacities {
            solar_kw: 10.0,
            wind_kw: 5.0,
            battery_kwh: 20.0,
        };
        let expected = 10.0 * 900.0 + 5.0 * 1300.0 + 20.0 * 350.0;
        assert!((c.capital_cost(&costs()) - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_mix_costs_nothing() {
        assert_eq!(Capacities::ZERO.capital_cost(&costs()), 0.0);
        assert_eq!(Capacities::ZERO.annual_opex(&costs()), 0.0);
    }
}
