//! Lifetime-cost objective backed by the dispatch simulator.

use crate::data::{CostModel, HourlySeries};
use crate::dispatch::{BatteryParams, Capacities, DispatchSummary, simulate};

use super::OptimizerSettings;
use super::search::Objective;

/// Sum of discount factors `1/(1+r)^y` for years 1..=`years`.
pub fn discount_sum(rate: f64, years: u32) -> f64 {
    (1..=years).map(|y| (1.0 + rate).powi(-(y as i32))).sum()
}

/// CAPEX plus lifetime-discounted (OPEX + grid cost + carbon cost).
///
/// Every evaluation runs one full dispatch pass over the series; this is the
/// dominant cost of the search, which is why the iteration cap exists.
pub struct LifetimeCostObjective<'a> {
    series: &'a HourlySeries,
    costs: &'a CostModel,
    battery: BatteryParams,
    discount: f64,
}

impl<'a> LifetimeCostObjective<'a> {
    pub fn new(
        series: &'a HourlySeries,
        costs: &'a CostModel,
        battery: BatteryParams,
        settings: &OptimizerSettings,
    ) -> Self {
        Self {
            series,
            costs,
            battery,
            discount: discount_sum(settings.discount_rate, settings.lifetime_years),
        }
    }
}

impl Objective for LifetimeCostObjective<'_> {
    fn cost(&self, caps: &Capacities) -> f64 {
        let trace = simulate(caps, self.series, &self.battery);
        let summary = DispatchSummary::from_trace(&trace, self.series);
        let annual = caps.annual_opex(self.costs)
            + summary.grid_cost
            + summary.grid_emissions_kg * self.costs.carbon_cost_per_kg;
        caps.capital_cost(self.costs) + annual * self.discount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HourlyRecord;

    fn series() -> HourlySeries {
        HourlySeries::new(
            (0..24)
                .map(|hour| HourlyRecord {
                    hour,
                    demand_kw: 100.0,
                    solar_yield: if (6..18).contains(&(hour % 24)) { 0.8 } else { 0.0 },
                    wind_yield: 0.2,
                    grid_price: 0.15,
                    grid_carbon: 0.4,
                })
                .collect(),
        )
    }

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
    fn discount_sum_matches_closed_form() {
        // Annuity factor: (1 - (1+r)^-n) / r.
        let r: f64 = 0.07;
        let n: i32 = 25;
        let expected = (1.0 - (1.0 + r).powi(-n)) / r;
        assert!((discount_sum(r, n as u32) - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_rate_discount_sum_is_year_count() {
        assert!((discount_sum(0.0, 10) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn all_grid_plan_costs_only_grid_and_carbon() {
        let s = series();
        let c = costs();
        let obj = LifetimeCostObjective::new(&s, &c, BatteryParams::default(), &OptimizerSettings::default());
        let grid_only = obj.cost(&Capacities::ZERO);
        // No CAPEX, no OPEX: pure discounted grid + carbon cost.
        let annual = 100.0 * 24.0 * 365.0 * (0.15 + 0.4 * 0.05);
        let expected = annual * discount_sum(0.07, 25);
        assert!((grid_only - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn some_solar_beats_all_grid_here() {
        let s = series();
        let c = costs();
        let obj = LifetimeCostObjective::new(&s, &c, BatteryParams::default(), &OptimizerSettings::default());
        let with_solar = obj.cost(&Capacities {
            solar_kw: 100.0,
            wind_kw: 0.0,
            battery_kwh: 0.0,
        });
        assert!(with_solar < obj.cost(&Capacities::ZERO));
    }
}
