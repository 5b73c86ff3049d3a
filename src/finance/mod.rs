//! Financial evaluation of a capacity plan against the grid-only baseline.

pub mod vppa;

pub use vppa::{VppaContract, VppaResult, VppaYear};

use crate::data::CostModel;
use crate::dispatch::DispatchSummary;
use crate::optimizer::{CapacitySolution, discount_sum};

/// Discounting horizon for ownership economics.
#[derive(Debug, Clone, Copy)]
pub struct FinanceSettings {
    /// NPV horizon (years).
    pub horizon_years: u32,
    /// Annual discount rate.
    pub discount_rate: f64,
}

impl Default for FinanceSettings {
    fn default() -> Self {
        Self {
            horizon_years: 10,
            discount_rate: 0.07,
        }
    }
}

/// Ownership economics of a plan.
///
/// `payback_months` and `irr` are `None` when undefined (non-positive savings
/// or zero CAPEX respectively) rather than infinite or NaN.
#[derive(Debug, Clone, Copy)]
pub struct FinancialResult {
    /// Total capital expenditure.
    pub capex: f64,
    /// Annual operating cost of the installed mix.
    pub annual_opex: f64,
    /// Annual carbon cost of remaining grid imports.
    pub annual_carbon_cost: f64,
    /// Share of consumption met by renewables.
    pub renewable_fraction: f64,
    /// Annual cost savings vs. buying everything from the grid.
    pub annual_savings: f64,
    /// Annual CO2 reduction vs. the grid-only baseline (kg).
    pub annual_co2_reduction_kg: f64,
    /// Months to recover CAPEX from savings; `None` when savings <= 0.
    pub payback_months: Option<f64>,
    /// Net present value of savings over the horizon, minus CAPEX.
    pub npv: f64,
    /// Simple-ratio IRR proxy (`annual_savings / capex`); `None` when CAPEX
    /// is zero. Deliberately not a root-finding IRR, for parity with the
    /// ratio the planner has always reported.
    pub irr: Option<f64>,
}

/// Evaluates the ownership economics of an accepted plan.
pub fn evaluate(
    solution: &CapacitySolution,
    summary: &DispatchSummary,
    costs: &CostModel,
    settings: &FinanceSettings,
) -> FinancialResult {
    let capex = solution.capital_cost;
    let annual_opex = solution.capacities.annual_opex(costs);
    let annual_carbon_cost = summary.grid_emissions_kg * costs.carbon_cost_per_kg;
    let annual_savings = summary.baseline_cost - (summary.grid_cost + annual_opex);

    let payback_months = if annual_savings > 0.0 {
        Some(capex / annual_savings * 12.0)
    } else {
        None
    };
    let npv = annual_savings * discount_sum(settings.discount_rate, settings.horizon_years) - capex;
    let irr = if capex > 0.0 {
        Some(annual_savings / capex)
    } else {
        None
    };

    FinancialResult {
        capex,
        annual_opex,
        annual_carbon_cost,
        renewable_fraction: summary.renewable_fraction(),
        annual_savings,
        annual_co2_reduction_kg: summary.baseline_emissions_kg - summary.grid_emissions_kg,
        payback_months,
        npv,
        irr,
    }
}
