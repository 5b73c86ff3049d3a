//! Virtual power purchase agreement settlement.
//!
//! A VPPA is a financial hedge settled against a market reference price with
//! no physical delivery: each contract year the buyer receives (market −
//! strike) × contracted generation, plus the value of the renewable
//! certificates. The market price path is a per-year forward curve, either
//! supplied by the caller or looked up from a region-keyed default table.

use crate::error::PlanError;
use crate::optimizer::discount_sum;

/// VPPA contract terms.
#[derive(Debug, Clone)]
pub struct VppaContract {
    /// Market region used to look up a default forward curve.
    pub region: String,
    /// Fixed strike price (currency/kWh).
    pub strike_price: f64,
    /// Contracted annual volume (kWh/yr).
    pub contract_kwh_per_year: f64,
    /// Contract term (years).
    pub term_years: u32,
    /// Renewable-certificate value (currency/kWh).
    pub rec_price_per_kwh: f64,
    /// Discount rate for the levelized-cost calculation.
    pub discount_rate: f64,
}

/// One contract year of the settlement.
#[derive(Debug, Clone, Copy)]
pub struct VppaYear {
    /// Contract year, starting at 1.
    pub year: u32,
    /// Forward market price for this year (currency/kWh).
    pub market_price: f64,
    /// Energy settled this year (kWh).
    pub settled_kwh: f64,
    /// (market − strike) × settled energy.
    pub settlement: f64,
    /// Certificate value for the settled energy.
    pub rec_value: f64,
    /// Settlement plus certificate value.
    pub net: f64,
}

/// Full settlement of a VPPA over its term.
#[derive(Debug, Clone)]
pub struct VppaResult {
    /// Per-year settlement rows.
    pub yearly: Vec<VppaYear>,
    /// Running sum of net benefit by year.
    pub cumulative: Vec<f64>,
    /// Total net benefit over the term.
    pub contract_value: f64,
    /// Levelized cost of the contracted energy, net of certificate value.
    pub lcoe: f64,
    /// 0–100 score; lower forward-curve volatility scores higher.
    pub hedge_effectiveness: f64,
}

/// Default forward curves by region (currency/kWh, one entry per year).
///
/// Coarse planning defaults, not market data; callers with a real curve
/// should pass it explicitly.
pub fn default_forward_curve(region: &str) -> Option<&'static [f64]> {
    match region {
        "ercot" => Some(&[
            0.038, 0.041, 0.044, 0.046, 0.049, 0.051, 0.054, 0.056, 0.058, 0.060,
        ]),
        "pjm" => Some(&[
            0.045, 0.047, 0.049, 0.051, 0.053, 0.055, 0.057, 0.059, 0.061, 0.063,
        ]),
        "caiso" => Some(&[
            0.052, 0.055, 0.058, 0.060, 0.063, 0.066, 0.068, 0.071, 0.073, 0.075,
        ]),
        "nordpool" => Some(&[
            0.041, 0.043, 0.044, 0.046, 0.048, 0.049, 0.051, 0.052, 0.054, 0.055,
        ]),
        _ => None,
    }
}

/// Settles a VPPA against the plan's annual renewable generation.
///
/// The settled volume each year is the contracted volume capped at what the
/// plant actually generates; an oversized contract cannot settle energy that
/// was never produced. A forward curve shorter than the term is extended
/// with its final price.
///
/// # Errors
///
/// Returns `PlanError::Degraded` (recoverable) for an unknown region with no
/// caller-supplied curve, or for malformed contract terms — the pipeline
/// drops the VPPA block and continues.
pub fn settle(
    contract: &VppaContract,
    annual_generation_kwh: f64,
    forward_curve: Option<&[f64]>,
) -> Result<VppaResult, PlanError> {
    if contract.term_years == 0 {
        return Err(PlanError::Degraded("vppa: term_years must be > 0".into()));
    }
    if contract.strike_price < 0.0
        || contract.contract_kwh_per_year < 0.0
        || contract.rec_price_per_kwh < 0.0
    {
        return Err(PlanError::Degraded(
            "vppa: strike, volume, and REC price must be >= 0".into(),
        ));
    }

    let base_curve: &[f64] = match forward_curve {
        Some(c) if !c.is_empty() => c,
        Some(_) => {
            return Err(PlanError::Degraded("vppa: forward curve is empty".into()));
        }
        None => default_forward_curve(&contract.region).ok_or_else(|| {
            PlanError::Degraded(format!(
                "vppa: no default forward curve for region \"{}\"",
                contract.region
            ))
        })?,
    };

    let settled_kwh = contract.contract_kwh_per_year.min(annual_generation_kwh);
    let last_price = *base_curve.last().unwrap_or(&0.0);

    let mut yearly = Vec::with_capacity(contract.term_years as usize);
    let mut cumulative = Vec::with_capacity(contract.term_years as usize);
    let mut running = 0.0;
    for year in 1..=contract.term_years {
        let market_price = base_curve
            .get((year - 1) as usize)
            .copied()
            .unwrap_or(last_price);
        let settlement = (market_price - contract.strike_price) * settled_kwh;
        let rec_value = contract.rec_price_per_kwh * settled_kwh;
        let net = settlement + rec_value;
        running += net;
        cumulative.push(running);
        yearly.push(VppaYear {
            year,
            market_price,
            settled_kwh,
            settlement,
            rec_value,
            net,
        });
    }

    // Levelized: discounted strike payments net of REC value over discounted
    // energy. With a flat volume this collapses to strike − REC price.
    let discounted_energy = settled_kwh * discount_sum(contract.discount_rate, contract.term_years);
    let lcoe = if discounted_energy > 0.0 {
        let discounted_payments = (contract.strike_price - contract.rec_price_per_kwh)
            * settled_kwh
            * discount_sum(contract.discount_rate, contract.term_years);
        discounted_payments / discounted_energy
    } else {
        0.0
    };

    Ok(VppaResult {
        contract_value: running,
        hedge_effectiveness: hedge_effectiveness(&yearly),
        yearly,
        cumulative,
        lcoe,
    })
}

/// Hedge effectiveness from the coefficient of variation of the forward
/// prices actually used: `100 × (1 − cv)` clamped to [0, 100].
fn hedge_effectiveness(yearly: &[VppaYear]) -> f64 {
    if yearly.is_empty() {
        return 0.0;
    }
    let n = yearly.len() as f64;
    let mean = yearly.iter().map(|y| y.market_price).sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let var = yearly
        .iter()
        .map(|y| (y.market_price - mean).powi(2))
        .sum::<f64>()
        / n;
    let cv = var.sqrt() / mean;
    (100.0 * (1.0 - cv)).clamp(0.0, 100.0)
}
