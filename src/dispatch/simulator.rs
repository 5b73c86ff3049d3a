//! Hourly dispatch simulation.
//!
//! The simulator is a pure fold over the hourly series threading battery
//! state of charge through an explicit `(soc) -> (soc', DispatchRecord)`
//! transition. There is no randomness anywhere in dispatch: identical inputs
//! produce bit-identical traces, which the optimizer relies on.

use crate::data::{HourlyRecord, HourlySeries};

use super::battery::BatteryParams;
use super::Capacities;

/// Energy allocation for one hour.
///
/// Invariant: `solar_kw + wind_kw + discharge_kw + grid_kw == demand_kw`
/// (the energy-balance identity), and `0 <= soc_kwh <= battery_kwh`.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRecord {
    /// Hour index, copied from the input record.
    pub hour: usize,
    /// Demand served this hour (kW).
    pub demand_kw: f64,
    /// Solar generation delivered to the load (kW).
    pub solar_kw: f64,
    /// Wind generation delivered to the load (kW).
    pub wind_kw: f64,
    /// Battery charging power (kW, from surplus generation).
    pub charge_kw: f64,
    /// Battery discharging power delivered to the load (kW).
    pub discharge_kw: f64,
    /// State of charge after this hour (kWh).
    pub soc_kwh: f64,
    /// Grid import (kW).
    pub grid_kw: f64,
    /// Renewable generation neither consumed nor stored (kW).
    pub curtailed_kw: f64,
}

/// One step of the SOC fold: dispatches a single hour and returns the new
/// state of charge together with the hour's record.
pub fn dispatch_hour(
    caps: &Capacities,
    battery: &BatteryParams,
    input: &HourlyRecord,
    soc_kwh: f64,
) -> (f64, DispatchRecord) {
    let cap = caps.battery_kwh;
    let eta = battery.round_trip_efficiency;

    let solar_avail = caps.solar_kw * input.solar_yield;
    let wind_avail = caps.wind_kw * input.wind_yield;
    let generation = solar_avail + wind_avail;
    let demand = input.demand_kw;

    let (delivered, charge, discharge, grid, curtailed) = if generation >= demand {
        let excess = generation - demand;
        let headroom_kwh = (cap * battery.max_soc_frac - soc_kwh).max(0.0);
        let charge = excess
            .min(cap * battery.max_charge_rate)
            .min(headroom_kwh / eta);
        (demand, charge, 0.0, 0.0, excess - charge)
    } else {
        let deficit = demand - generation;
        let available_kwh = (soc_kwh - cap * battery.min_soc_frac).max(0.0);
        let discharge = deficit
            .min(cap * battery.max_discharge_rate)
            .min(available_kwh * eta);
        (generation, 0.0, discharge, deficit - discharge, 0.0)
    };

    // Split delivered generation pro-rata by availability so the balance
    // identity holds per technology column.
    let (solar_kw, wind_kw) = if generation > 0.0 {
        (
            delivered * solar_avail / generation,
            delivered * wind_avail / generation,
        )
    } else {
        (0.0, 0.0)
    };

    let soc_next = (soc_kwh + charge * eta - discharge / eta).clamp(0.0, cap);

    let record = DispatchRecord {
        hour: input.hour,
        demand_kw: demand,
        solar_kw,
        wind_kw,
        charge_kw: charge,
        discharge_kw: discharge,
        soc_kwh: soc_next,
        grid_kw: grid,
        curtailed_kw: curtailed,
    };
    (soc_next, record)
}

/// Simulates hourly dispatch for fixed capacities over the full series.
pub fn simulate(
    caps: &Capacities,
    series: &HourlySeries,
    battery: &BatteryParams,
) -> Vec<DispatchRecord> {
    let initial_soc = caps.battery_kwh * battery.initial_soc_frac;
    series
        .records
        .iter()
        .scan(initial_soc, |soc, input| {
            let (next, record) = dispatch_hour(caps, battery, input, *soc);
            *soc = next;
            Some(record)
        })
        .collect()
}

/// Annualised totals derived from a dispatch trace.
///
/// Sums over the trace are scaled by [`HourlySeries::annual_scale`] so short
/// series report full-year figures. The grid-only baseline (all demand
/// imported) is computed from the same series for savings comparisons.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSummary {
    /// Renewable energy delivered to the load, incl. battery discharge (kWh/yr).
    pub renewable_kwh: f64,
    /// Grid import (kWh/yr).
    pub grid_kwh: f64,
    /// Curtailed renewable energy (kWh/yr).
    pub curtailed_kwh: f64,
    /// Total demand served (kWh/yr).
    pub demand_kwh: f64,
    /// Cost of grid imports at hourly prices (currency/yr).
    pub grid_cost: f64,
    /// Emissions from grid imports (kg CO2/yr).
    pub grid_emissions_kg: f64,
    /// Grid-only baseline cost (currency/yr).
    pub baseline_cost: f64,
    /// Grid-only baseline emissions (kg CO2/yr).
    pub baseline_emissions_kg: f64,
}

impl DispatchSummary {
    /// Aggregates a trace against the series it was simulated from.
    ///
    /// The trace and series must be index-aligned, which `simulate`
    /// guarantees.
    pub fn from_trace(trace: &[DispatchRecord], series: &HourlySeries) -> Self {
        let mut s = Self {
            renewable_kwh: 0.0,
            grid_kwh: 0.0,
            curtailed_kwh: 0.0,
            demand_kwh: 0.0,
            grid_cost: 0.0,
            grid_emissions_kg: 0.0,
            baseline_cost: 0.0,
            baseline_emissions_kg: 0.0,
        };
        for (r, input) in trace.iter().zip(series.records.iter()) {
            s.renewable_kwh += r.solar_kw + r.wind_kw + r.discharge_kw;
            s.grid_kwh += r.grid_kw;
            s.curtailed_kwh += r.curtailed_kw;
            s.demand_kwh += r.demand_kw;
            s.grid_cost += r.grid_kw * input.grid_price;
            s.grid_emissions_kg += r.grid_kw * input.grid_carbon;
            s.baseline_cost += r.demand_kw * input.grid_price;
            s.baseline_emissions_kg += r.demand_kw * input.grid_carbon;
        }
        let scale = series.annual_scale();
        s.renewable_kwh *= scale;
        s.grid_kwh *= scale;
        s.curtailed_kwh *= scale;
        s.demand_kwh *= scale;
        s.grid_cost *= scale;
        s.grid_emissions_kg *= scale;
        s.baseline_cost *= scale;
        s.baseline_emissions_kg *= scale;
        s
    }

    /// Share of consumption met by solar, wind, and battery discharge.
    pub fn renewable_fraction(&self) -> f64 {
        let total = self.renewable_kwh + self.grid_kwh;
        if total > 0.0 {
            self.renewable_kwh / total
        } else {
            0.0
        }
    }
}
