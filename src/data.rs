//! Exogenous planning inputs: the hourly dataset, the cost model, the
//! constraint set, and a seeded synthetic-year builder used by the CLI and
//! tests in place of a real weather/price data provider.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::PlanError;
use crate::risk::sampling::{BoxMuller, NormalSource};

/// Hours in a reference year; short series are annualised against this.
pub const HOURS_PER_YEAR: usize = 8760;

/// One hour of exogenous input.
///
/// Produced by the external data collaborator (or the synthetic builder) and
/// never mutated by the planning core. Yield factors are the generation per
/// kW installed, so `capacity_kw * yield` is the available power that hour.
#[derive(Debug, Clone, Copy)]
pub struct HourlyRecord {
    /// Hour index within the series.
    pub hour: usize,
    /// Facility demand (kW, >= 0).
    pub demand_kw: f64,
    /// Solar yield factor in [0, 1].
    pub solar_yield: f64,
    /// Wind yield factor in [0, 1].
    pub wind_yield: f64,
    /// Grid electricity price (currency/kWh, >= 0).
    pub grid_price: f64,
    /// Grid carbon intensity (kg CO2/kWh, >= 0).
    pub grid_carbon: f64,
}

/// Ordered hourly dataset, typically one year (8,760 records).
///
/// Any positive length is valid; aggregate quantities are scaled by
/// [`HourlySeries::annual_scale`] so a 24-hour test series still produces
/// annual figures.
#[derive(Debug, Clone)]
pub struct HourlySeries {
    /// The hourly records in timestamp order.
    pub records: Vec<HourlyRecord>,
}

impl HourlySeries {
    pub fn new(records: Vec<HourlyRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Factor that scales a sum over this series up to a full year.
    pub fn annual_scale(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            HOURS_PER_YEAR as f64 / self.records.len() as f64
        }
    }

    /// Mean solar yield factor over the series.
    pub fn mean_solar_yield(&self) -> f64 {
        self.mean(|r| r.solar_yield)
    }

    /// Mean wind yield factor over the series.
    pub fn mean_wind_yield(&self) -> f64 {
        self.mean(|r| r.wind_yield)
    }

    /// Mean demand (kW) over the series.
    pub fn mean_demand_kw(&self) -> f64 {
        self.mean(|r| r.demand_kw)
    }

    fn mean(&self, f: impl Fn(&HourlyRecord) -> f64) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.records.iter().map(f).sum::<f64>() / self.records.len() as f64
    }

    /// Checks every record against the data-model invariants.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Validation` naming the first offending record if
    /// the series is empty, a demand/price/carbon value is negative or
    /// non-finite, or a yield factor falls outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.records.is_empty() {
            return Err(PlanError::Validation("hourly dataset is empty".into()));
        }
        for r in &self.records {
            if !r.demand_kw.is_finite() || r.demand_kw < 0.0 {
                return Err(PlanError::Validation(format!(
                    "hour {}: demand_kw {} must be finite and >= 0",
                    r.hour, r.demand_kw
                )));
            }
            for (name, y) in [("solar_yield", r.solar_yield), ("wind_yield", r.wind_yield)] {
                if !(0.0..=1.0).contains(&y) {
                    return Err(PlanError::Validation(format!(
                        "hour {}: {name} {y} must be in [0, 1]",
                        r.hour
                    )));
                }
            }
            for (name, v) in [("grid_price", r.grid_price), ("grid_carbon", r.grid_carbon)] {
                if !v.is_finite() || v < 0.0 {
                    return Err(PlanError::Validation(format!(
                        "hour {}: {name} {v} must be finite and >= 0",
                        r.hour
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns a copy with every demand scaled by `factor`.
    ///
    /// Used by the pipeline to fold a facility PUE overhead into the load.
    pub fn with_demand_scaled(&self, factor: f64) -> Self {
        Self {
            records: self
                .records
                .iter()
                .map(|r| HourlyRecord {
                    demand_kw: r.demand_kw * factor,
                    ..*r
                })
                .collect(),
        }
    }
}

/// Per-unit capital and operating costs. All values must be >= 0.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    /// Capital cost per kW of solar (currency/kW).
    pub solar_capex_per_kw: f64,
    /// Capital cost per kW of wind (currency/kW).
    pub wind_capex_per_kw: f64,
    /// Capital cost per kWh of battery (currency/kWh).
    pub battery_capex_per_kwh: f64,
    /// Annual operating cost per kW of solar.
    pub solar_opex_per_kw_yr: f64,
    /// Annual operating cost per kW of wind.
    pub wind_opex_per_kw_yr: f64,
    /// Annual operating cost per kWh of battery.
    pub battery_opex_per_kwh_yr: f64,
    /// Carbon cost per kg of CO2 emitted.
    pub carbon_cost_per_kg: f64,
}

impl CostModel {
    /// Fails fast on any negative or non-finite cost.
    pub fn validate(&self) -> Result<(), PlanError> {
        let fields = [
            ("solar_capex_per_kw", self.solar_capex_per_kw),
            ("wind_capex_per_kw", self.wind_capex_per_kw),
            ("battery_capex_per_kwh", self.battery_capex_per_kwh),
            ("solar_opex_per_kw_yr", self.solar_opex_per_kw_yr),
            ("wind_opex_per_kw_yr", self.wind_opex_per_kw_yr),
            ("battery_opex_per_kwh_yr", self.battery_opex_per_kwh_yr),
            ("carbon_cost_per_kg", self.carbon_cost_per_kg),
        ];
        for (name, v) in fields {
            if !v.is_finite() || v < 0.0 {
                return Err(PlanError::Validation(format!(
                    "cost model: {name} {v} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// Sizing constraints for the optimizer.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintSet {
    /// Maximum total capital budget (currency). Zero is a valid degenerate
    /// budget and yields the all-grid plan; negative is a validation error.
    pub max_budget: f64,
    /// Optional solar capacity ceiling (kW); absent means unconstrained.
    pub solar_max_kw: Option<f64>,
    /// Optional wind capacity ceiling (kW).
    pub wind_max_kw: Option<f64>,
    /// Optional battery capacity ceiling (kWh).
    pub battery_max_kwh: Option<f64>,
    /// Minimum renewable-energy fraction in [0, 1], if required.
    pub min_renewable_fraction: Option<f64>,
    /// Battery round-trip efficiency in (0, 1].
    pub round_trip_efficiency: f64,
}

impl ConstraintSet {
    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.max_budget.is_finite() || self.max_budget < 0.0 {
            return Err(PlanError::Validation(format!(
                "constraints: max_budget {} must be finite and >= 0",
                self.max_budget
            )));
        }
        for (name, ceiling) in [
            ("solar_max_kw", self.solar_max_kw),
            ("wind_max_kw", self.wind_max_kw),
            ("battery_max_kwh", self.battery_max_kwh),
        ] {
            if let Some(c) = ceiling
                && (!c.is_finite() || c < 0.0)
            {
                return Err(PlanError::Validation(format!(
                    "constraints: {name} {c} must be finite and >= 0"
                )));
            }
        }
        if let Some(f) = self.min_renewable_fraction
            && !(0.0..=1.0).contains(&f)
        {
            return Err(PlanError::Validation(format!(
                "constraints: min_renewable_fraction {f} must be in [0, 1]"
            )));
        }
        if !(self.round_trip_efficiency > 0.0 && self.round_trip_efficiency <= 1.0) {
            return Err(PlanError::Validation(format!(
                "constraints: round_trip_efficiency {} must be in (0, 1]",
                self.round_trip_efficiency
            )));
        }
        Ok(())
    }
}

/// Seeded synthetic-year builder.
///
/// Stands in for the external data provider: sinusoidal daily demand,
/// half-cosine diurnal solar yield, noisy wind yield, and a day/night grid
/// price spread, all reproducible from one master seed.
#[derive(Debug, Clone)]
pub struct SyntheticProfile {
    /// Number of hours to generate (must be > 0).
    pub hours: usize,
    /// Master random seed.
    pub seed: u64,
    /// Overnight minimum demand (kW).
    pub base_demand_kw: f64,
    /// Daily peak demand (kW).
    pub peak_demand_kw: f64,
    /// Sunrise hour-of-day (inclusive).
    pub sunrise_hour: usize,
    /// Sunset hour-of-day (exclusive).
    pub sunset_hour: usize,
    /// Std. dev. of multiplicative solar noise.
    pub solar_noise_std: f64,
    /// Mean wind yield factor.
    pub wind_mean: f64,
    /// Std. dev. of additive wind noise.
    pub wind_noise_std: f64,
    /// Daytime grid price (currency/kWh).
    pub peak_price: f64,
    /// Overnight grid price (currency/kWh).
    pub offpeak_price: f64,
    /// Grid carbon intensity (kg CO2/kWh).
    pub grid_carbon: f64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            hours: HOURS_PER_YEAR,
            seed: 42,
            base_demand_kw: 60.0,
            peak_demand_kw: 100.0,
            sunrise_hour: 6,
            sunset_hour: 18,
            solar_noise_std: 0.05,
            wind_mean: 0.30,
            wind_noise_std: 0.10,
            peak_price: 0.18,
            offpeak_price: 0.09,
            grid_carbon: 0.40,
        }
    }
}

impl SyntheticProfile {
    /// Generates the hourly series. Identical inputs yield identical output.
    pub fn build(&self) -> HourlySeries {
        let mut normals = BoxMuller::new(StdRng::seed_from_u64(self.seed));
        let span = (self.peak_demand_kw - self.base_demand_kw).max(0.0);
        let mut records = Vec::with_capacity(self.hours);

        for hour in 0..self.hours {
            let h = hour % 24;
            // Demand peaks mid-afternoon, bottoms out pre-dawn.
            let phase = (h as f64 - 4.0) / 24.0 * std::f64::consts::TAU;
            let demand_kw = self.base_demand_kw + span * 0.5 * (1.0 - phase.cos());

            let solar_yield = if h >= self.sunrise_hour && h < self.sunset_hour {
                let daylight = (self.sunset_hour - self.sunrise_hour) as f64;
                let x = (h - self.sunrise_hour) as f64 / daylight;
                let clear = (x * std::f64::consts::PI).sin();
                let noisy = clear * (1.0 + normals.sample() * self.solar_noise_std);
                noisy.clamp(0.0, 1.0)
            } else {
                0.0
            };

            let wind_yield =
                (self.wind_mean + normals.sample() * self.wind_noise_std).clamp(0.0, 1.0);

            let daytime = (7..22).contains(&h);
            let grid_price = if daytime {
                self.peak_price
            } else {
                self.offpeak_price
            };

            records.push(HourlyRecord {
                hour,
                demand_kw,
                solar_yield,
                wind_yield,
                grid_price,
                grid_carbon: self.grid_carbon,
            });
        }

        HourlySeries::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_record(hour: usize) -> HourlyRecord {
        HourlyRecord {
            hour,
            demand_kw: 50.0,
            solar_yield: 0.5,
            wind_yield: 0.2,
            grid_price: 0.12,
            grid_carbon: 0.4,
        }
    }

    #[test]
    fn empty_series_fails_validation() {
        let s = HourlySeries::new(vec![]);
        assert!(matches!(s.validate(), Err(PlanError::Validation(_))));
    }

    #[test]
    fn valid_series_passes() {
        let s = HourlySeries::new((0..24).map(flat_record).collect());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn out_of_range_yield_rejected() {
        let mut r = flat_record(3);
        r.solar_yield = 1.2;
        let s = HourlySeries::new(vec![flat_record(0), r]);
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("solar_yield"));
    }

    #[test]
    fn negative_demand_rejected() {
        let mut r = flat_record(0);
        r.demand_kw = -1.0;
        let s = HourlySeries::new(vec![r]);
        assert!(s.validate().is_err());
    }

    #[test]
    fn annual_scale_for_one_day_is_365() {
        let s = HourlySeries::new((0..24).map(flat_record).collect());
        assert!((s.annual_scale() - 365.0).abs() < 1e-12);
    }

    #[test]
    fn demand_scaling_leaves_other_fields_alone() {
        let s = HourlySeries::new((0..4).map(flat_record).collect());
        let scaled = s.with_demand_scaled(1.2);
        for (a, b) in s.records.iter().zip(scaled.records.iter()) {
            assert!((b.demand_kw - a.demand_kw * 1.2).abs() < 1e-12);
            assert_eq!(a.grid_price, b.grid_price);
            assert_eq!(a.solar_yield, b.solar_yield);
        }
    }

    #[test]
    fn negative_cost_rejected() {
        let mut costs = CostModel {
            solar_capex_per_kw: 900.0,
            wind_capex_per_kw: 1300.0,
            battery_capex_per_kwh: 350.0,
            solar_opex_per_kw_yr: 15.0,
            wind_opex_per_kw_yr: 40.0,
            battery_opex_per_kwh_yr: 8.0,
            carbon_cost_per_kg: 0.05,
        };
        assert!(costs.validate().is_ok());
        costs.wind_capex_per_kw = -1.0;
        assert!(costs.validate().is_err());
    }

    #[test]
    fn negative_budget_rejected_zero_allowed() {
        let mut c = ConstraintSet {
            max_budget: 0.0,
            solar_max_kw: None,
            wind_max_kw: None,
            battery_max_kwh: None,
            min_renewable_fraction: None,
            round_trip_efficiency: 0.9,
        };
        assert!(c.validate().is_ok());
        c.max_budget = -100.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn synthetic_profile_is_deterministic_and_valid() {
        let p = SyntheticProfile {
            hours: 48,
            ..SyntheticProfile::default()
        };
        let a = p.build();
        let b = p.build();
        assert!(a.validate().is_ok());
        assert_eq!(a.len(), 48);
        for (ra, rb) in a.records.iter().zip(b.records.iter()) {
            assert_eq!(ra.demand_kw, rb.demand_kw);
            assert_eq!(ra.solar_yield, rb.solar_yield);
            assert_eq!(ra.wind_yield, rb.wind_yield);
        }
    }

    #[test]
    fn synthetic_solar_is_dark_at_night() {
        let p = SyntheticProfile {
            hours: 24,
            ..SyntheticProfile::default()
        };
        let s = p.build();
        assert_eq!(s.records[0].solar_yield, 0.0);
        assert_eq!(s.records[23].solar_yield, 0.0);
        assert!(s.records[12].solar_yield > 0.5);
    }
}
