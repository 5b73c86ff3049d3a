//! Battery operating envelope used by the dispatch simulator.

use crate::error::PlanError;

/// Battery operating parameters.
///
/// These are configuration knobs, not hidden constants: charge/discharge
/// rates are fractions of capacity per hour, and the SOC window brackets the
/// usable band. A single round-trip efficiency covers both directions; there
/// is no separate AC/DC conversion model.
#[derive(Debug, Clone, Copy)]
pub struct BatteryParams {
    /// Max charge power as a fraction of capacity per hour.
    pub max_charge_rate: f64,
    /// Max discharge power as a fraction of capacity per hour.
    pub max_discharge_rate: f64,
    /// Lower SOC bound as a fraction of capacity.
    pub min_soc_frac: f64,
    /// Upper SOC bound as a fraction of capacity.
    pub max_soc_frac: f64,
    /// Starting SOC as a fraction of capacity.
    pub initial_soc_frac: f64,
    /// Round-trip efficiency in (0, 1].
    pub round_trip_efficiency: f64,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            max_charge_rate: 0.25,
            max_discharge_rate: 0.25,
            min_soc_frac: 0.10,
            max_soc_frac: 0.95,
            initial_soc_frac: 0.50,
            round_trip_efficiency: 0.90,
        }
    }
}

impl BatteryParams {
    pub fn validate(&self) -> Result<(), PlanError> {
        for (name, rate) in [
            ("max_charge_rate", self.max_charge_rate),
            ("max_discharge_rate", self.max_discharge_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(PlanError::Validation(format!(
                    "battery: {name} {rate} must be in (0, 1]"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.min_soc_frac)
            || !(0.0..=1.0).contains(&self.max_soc_frac)
            || self.min_soc_frac >= self.max_soc_frac
        {
            return Err(PlanError::Validation(format!(
                "battery: SOC window [{}, {}] must satisfy 0 <= min < max <= 1",
                self.min_soc_frac, self.max_soc_frac
            )));
        }
        if !(0.0..=1.0).contains(&self.initial_soc_frac) {
            return Err(PlanError::Validation(format!(
                "battery: initial_soc_frac {} must be in [0, 1]",
                self.initial_soc_frac
            )));
        }
        if !(self.round_trip_efficiency > 0.0 && self.round_trip_efficiency <= 1.0) {
            return Err(PlanError::Validation(format!(
                "battery: round_trip_efficiency {} must be in (0, 1]",
                self.round_trip_efficiency
            )));
        }
        Ok(())
    }
}
