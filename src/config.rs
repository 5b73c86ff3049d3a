//! TOML-based planner configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::data::{ConstraintSet, CostModel, SyntheticProfile};
use crate::dispatch::BatteryParams;
use crate::error::ConfigError;
use crate::finance::{FinanceSettings, VppaContract};
use crate::optimizer::OptimizerSettings;
use crate::risk::VarianceFactors;

/// Top-level planner configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from TOML
/// with [`PlannerConfig::from_toml_file`] or use [`PlannerConfig::baseline`]
/// for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    /// Synthetic hourly profile parameters.
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Facility-level parameters.
    #[serde(default)]
    pub facility: FacilityConfig,
    /// Per-unit capital and operating costs.
    #[serde(default)]
    pub costs: CostsConfig,
    /// Budget, ceilings, and renewable-fraction constraints.
    #[serde(default)]
    pub constraints: ConstraintsConfig,
    /// Battery operating envelope.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Capacity search parameters.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Ownership-economics horizon and discount rate.
    #[serde(default)]
    pub finance: FinanceConfig,
    /// VPPA contract terms.
    #[serde(default)]
    pub vppa: VppaConfig,
    /// Monte Carlo sensitivity parameters.
    #[serde(default)]
    pub risk: RiskConfig,
}

/// Synthetic hourly profile parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Number of hours to generate (must be > 0).
    pub hours: usize,
    /// Master random seed.
    pub seed: u64,
    /// Overnight minimum demand (kW).
    pub base_demand_kw: f64,
    /// Daily peak demand (kW).
    pub peak_demand_kw: f64,
    /// Daytime grid price (currency/kWh).
    pub peak_price: f64,
    /// Overnight grid price (currency/kWh).
    pub offpeak_price: f64,
    /// Grid carbon intensity (kg CO2/kWh).
    pub grid_carbon: f64,
    /// Mean wind yield factor.
    pub wind_mean: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let p = SyntheticProfile::default();
        Self {
            hours: p.hours,
            seed: p.seed,
            base_demand_kw: p.base_demand_kw,
            peak_demand_kw: p.peak_demand_kw,
            peak_price: p.peak_price,
            offpeak_price: p.offpeak_price,
            grid_carbon: p.grid_carbon,
            wind_mean: p.wind_mean,
        }
    }
}

/// Facility-level parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FacilityConfig {
    /// Power usage effectiveness applied to demand before sizing. Values
    /// outside [1.0, 3.0] are treated as a recoverable data problem and
    /// fall back to 1.0 rather than aborting the run.
    pub pue: f64,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self { pue: 1.0 }
    }
}

/// Per-unit capital and operating costs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostsConfig {
    /// Capital cost per kW of solar.
    pub solar_capex_per_kw: f64,
    /// Capital cost per kW of wind.
    pub wind_capex_per_kw: f64,
    /// Capital cost per kWh of battery.
    pub battery_capex_per_kwh: f64,
    /// Annual operating cost per kW of solar.
    pub solar_opex_per_kw_yr: f64,
    /// Annual operating cost per kW of wind.
    pub wind_opex_per_kw_yr: f64,
    /// Annual operating cost per kWh of battery.
    pub battery_opex_per_kwh_yr: f64,
    /// Carbon cost per kg of CO2.
    pub carbon_cost_per_kg: f64,
}

impl Default for CostsConfig {
    fn default() -> Self {
        Self {
            solar_capex_per_kw: 900.0,
            wind_capex_per_kw: 1300.0,
            battery_capex_per_kwh: 350.0,
            solar_opex_per_kw_yr: 15.0,
            wind_opex_per_kw_yr: 40.0,
            battery_opex_per_kwh_yr: 8.0,
            carbon_cost_per_kg: 0.05,
        }
    }
}

/// Budget, ceilings, and renewable-fraction constraints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstraintsConfig {
    /// Maximum capital budget (currency).
    pub max_budget: f64,
    /// Optional solar ceiling (kW).
    pub solar_max_kw: Option<f64>,
    /// Optional wind ceiling (kW).
    pub wind_max_kw: Option<f64>,
    /// Optional battery ceiling (kWh).
    pub battery_max_kwh: Option<f64>,
    /// Minimum renewable fraction in [0, 1], if mandated.
    pub min_renewable_fraction: Option<f64>,
    /// Battery round-trip efficiency (0, 1].
    pub round_trip_efficiency: f64,
}

impl Default for ConstraintsConfig {
    fn default() -> Self {
        Self {
            max_budget: 250_000.0,
            solar_max_kw: None,
            wind_max_kw: None,
            battery_max_kwh: None,
            min_renewable_fraction: None,
            round_trip_efficiency: 0.90,
        }
    }
}

/// Battery operating envelope (fractions of capacity).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Max charge power as a fraction of capacity per hour.
    pub max_charge_rate: f64,
    /// Max discharge power as a fraction of capacity per hour.
    pub max_discharge_rate: f64,
    /// Lower SOC bound.
    pub min_soc_frac: f64,
    /// Upper SOC bound.
    pub max_soc_frac: f64,
    /// Starting SOC.
    pub initial_soc_frac: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        let p = BatteryParams::default();
        Self {
            max_charge_rate: p.max_charge_rate,
            max_discharge_rate: p.max_discharge_rate,
            min_soc_frac: p.min_soc_frac,
            max_soc_frac: p.max_soc_frac,
            initial_soc_frac: p.initial_soc_frac,
        }
    }
}

/// Capacity search parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Project lifetime (years).
    pub lifetime_years: u32,
    /// Annual discount rate for the search objective.
    pub discount_rate: f64,
    /// Local-search iteration cap.
    pub max_iterations: usize,
    /// Minimum improvement to accept a perturbation.
    pub convergence_threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let s = OptimizerSettings::default();
        Self {
            lifetime_years: s.lifetime_years,
            discount_rate: s.discount_rate,
            max_iterations: s.max_iterations,
            convergence_threshold: s.convergence_threshold,
        }
    }
}

/// Ownership-economics horizon and discount rate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinanceConfig {
    /// NPV horizon (years).
    pub horizon_years: u32,
    /// Annual discount rate.
    pub discount_rate: f64,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        let s = FinanceSettings::default();
        Self {
            horizon_years: s.horizon_years,
            discount_rate: s.discount_rate,
        }
    }
}

/// VPPA contract terms.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VppaConfig {
    /// Whether to evaluate the VPPA alternative at all.
    pub enabled: bool,
    /// Market region: `"ercot"`, `"pjm"`, `"caiso"`, or `"nordpool"`.
    pub region: String,
    /// Fixed strike price (currency/kWh).
    pub strike_price: f64,
    /// Contracted annual volume (kWh/yr).
    pub contract_kwh_per_year: f64,
    /// Contract term (years).
    pub term_years: u32,
    /// Renewable-certificate value (currency/kWh).
    pub rec_price_per_kwh: f64,
}

impl Default for VppaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            region: "ercot".to_string(),
            strike_price: 0.045,
            contract_kwh_per_year: 300_000.0,
            term_years: 10,
            rec_price_per_kwh: 0.005,
        }
    }
}

/// Monte Carlo sensitivity parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    /// Whether to run the sensitivity stage.
    pub enabled: bool,
    /// Number of Monte Carlo trials.
    pub iterations: usize,
    /// Seed for the trial RNG.
    pub seed: u64,
    /// Grid price variance factor.
    pub price_variance: f64,
    /// Load variance factor.
    pub load_variance: f64,
    /// Renewable generation variance factor.
    pub generation_variance: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        let f = VarianceFactors::default();
        Self {
            enabled: true,
            iterations: 500,
            seed: 7,
            price_variance: f.price,
            load_variance: f.load,
            generation_variance: f.generation,
        }
    }
}

impl PlannerConfig {
    /// Returns the baseline scenario: a mid-size facility with a moderate
    /// budget and no renewable-fraction mandate.
    pub fn baseline() -> Self {
        Self {
            profile: ProfileConfig::default(),
            facility: FacilityConfig::default(),
            costs: CostsConfig::default(),
            constraints: ConstraintsConfig::default(),
            battery: BatteryConfig::default(),
            optimizer: OptimizerConfig::default(),
            finance: FinanceConfig::default(),
            vppa: VppaConfig::default(),
            risk: RiskConfig::default(),
        }
    }

    /// Returns the high-renewables preset: bigger budget, a 60% renewable
    /// mandate, and the VPPA alternative enabled.
    pub fn high_renewables() -> Self {
        Self {
            constraints: ConstraintsConfig {
                max_budget: 600_000.0,
                min_renewable_fraction: Some(0.6),
                ..ConstraintsConfig::default()
            },
            vppa: VppaConfig {
                enabled: true,
                ..VppaConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the tight-budget preset: small budget, capacity ceilings, and
    /// pricier grid power.
    pub fn tight_budget() -> Self {
        Self {
            profile: ProfileConfig {
                peak_price: 0.24,
                offpeak_price: 0.12,
                ..ProfileConfig::default()
            },
            constraints: ConstraintsConfig {
                max_budget: 60_000.0,
                solar_max_kw: Some(60.0),
                wind_max_kw: Some(30.0),
                battery_max_kwh: Some(50.0),
                ..ConstraintsConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_renewables", "tight_budget"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_renewables" => Ok(Self::high_renewables()),
            "tight_budget" => Ok(Self::tight_budget()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new(
                "scenario",
                format!("cannot read \"{}\": {e}", path.display()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid. The facility
    /// PUE is deliberately not checked here: an out-of-range PUE degrades
    /// recoverably inside the pipeline instead of failing validation.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.profile.hours == 0 {
            errors.push(ConfigError::new("profile.hours", "must be > 0"));
        }
        if self.profile.peak_demand_kw < self.profile.base_demand_kw {
            errors.push(ConfigError::new(
                "profile.peak_demand_kw",
                "must be >= profile.base_demand_kw",
            ));
        }
        for (field, v) in [
            ("profile.base_demand_kw", self.profile.base_demand_kw),
            ("profile.peak_price", self.profile.peak_price),
            ("profile.offpeak_price", self.profile.offpeak_price),
            ("profile.grid_carbon", self.profile.grid_carbon),
        ] {
            if !v.is_finite() || v < 0.0 {
                errors.push(ConfigError::new(field, "must be finite and >= 0"));
            }
        }
        if !(0.0..=1.0).contains(&self.profile.wind_mean) {
            errors.push(ConfigError::new(
                "profile.wind_mean",
                "must be in [0.0, 1.0]",
            ));
        }

        let c = &self.costs;
        for (field, v) in [
            ("costs.solar_capex_per_kw", c.solar_capex_per_kw),
            ("costs.wind_capex_per_kw", c.wind_capex_per_kw),
            ("costs.battery_capex_per_kwh", c.battery_capex_per_kwh),
            ("costs.solar_opex_per_kw_yr", c.solar_opex_per_kw_yr),
            ("costs.wind_opex_per_kw_yr", c.wind_opex_per_kw_yr),
            ("costs.battery_opex_per_kwh_yr", c.battery_opex_per_kwh_yr),
            ("costs.carbon_cost_per_kg", c.carbon_cost_per_kg),
        ] {
            if !v.is_finite() || v < 0.0 {
                errors.push(ConfigError::new(field, "must be finite and >= 0"));
            }
        }

        let con = &self.constraints;
        if !con.max_budget.is_finite() || con.max_budget < 0.0 {
            errors.push(ConfigError::new(
                "constraints.max_budget",
                "must be finite and >= 0",
            ));
        }
        for (field, ceiling) in [
            ("constraints.solar_max_kw", con.solar_max_kw),
            ("constraints.wind_max_kw", con.wind_max_kw),
            ("constraints.battery_max_kwh", con.battery_max_kwh),
        ] {
            if let Some(v) = ceiling
                && (!v.is_finite() || v < 0.0)
            {
                errors.push(ConfigError::new(field, "must be finite and >= 0"));
            }
        }
        if let Some(f) = con.min_renewable_fraction
            && !(0.0..=1.0).contains(&f)
        {
            errors.push(ConfigError::new(
                "constraints.min_renewable_fraction",
                "must be in [0.0, 1.0]",
            ));
        }
        if !(con.round_trip_efficiency > 0.0 && con.round_trip_efficiency <= 1.0) {
            errors.push(ConfigError::new(
                "constraints.round_trip_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }

        let b = &self.battery;
        for (field, rate) in [
            ("battery.max_charge_rate", b.max_charge_rate),
            ("battery.max_discharge_rate", b.max_discharge_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
            }
        }
        if b.min_soc_frac >= b.max_soc_frac {
            errors.push(ConfigError::new(
                "battery.min_soc_frac",
                "must be < battery.max_soc_frac",
            ));
        }
        if !(0.0..=1.0).contains(&b.initial_soc_frac) {
            errors.push(ConfigError::new(
                "battery.initial_soc_frac",
                "must be in [0.0, 1.0]",
            ));
        }

        if self.optimizer.lifetime_years == 0 {
            errors.push(ConfigError::new("optimizer.lifetime_years", "must be > 0"));
        }
        if self.optimizer.max_iterations == 0 {
            errors.push(ConfigError::new("optimizer.max_iterations", "must be > 0"));
        }
        if self.finance.horizon_years == 0 {
            errors.push(ConfigError::new("finance.horizon_years", "must be > 0"));
        }

        if self.risk.enabled {
            if self.risk.iterations == 0 {
                errors.push(ConfigError::new("risk.iterations", "must be > 0"));
            }
            for (field, v) in [
                ("risk.price_variance", self.risk.price_variance),
                ("risk.load_variance", self.risk.load_variance),
                ("risk.generation_variance", self.risk.generation_variance),
            ] {
                if !v.is_finite() || v < 0.0 {
                    errors.push(ConfigError::new(field, "must be finite and >= 0"));
                }
            }
        }

        errors
    }

    /// Builds the synthetic profile generator from the profile section.
    pub fn synthetic_profile(&self) -> SyntheticProfile {
        SyntheticProfile {
            hours: self.profile.hours,
            seed: self.profile.seed,
            base_demand_kw: self.profile.base_demand_kw,
            peak_demand_kw: self.profile.peak_demand_kw,
            peak_price: self.profile.peak_price,
            offpeak_price: self.profile.offpeak_price,
            grid_carbon: self.profile.grid_carbon,
            wind_mean: self.profile.wind_mean,
            ..SyntheticProfile::default()
        }
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel {
            solar_capex_per_kw: self.costs.solar_capex_per_kw,
            wind_capex_per_kw: self.costs.wind_capex_per_kw,
            battery_capex_per_kwh: self.costs.battery_capex_per_kwh,
            solar_opex_per_kw_yr: self.costs.solar_opex_per_kw_yr,
            wind_opex_per_kw_yr: self.costs.wind_opex_per_kw_yr,
            battery_opex_per_kwh_yr: self.costs.battery_opex_per_kwh_yr,
            carbon_cost_per_kg: self.costs.carbon_cost_per_kg,
        }
    }

    pub fn constraint_set(&self) -> ConstraintSet {
        ConstraintSet {
            max_budget: self.constraints.max_budget,
            solar_max_kw: self.constraints.solar_max_kw,
            wind_max_kw: self.constraints.wind_max_kw,
            battery_max_kwh: self.constraints.battery_max_kwh,
            min_renewable_fraction: self.constraints.min_renewable_fraction,
            round_trip_efficiency: self.constraints.round_trip_efficiency,
        }
    }

    pub fn battery_params(&self) -> BatteryParams {
        BatteryParams {
            max_charge_rate: self.battery.max_charge_rate,
            max_discharge_rate: self.battery.max_discharge_rate,
            min_soc_frac: self.battery.min_soc_frac,
            max_soc_frac: self.battery.max_soc_frac,
            initial_soc_frac: self.battery.initial_soc_frac,
            round_trip_efficiency: self.constraints.round_trip_efficiency,
        }
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            lifetime_years: self.optimizer.lifetime_years,
            discount_rate: self.optimizer.discount_rate,
            max_iterations: self.optimizer.max_iterations,
            convergence_threshold: self.optimizer.convergence_threshold,
        }
    }

    pub fn finance_settings(&self) -> FinanceSettings {
        FinanceSettings {
            horizon_years: self.finance.horizon_years,
            discount_rate: self.finance.discount_rate,
        }
    }

    pub fn variance_factors(&self) -> VarianceFactors {
        VarianceFactors {
            price: self.risk.price_variance,
            load: self.risk.load_variance,
            generation: self.risk.generation_variance,
        }
    }

    pub fn vppa_contract(&self) -> VppaContract {
        VppaContract {
            region: self.vppa.region.clone(),
            strike_price: self.vppa.strike_price,
            contract_kwh_per_year: self.vppa.contract_kwh_per_year,
            term_years: self.vppa.term_years,
            rec_price_per_kwh: self.vppa.rec_price_per_kwh,
            discount_rate: self.finance.discount_rate,
        }
    }
}
