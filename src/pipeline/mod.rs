//! End-to-end planning pipeline.
//!
//! Runs the six stages in order — data preparation, capacity optimization,
//! dispatch simulation, financial evaluation, VPPA settlement, and Monte
//! Carlo sensitivity — and records a per-stage outcome for each. A stage
//! failure is either recoverable (the stage's output is dropped and the run
//! continues with a documented fallback) or fatal (downstream stages are
//! skipped and the run is marked failed).

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::data::HourlySeries;
use crate::dispatch::{DispatchRecord, DispatchSummary, simulate};
use crate::error::PlanError;
use crate::finance::{self, FinancialResult, VppaResult, vppa};
use crate::optimizer::{self, CapacitySolution};
use crate::risk::{self, BoxMuller, SensitivityResult};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Data,
    Optimizer,
    Dispatch,
    Finance,
    Vppa,
    Sensitivity,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Data => "data",
            Stage::Optimizer => "optimizer",
            Stage::Dispatch => "dispatch",
            Stage::Finance => "finance",
            Stage::Vppa => "vppa",
            Stage::Sensitivity => "sensitivity",
        }
    }
}

/// How a single stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Produced its output normally.
    Succeeded,
    /// Failed recoverably; the run continued with the named fallback.
    Recovered(String),
    /// Failed fatally; downstream stages were skipped.
    Failed(String),
    /// Not run because an earlier stage failed fatally, or disabled.
    Skipped,
}

/// Per-stage record in the pipeline report.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    pub elapsed: Duration,
}

/// A stage failure, flattened for error listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
    pub recoverable: bool,
}

/// Data-quality notes gathered while preparing the hourly series.
#[derive(Debug, Clone, Default)]
pub struct DataQuality {
    /// PUE multiplier actually applied to demand.
    pub applied_pue: f64,
    /// Notes about substitutions or fallbacks.
    pub notes: Vec<String>,
}

/// Everything the pipeline produced. Stage outputs are `None` when their
/// stage failed or was skipped.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub stages: Vec<StageReport>,
    pub quality: DataQuality,
    pub solution: Option<CapacitySolution>,
    pub trace: Option<Vec<DispatchRecord>>,
    pub summary: Option<DispatchSummary>,
    pub finance: Option<FinancialResult>,
    pub vppa: Option<VppaResult>,
    pub sensitivity: Option<SensitivityResult>,
    pub total_elapsed: Duration,
}

impl PipelineOutput {
    /// True when no stage failed fatally.
    pub fn is_success(&self) -> bool {
        !self
            .stages
            .iter()
            .any(|s| matches!(s.status, StageStatus::Failed(_)))
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Every failure that occurred, recoverable or not, in stage order.
    pub fn errors(&self) -> Vec<StageError> {
        self.stages
            .iter()
            .filter_map(|s| match &s.status {
                StageStatus::Recovered(msg) => Some(StageError {
                    stage: s.stage,
                    message: msg.clone(),
                    recoverable: true,
                }),
                StageStatus::Failed(msg) => Some(StageError {
                    stage: s.stage,
                    message: msg.clone(),
                    recoverable: false,
                }),
                _ => None,
            })
            .collect()
    }
}

struct StageTimer {
    start: Instant,
}

impl StageTimer {
    fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    fn finish(self, stage: Stage, status: StageStatus) -> StageReport {
        StageReport {
            stage,
            status,
            elapsed: self.start.elapsed(),
        }
    }
}

/// Runs the full planning pipeline over a prepared hourly series.
///
/// `series` carries raw facility demand; the data stage applies the
/// configured PUE before sizing. An out-of-range PUE is a recoverable
/// problem (falls back to 1.0); an invalid series or an infeasible sizing
/// problem is fatal.
pub fn run(series: &HourlySeries, config: &PlannerConfig) -> PipelineOutput {
    let run_start = Instant::now();
    let mut stages = Vec::with_capacity(6);
    let mut quality = DataQuality {
        applied_pue: 1.0,
        ..DataQuality::default()
    };

    // Stage 1: data preparation.
    let timer = StageTimer::start();
    let prepared = match prepare_series(series, config, &mut quality) {
        Ok(s) => {
            info!(
                hours = s.len(),
                pue = quality.applied_pue,
                "data stage complete"
            );
            stages.push(timer.finish(Stage::Data, StageStatus::Succeeded));
            s
        }
        Err(e) => {
            warn!(error = %e, "data stage failed");
            stages.push(timer.finish(Stage::Data, StageStatus::Failed(e.to_string())));
            return finish_failed(stages, quality, run_start);
        }
    };

    // Stage 2: capacity optimization.
    let timer = StageTimer::start();
    let solution = match optimizer::optimize(
        &prepared,
        &config.cost_model(),
        &config.constraint_set(),
        &config.battery_params(),
        &config.optimizer_settings(),
    ) {
        Ok(s) => {
            info!(
                solar_kw = s.capacities.solar_kw,
                wind_kw = s.capacities.wind_kw,
                battery_kwh = s.capacities.battery_kwh,
                iterations = s.iterations,
                "optimizer stage complete"
            );
            stages.push(timer.finish(Stage::Optimizer, StageStatus::Succeeded));
            s
        }
        Err(e) => {
            warn!(error = %e, "optimizer stage failed");
            stages.push(timer.finish(Stage::Optimizer, StageStatus::Failed(e.to_string())));
            return finish_failed(stages, quality, run_start);
        }
    };

    // Stage 3: dispatch simulation over the accepted capacities. The
    // simulator is total over validated inputs, so this stage cannot fail
    // once the optimizer has accepted them.
    let timer = StageTimer::start();
    let trace = simulate(&solution.capacities, &prepared, &config.battery_params());
    let summary = DispatchSummary::from_trace(&trace, &prepared);
    info!(
        renewable_fraction = summary.renewable_fraction(),
        grid_kwh = summary.grid_kwh,
        "dispatch stage complete"
    );
    stages.push(timer.finish(Stage::Dispatch, StageStatus::Succeeded));

    // Stage 4: ownership economics.
    let timer = StageTimer::start();
    let financial = finance::evaluate(&solution, &summary, &config.cost_model(), &config.finance_settings());
    info!(npv = financial.npv, "finance stage complete");
    stages.push(timer.finish(Stage::Finance, StageStatus::Succeeded));

    // Stage 5: VPPA settlement (optional, recoverable).
    let timer = StageTimer::start();
    let vppa_result = if config.vppa.enabled {
        // Settle against total renewable production, curtailed energy
        // included: the contract pays on generation, not on delivery.
        let annual_generation = summary.renewable_kwh + summary.curtailed_kwh;
        match vppa::settle(&config.vppa_contract(), annual_generation, None) {
            Ok(r) => {
                info!(contract_value = r.contract_value, "vppa stage complete");
                stages.push(timer.finish(Stage::Vppa, StageStatus::Succeeded));
                Some(r)
            }
            Err(e) => {
                warn!(error = %e, "vppa stage degraded, dropping contract analysis");
                stages.push(timer.finish(Stage::Vppa, StageStatus::Recovered(e.to_string())));
                None
            }
        }
    } else {
        stages.push(timer.finish(Stage::Vppa, StageStatus::Skipped));
        None
    };

    // Stage 6: Monte Carlo sensitivity (optional, recoverable).
    let timer = StageTimer::start();
    let sensitivity = if config.risk.enabled {
        let mut source = BoxMuller::seeded(config.risk.seed);
        match risk::analyze(
            &financial,
            &config.variance_factors(),
            config.risk.iterations,
            &mut source,
        ) {
            Ok(r) => {
                info!(
                    expected_npv = r.expected_npv,
                    prob_positive = r.prob_positive_npv,
                    "sensitivity stage complete"
                );
                stages.push(timer.finish(Stage::Sensitivity, StageStatus::Succeeded));
                Some(r)
            }
            Err(e) => {
                warn!(error = %e, "sensitivity stage degraded, reporting point estimates only");
                stages.push(timer.finish(Stage::Sensitivity, StageStatus::Recovered(e.to_string())));
                None
            }
        }
    } else {
        stages.push(timer.finish(Stage::Sensitivity, StageStatus::Skipped));
        None
    };

    PipelineOutput {
        stages,
        quality,
        solution: Some(solution),
        trace: Some(trace),
        summary: Some(summary),
        finance: Some(financial),
        vppa: vppa_result,
        sensitivity,
        total_elapsed: run_start.elapsed(),
    }
}

/// Validates the series and applies the facility PUE to demand.
///
/// A PUE outside [1.0, 3.0] is recoverable: the multiplier falls back to
/// 1.0 and a note is recorded. An invalid series is fatal.
fn prepare_series(
    series: &HourlySeries,
    config: &PlannerConfig,
    quality: &mut DataQuality,
) -> Result<HourlySeries, PlanError> {
    series.validate()?;

    let pue = config.facility.pue;
    let applied = if (1.0..=3.0).contains(&pue) {
        pue
    } else {
        quality.notes.push(format!(
            "pue {pue} outside [1.0, 3.0], using 1.0"
        ));
        warn!(pue, "pue out of range, falling back to 1.0");
        1.0
    };
    quality.applied_pue = applied;

    if applied == 1.0 {
        Ok(series.clone())
    } else {
        Ok(series.with_demand_scaled(applied))
    }
}

fn finish_failed(
    mut stages: Vec<StageReport>,
    quality: DataQuality,
    run_start: Instant,
) -> PipelineOutput {
    let failed_at = stages.len();
    for stage in [
        Stage::Data,
        Stage::Optimizer,
        Stage::Dispatch,
        Stage::Finance,
        Stage::Vppa,
        Stage::Sensitivity,
    ]
    .into_iter()
    .skip(failed_at)
    {
        stages.push(StageReport {
            stage,
            status: StageStatus::Skipped,
            elapsed: Duration::ZERO,
        });
    }
    PipelineOutput {
        stages,
        quality,
        solution: None,
        trace: None,
        summary: None,
        finance: None,
        vppa: None,
        sensitivity: None,
        total_elapsed: run_start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;

    fn short_config() -> PlannerConfig {
        let mut cfg = PlannerConfig::baseline();
        cfg.profile.hours = 168;
        cfg.risk.iterations = 50;
        cfg
    }

    #[test]
    fn baseline_run_succeeds() {
        let cfg = short_config();
        let series = cfg.synthetic_profile().build();
        let out = run(&series, &cfg);
        assert!(out.is_success());
        assert!(out.solution.is_some());
        assert!(out.summary.is_some());
        assert!(out.finance.is_some());
        assert!(out.sensitivity.is_some(), "risk enabled by default");
        assert!(out.vppa.is_none(), "vppa disabled by default");
        assert_eq!(out.stages.len(), 6);
    }

    #[test]
    fn vppa_disabled_is_skipped_not_recovered() {
        let cfg = short_config();
        let series = cfg.synthetic_profile().build();
        let out = run(&series, &cfg);
        let vppa_stage = out.stage(Stage::Vppa).unwrap();
        assert_eq!(vppa_stage.status, StageStatus::Skipped);
        assert!(out.is_success());
    }

    #[test]
    fn empty_series_fails_data_stage() {
        let cfg = short_config();
        let series = HourlySeries::new(Vec::new());
        let out = run(&series, &cfg);
        assert!(!out.is_success());
        assert!(matches!(
            out.stage(Stage::Data).unwrap().status,
            StageStatus::Failed(_)
        ));
        // Everything downstream skipped, nothing produced.
        assert!(matches!(
            out.stage(Stage::Optimizer).unwrap().status,
            StageStatus::Skipped
        ));
        assert!(out.solution.is_none());
        assert!(out.finance.is_none());
        assert_eq!(out.stages.len(), 6);
    }

    #[test]
    fn infeasible_target_fails_optimizer_stage() {
        let mut cfg = short_config();
        cfg.constraints.max_budget = 1_000.0;
        cfg.constraints.min_renewable_fraction = Some(0.95);
        let series = cfg.synthetic_profile().build();
        let out = run(&series, &cfg);
        assert!(!out.is_success());
        assert!(matches!(
            out.stage(Stage::Optimizer).unwrap().status,
            StageStatus::Failed(_)
        ));
        assert!(matches!(
            out.stage(Stage::Dispatch).unwrap().status,
            StageStatus::Skipped
        ));
    }

    #[test]
    fn bad_pue_recovers_with_fallback() {
        let mut cfg = short_config();
        cfg.facility.pue = 7.5;
        let series = cfg.synthetic_profile().build();
        let out = run(&series, &cfg);
        assert!(out.is_success());
        assert_eq!(out.quality.applied_pue, 1.0);
        assert!(!out.quality.notes.is_empty());
    }

    #[test]
    fn valid_pue_scales_demand() {
        let cfg = short_config();
        let series = cfg.synthetic_profile().build();
        let base = run(&series, &cfg);

        let mut scaled_cfg = short_config();
        scaled_cfg.facility.pue = 1.5;
        let scaled = run(&series, &scaled_cfg);

        assert_eq!(scaled.quality.applied_pue, 1.5);
        let base_demand = base.summary.unwrap().demand_kwh;
        let scaled_demand = scaled.summary.unwrap().demand_kwh;
        assert!((scaled_demand / base_demand - 1.5).abs() < 1e-9);
    }

    #[test]
    fn errors_list_carries_recoverability() {
        let mut cfg = short_config();
        cfg.vppa.enabled = true;
        cfg.vppa.region = "atlantis".to_string();
        let series = cfg.synthetic_profile().build();
        let out = run(&series, &cfg);
        let errors = out.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].stage, Stage::Vppa);
        assert!(errors[0].recoverable);
    }

    #[test]
    fn bad_vppa_region_recovers() {
        let mut cfg = short_config();
        cfg.vppa.enabled = true;
        cfg.vppa.region = "atlantis".to_string();
        let series = cfg.synthetic_profile().build();
        let out = run(&series, &cfg);
        assert!(out.is_success(), "degraded vppa must not fail the run");
        assert!(matches!(
            out.stage(Stage::Vppa).unwrap().status,
            StageStatus::Recovered(_)
        ));
        assert!(out.vppa.is_none());
        assert!(out.finance.is_some());
    }

    #[test]
    fn runs_are_deterministic() {
        let cfg = short_config();
        let series = cfg.synthetic_profile().build();
        let a = run(&series, &cfg);
        let b = run(&series, &cfg);
        let (fa, fb) = (a.finance.unwrap(), b.finance.unwrap());
        assert_eq!(fa.npv.to_bits(), fb.npv.to_bits());
        let (sa, sb) = (a.sensitivity.unwrap(), b.sensitivity.unwrap());
        assert_eq!(sa.expected_npv.to_bits(), sb.expected_npv.to_bits());
    }
}
