//! Human-readable plan report.

use std::fmt;

use crate::pipeline::{PipelineOutput, StageStatus};

impl fmt::Display for PipelineOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Capacity Plan Report ---")?;

        if let Some(s) = &self.solution {
            writeln!(f, "Solar capacity:        {:.1} kW", s.capacities.solar_kw)?;
            writeln!(f, "Wind capacity:         {:.1} kW", s.capacities.wind_kw)?;
            writeln!(f, "Battery capacity:      {:.1} kWh", s.capacities.battery_kwh)?;
            writeln!(f, "Capital cost:          {:.0}", s.capital_cost)?;
            writeln!(f, "Search iterations:     {}", s.iterations)?;
        } else {
            writeln!(f, "No feasible plan produced.")?;
        }

        if let Some(s) = &self.summary {
            writeln!(f)?;
            writeln!(f, "--- Annual Dispatch ---")?;
            writeln!(
                f,
                "Renewable fraction:    {:.1}%",
                s.renewable_fraction() * 100.0
            )?;
            writeln!(f, "Renewable energy:      {:.0} kWh", s.renewable_kwh)?;
            writeln!(f, "Grid import:           {:.0} kWh", s.grid_kwh)?;
            writeln!(f, "Curtailed:             {:.0} kWh", s.curtailed_kwh)?;
            writeln!(f, "Grid cost:             {:.0}", s.grid_cost)?;
        }

        if let Some(fin) = &self.finance {
            writeln!(f)?;
            writeln!(f, "--- Financials ---")?;
            writeln!(f, "Annual savings:        {:.0}", fin.annual_savings)?;
            writeln!(f, "NPV:                   {:.0}", fin.npv)?;
            match fin.payback_months {
                Some(m) => writeln!(f, "Payback:               {:.1} months", m)?,
                None => writeln!(f, "Payback:               n/a (no annual savings)")?,
            }
            match fin.irr {
                Some(r) => writeln!(f, "IRR (simple):          {:.1}%", r * 100.0)?,
                None => writeln!(f, "IRR (simple):          n/a")?,
            }
            writeln!(
                f,
                "CO2 reduction:         {:.0} kg/yr",
                fin.annual_co2_reduction_kg
            )?;
        }

        if let Some(v) = &self.vppa {
            writeln!(f)?;
            writeln!(f, "--- VPPA Alternative ---")?;
            writeln!(f, "Contract value (NPV):  {:.0}", v.contract_value)?;
            writeln!(f, "Effective LCOE:        {:.4} /kWh", v.lcoe)?;
            writeln!(f, "Hedge effectiveness:   {:.1}%", v.hedge_effectiveness)?;
            writeln!(f, "Term:                  {} years", v.yearly.len())?;
        }

        if let Some(r) = &self.sensitivity {
            writeln!(f)?;
            writeln!(f, "--- Sensitivity ({} trials) ---", r.iterations)?;
            writeln!(f, "Expected NPV:          {:.0}", r.expected_npv)?;
            writeln!(
                f,
                "NPV 95% interval:      [{:.0}, {:.0}]",
                r.npv_p2_5, r.npv_p97_5
            )?;
            writeln!(f, "Value at risk (P5):    {:.0}", r.value_at_risk_p5)?;
            writeln!(
                f,
                "P(NPV > 0):            {:.1}%",
                r.prob_positive_npv * 100.0
            )?;
            for entry in &r.tornado {
                writeln!(
                    f,
                    "  tornado {:<12} {:.0}",
                    entry.variable, entry.impact
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- Stages ---")?;
        for stage in &self.stages {
            let status = match &stage.status {
                StageStatus::Succeeded => "ok".to_string(),
                StageStatus::Recovered(msg) => format!("recovered ({msg})"),
                StageStatus::Failed(msg) => format!("FAILED ({msg})"),
                StageStatus::Skipped => "skipped".to_string(),
            };
            writeln!(
                f,
                "{:<12} {:>8.2?}  {}",
                stage.stage.name(),
                stage.elapsed,
                status
            )?;
        }
        for note in &self.quality.notes {
            writeln!(f, "note: {note}")?;
        }
        write!(
            f,
            "Result: {}",
            if self.is_success() { "success" } else { "FAILED" }
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PlannerConfig;
    use crate::pipeline;

    #[test]
    fn report_renders_all_sections() {
        let mut cfg = PlannerConfig::baseline();
        cfg.profile.hours = 168;
        cfg.risk.iterations = 50;
        cfg.vppa.enabled = true;
        let series = cfg.synthetic_profile().build();
        let out = pipeline::run(&series, &cfg);
        let text = out.to_string();
        assert!(text.contains("--- Capacity Plan Report ---"));
        assert!(text.contains("--- Annual Dispatch ---"));
        assert!(text.contains("--- Financials ---"));
        assert!(text.contains("--- VPPA Alternative ---"));
        assert!(text.contains("--- Sensitivity"));
        assert!(text.contains("Result: success"));
    }

    #[test]
    fn failed_run_report_says_so() {
        let mut cfg = PlannerConfig::baseline();
        cfg.profile.hours = 168;
        cfg.constraints.max_budget = 1_000.0;
        cfg.constraints.min_renewable_fraction = Some(0.95);
        let series = cfg.synthetic_profile().build();
        let out = pipeline::run(&series, &cfg);
        let text = out.to_string();
        assert!(text.contains("No feasible plan produced."));
        assert!(text.contains("Result: FAILED"));
    }
}
