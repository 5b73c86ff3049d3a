//! Runs the binary against the bundled scenario files and checks that the
//! plans they produce actually differ.

use std::process::Command;

#[derive(Debug)]
struct PlanMetrics {
    renewable_fraction_pct: f64,
    capital_cost: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_plans() {
    let baseline = run_and_parse("scenarios/baseline.toml");
    let high_renewables = run_and_parse("scenarios/high_renewables.toml");
    let tight_budget = run_and_parse("scenarios/tight_budget.toml");

    assert!(
        high_renewables.renewable_fraction_pct >= 60.0 - 1e-6,
        "mandate should be met: {:.1}%",
        high_renewables.renewable_fraction_pct
    );

    assert!(
        tight_budget.capital_cost <= 60_000.0 + 1e-6,
        "tight budget exceeded: {:.0}",
        tight_budget.capital_cost
    );

    assert!(
        baseline.capital_cost <= 250_000.0 + 1e-6,
        "baseline budget exceeded: {:.0}",
        baseline.capital_cost
    );

    assert!(
        (baseline.capital_cost - tight_budget.capital_cost).abs() > 1.0,
        "expected baseline and tight_budget capital to differ: baseline={:.0}, tight={:.0}",
        baseline.capital_cost,
        tight_budget.capital_cost
    );
}

#[test]
fn seed_override_changes_the_plan() {
    let a = run_with_args(&["--scenario", "scenarios/baseline.toml"]);
    let b = run_with_args(&["--scenario", "scenarios/baseline.toml", "--seed", "777"]);
    let differs = ["Renewable fraction:", "Capital cost:", "NPV:"]
        .iter()
        .any(|label| {
            let unit = if label.starts_with("Renewable") { "%" } else { "" };
            (parse_metric(&a, label, unit) - parse_metric(&b, label, unit)).abs() > 1e-9
        });
    assert!(differs, "different profile seeds should change the plan");
}

fn run_and_parse(path: &str) -> PlanMetrics {
    let stdout = run_with_args(&["--scenario", path]);
    PlanMetrics {
        renewable_fraction_pct: parse_metric(&stdout, "Renewable fraction:", "%"),
        capital_cost: parse_metric(&stdout, "Capital cost:", ""),
    }
}

fn run_with_args(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_renplan"))
        .args(args)
        .output()
        .expect("renplan process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing report line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid report format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from report line `{line}`"))
}
