//! Integration tests for the capacity optimizer with the simulator-backed
//! objective.

mod common;

use renplan::data::{HourlyRecord, HourlySeries};
use renplan::dispatch::{Capacities, DispatchSummary, simulate};
use renplan::error::PlanError;
use renplan::optimizer;

#[test]
fn generous_budget_produces_nonzero_plan() {
    let series = common::week_series();
    let solution = optimizer::optimize(
        &series,
        &common::default_costs(),
        &common::constraints_with_budget(500_000.0),
        &common::default_battery(),
        &common::default_optimizer(),
    )
    .expect("generous budget should be feasible");

    let caps = &solution.capacities;
    assert!(
        caps.solar_kw > 0.0 || caps.wind_kw > 0.0,
        "some generation should be bought: {caps:?}"
    );
    assert!(solution.iterations <= 100, "must respect the iteration cap");
    assert!(solution.capital_cost <= 500_000.0 + 1e-6);
}

#[test]
fn solution_always_within_budget() {
    let series = common::week_series();
    let costs = common::default_costs();
    for budget in [5_000.0, 25_000.0, 100_000.0, 400_000.0] {
        let solution = optimizer::optimize(
            &series,
            &costs,
            &common::constraints_with_budget(budget),
            &common::default_battery(),
            &common::default_optimizer(),
        )
        .expect("unconstrained-mix budgets are always feasible");
        assert!(
            solution.capital_cost <= budget + 1e-6,
            "budget {budget} exceeded: {}",
            solution.capital_cost
        );
    }
}

#[test]
fn flat_daylight_solar_covers_daytime_demand() {
    // 24 identical hours: flat 100 kW demand, full solar yield from 06:00 to
    // 18:00, no wind, no battery. With an effectively unconstrained budget
    // the search should buy at least enough solar to cover daytime demand.
    let series = HourlySeries::new(
        (0..24)
            .map(|hour| HourlyRecord {
                hour,
                demand_kw: 100.0,
                solar_yield: if (6..18).contains(&hour) { 1.0 } else { 0.0 },
                wind_yield: 0.0,
                grid_price: 0.18,
                grid_carbon: 0.4,
            })
            .collect(),
    );
    let mut constraints = common::constraints_with_budget(5_000_000.0);
    constraints.battery_max_kwh = Some(0.0);

    let solution = optimizer::optimize(
        &series,
        &common::default_costs(),
        &constraints,
        &common::default_battery(),
        &common::default_optimizer(),
    )
    .expect("no mandate, so always feasible");

    assert!(
        solution.capacities.solar_kw >= 100.0,
        "solar {} should cover the 100 kW daytime demand",
        solution.capacities.solar_kw
    );
    assert_eq!(solution.capacities.battery_kwh, 0.0);

    let trace = simulate(&solution.capacities, &series, &common::default_battery());
    for r in &trace {
        if (6..18).contains(&r.hour) {
            assert!(r.grid_kw.abs() < 1e-9, "hour {}: unexpected grid import", r.hour);
        } else {
            assert!((r.grid_kw - r.demand_kw).abs() < 1e-9);
        }
    }
}

#[test]
fn capacity_ceilings_are_respected() {
    let series = common::week_series();
    let mut constraints = common::constraints_with_budget(500_000.0);
    constraints.solar_max_kw = Some(20.0);
    constraints.wind_max_kw = Some(10.0);
    constraints.battery_max_kwh = Some(40.0);

    let solution = optimizer::optimize(
        &series,
        &common::default_costs(),
        &constraints,
        &common::default_battery(),
        &common::default_optimizer(),
    )
    .expect("ceilings without a mandate stay feasible");

    let caps = &solution.capacities;
    assert!(caps.solar_kw <= 20.0 + 1e-9);
    assert!(caps.wind_kw <= 10.0 + 1e-9);
    assert!(caps.battery_kwh <= 40.0 + 1e-9);
}

#[test]
fn zero_budget_returns_grid_only_plan() {
    let series = common::week_series();
    let solution = optimizer::optimize(
        &series,
        &common::default_costs(),
        &common::constraints_with_budget(0.0),
        &common::default_battery(),
        &common::default_optimizer(),
    )
    .expect("zero budget is the valid degenerate plan");

    assert_eq!(solution.capacities, Capacities::ZERO);
    assert_eq!(solution.capital_cost, 0.0);
    assert_eq!(solution.iterations, 0);
}

#[test]
fn negative_budget_is_a_validation_error() {
    let series = common::week_series();
    let err = optimizer::optimize(
        &series,
        &common::default_costs(),
        &common::constraints_with_budget(-10.0),
        &common::default_battery(),
        &common::default_optimizer(),
    )
    .unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));
}

#[test]
fn unreachable_mandate_is_infeasible() {
    let series = common::week_series();
    let mut constraints = common::constraints_with_budget(2_000.0);
    constraints.min_renewable_fraction = Some(0.95);

    let err = optimizer::optimize(
        &series,
        &common::default_costs(),
        &constraints,
        &common::default_battery(),
        &common::default_optimizer(),
    )
    .unwrap_err();
    assert!(matches!(err, PlanError::Infeasible(_)), "got {err:?}");
}

#[test]
fn bigger_budget_never_hurts_the_objective() {
    let series = common::week_series();
    let costs = common::default_costs();
    let mut previous: Option<f64> = None;
    for budget in [20_000.0, 80_000.0, 250_000.0] {
        let solution = optimizer::optimize(
            &series,
            &costs,
            &common::constraints_with_budget(budget),
            &common::default_battery(),
            &common::default_optimizer(),
        )
        .expect("feasible");
        if let Some(prev) = previous {
            // A larger budget can only widen the feasible set. Allow a hair
            // of slack for the discrete step search.
            assert!(
                solution.objective <= prev * 1.01,
                "objective worsened from {prev} to {} at budget {budget}",
                solution.objective
            );
        }
        previous = Some(solution.objective);
    }
}

#[test]
fn bigger_budget_never_reduces_the_renewable_fraction() {
    // A larger budget can only widen the feasible set, so the achievable
    // renewable fraction must be weakly non-decreasing up the ladder.
    let series = common::week_series();
    let costs = common::default_costs();
    let battery = common::default_battery();
    let mut previous: Option<f64> = None;
    for budget in [
        10_000.0, 20_000.0, 40_000.0, 80_000.0, 160_000.0, 320_000.0, 640_000.0, 1_000_000.0,
    ] {
        let solution = optimizer::optimize(
            &series,
            &costs,
            &common::constraints_with_budget(budget),
            &battery,
            &common::default_optimizer(),
        )
        .expect("no mandate, so always feasible");
        let trace = simulate(&solution.capacities, &series, &battery);
        let fraction = DispatchSummary::from_trace(&trace, &series).renewable_fraction();
        if let Some(prev) = previous {
            assert!(
                fraction + 1e-9 >= prev,
                "renewable fraction fell from {prev} to {fraction} at budget {budget}"
            );
        }
        previous = Some(fraction);
    }
}

#[test]
fn optimizer_is_deterministic() {
    let series = common::week_series();
    let run = || {
        optimizer::optimize(
            &series,
            &common::default_costs(),
            &common::constraints_with_budget(200_000.0),
            &common::default_battery(),
            &common::default_optimizer(),
        )
        .expect("feasible")
    };
    let a = run();
    let b = run();
    assert_eq!(a.capacities, b.capacities);
    assert_eq!(a.objective.to_bits(), b.objective.to_bits());
    assert_eq!(a.iterations, b.iterations);
}
