//! Renewable-energy capacity planner for grid-connected facilities.
//!
//! Sizes a solar/wind/battery mix against an hourly demand profile, simulates
//! dispatch over the year, evaluates ownership economics and a virtual power
//! purchase agreement alternative, and bounds the result with Monte Carlo
//! sensitivity analysis. All randomness is seeded, so identical inputs always
//! produce identical plans.

pub mod config;
pub mod data;
/// Hourly battery/grid dispatch simulation.
pub mod dispatch;
pub mod error;
pub mod finance;
pub mod io;
pub mod optimizer;
pub mod pipeline;
pub mod report;
pub mod risk;
