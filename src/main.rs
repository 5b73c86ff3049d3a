//! Capacity planner entry point — CLI wiring and pipeline execution.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use renplan::config::PlannerConfig;
use renplan::io::export::export_csv;
use renplan::pipeline;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    hours_override: Option<usize>,
    trace_out: Option<String>,
    no_sensitivity: bool,
}

fn print_help() {
    eprintln!("renplan: renewable-energy capacity planner");
    eprintln!();
    eprintln!("Usage: renplan [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>    Load scenario from TOML config file");
    eprintln!("  --preset <name>      Use a built-in preset (baseline)");
    eprintln!("  --seed <u64>         Override profile random seed");
    eprintln!("  --hours <n>          Override profile length in hours");
    eprintln!("  --trace-out <path>   Export hourly dispatch trace to CSV");
    eprintln!("  --no-sensitivity     Skip the Monte Carlo sensitivity stage");
    eprintln!("  --help               Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        hours_override: None,
        trace_out: None,
        no_sensitivity: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--hours" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --hours requires a positive integer argument");
                    process::exit(1);
                }
                if let Ok(h) = args[i].parse::<usize>() {
                    cli.hours_override = Some(h);
                } else {
                    eprintln!(
                        "error: --hours value \"{}\" is not a valid integer",
                        args[i]
                    );
                    process::exit(1);
                }
            }
            "--trace-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --trace-out requires a path argument");
                    process::exit(1);
                }
                cli.trace_out = Some(args[i].clone());
            }
            "--no-sensitivity" => {
                cli.no_sensitivity = true;
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    // --scenario takes priority over --preset; baseline is the fallback.
    let mut config = if let Some(ref path) = cli.scenario_path {
        match PlannerConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match PlannerConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        PlannerConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        config.profile.seed = seed;
    }
    if let Some(hours) = cli.hours_override {
        config.profile.hours = hours;
    }
    if cli.no_sensitivity {
        config.risk.enabled = false;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let series = config.synthetic_profile().build();
    let output = pipeline::run(&series, &config);

    println!("{output}");

    if let Some(ref path) = cli.trace_out {
        match &output.trace {
            Some(trace) => {
                if let Err(e) = export_csv(trace, Path::new(path)) {
                    eprintln!("error: failed to write CSV: {e}");
                    process::exit(1);
                }
                eprintln!("Trace written to {path}");
            }
            None => eprintln!("warning: no dispatch trace to export"),
        }
    }

    if !output.is_success() {
        process::exit(1);
    }
}
