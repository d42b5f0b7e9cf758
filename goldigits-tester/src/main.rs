mod harness;
mod report;
mod scenarios;

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use report::ScenarioReport;
use scenarios::{catalog, evaluate, get};

#[derive(Debug, Parser)]
#[command(name = "goldigits-tester", version)]
#[command(about = "Automated QA testing for Golden Digits - scripted sessions over the pure game logic")]
struct Args {
    /// Scenarios to run (comma-separated), or "all"
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        for scenario in catalog() {
            println!("{name:<12} {desc}", name = scenario.name, desc = scenario.description);
        }
        return Ok(());
    }

    let seeds = parse_seeds(&args.seeds)?;
    let selected = select_scenarios(&args.scenarios)?;

    let mut reports = Vec::new();
    for scenario in &selected {
        for &seed in &seeds {
            log::info!("running scenario '{}' with seed {seed}", scenario.name);
            let outcome = harness::run_session(scenario, seed);
            let failures = evaluate(scenario, &outcome);
            reports.push(ScenarioReport {
                scenario: scenario.name.to_string(),
                seed,
                passed: failures.is_empty(),
                cause: outcome
                    .cause
                    .map_or_else(|| "none".to_string(), |cause| format!("{cause:?}")),
                display_score: outcome.display_score,
                ranked_score: outcome.ranked_score,
                attempts_used: outcome.attempts_used,
                failures,
            });
        }
    }

    let rendered = match args.report.as_str() {
        "json" => report::render_json(&reports)?,
        _ => report::render_console(&reports, args.verbose),
    };
    match &args.output {
        Some(path) => {
            let mut file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            file.write_all(rendered.as_bytes())?;
        }
        None => print!("{rendered}"),
    }

    if reports.iter().any(|report| !report.passed) {
        bail!("one or more scenarios failed");
    }
    Ok(())
}

fn parse_seeds(raw: &str) -> Result<Vec<u64>> {
    let seeds: Result<Vec<u64>, _> = split_csv(raw).iter().map(|s| s.parse()).collect();
    let seeds = seeds.context("seeds must be unsigned integers")?;
    if seeds.is_empty() {
        bail!("at least one seed is required");
    }
    Ok(seeds)
}

fn select_scenarios(raw: &str) -> Result<Vec<scenarios::Scenario>> {
    if raw.trim() == "all" {
        return Ok(catalog());
    }
    let mut selected = Vec::new();
    for name in split_csv(raw) {
        let Some(scenario) = get(&name) else {
            bail!("unknown scenario '{name}'; use --list-scenarios");
        };
        selected.push(scenario);
    }
    if selected.is_empty() {
        bail!("at least one scenario is required");
    }
    Ok(selected)
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use goldigits_game::TerminationCause;

    #[test]
    fn every_catalog_scenario_passes_with_default_seed() {
        for scenario in catalog() {
            let outcome = harness::run_session(&scenario, 1337);
            let failures = evaluate(&scenario, &outcome);
            assert!(
                failures.is_empty(),
                "scenario '{}' failed: {failures:?}",
                scenario.name
            );
        }
    }

    #[test]
    fn lightning_scenario_is_seed_stable() {
        let scenario = get("lightning").unwrap();
        let first = harness::run_session(&scenario, 99);
        let second = harness::run_session(&scenario, 99);
        assert_eq!(first.display_score, second.display_score);
        assert_eq!(first.cause, Some(TerminationCause::Completed));
    }

    #[test]
    fn csv_helpers_trim_and_reject_garbage() {
        assert_eq!(split_csv(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_seeds("12, x").is_err());
        assert!(select_scenarios("no-such-scenario").is_err());
        assert_eq!(select_scenarios("all").unwrap().len(), catalog().len());
    }
}
