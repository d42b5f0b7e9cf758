//! Report rendering for scenario runs.

use colored::Colorize;
use serde::Serialize;

/// Result of one scenario/seed pair.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub seed: u64,
    pub passed: bool,
    pub cause: String,
    pub display_score: u32,
    pub ranked_score: Option<u32>,
    pub attempts_used: u32,
    pub failures: Vec<String>,
}

/// Render reports for a terminal.
#[must_use]
pub fn render_console(reports: &[ScenarioReport], verbose: bool) -> String {
    let mut out = String::new();
    for report in reports {
        let verdict = if report.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        out.push_str(&format!(
            "{verdict} {scenario} (seed {seed}): {cause}, display {display}, ranked {ranked}, attempts {attempts}\n",
            scenario = report.scenario.bold(),
            seed = report.seed,
            cause = report.cause,
            display = report.display_score,
            ranked = report
                .ranked_score
                .map_or_else(|| "-".to_string(), |score| score.to_string()),
            attempts = report.attempts_used,
        ));
        if verbose || !report.passed {
            for failure in &report.failures {
                out.push_str(&format!("  {} {failure}\n", "!".yellow()));
            }
        }
    }
    let failed = reports.iter().filter(|r| !r.passed).count();
    let summary = format!("{} passed, {} failed", reports.len() - failed, failed);
    if failed == 0 {
        out.push_str(&format!("{}\n", summary.green()));
    } else {
        out.push_str(&format!("{}\n", summary.red()));
    }
    out
}

/// Render reports as a JSON document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(reports: &[ScenarioReport]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(reports)
}
