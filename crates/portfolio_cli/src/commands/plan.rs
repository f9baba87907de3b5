//! `plan` command — runs a single planning cycle against a fixture file
//! and prints the resulting action candidates.

use std::path::Path;

use portfolio_engine::context::OpportunityContextBuilder;
use portfolio_engine::data::{EnrichedPosition, Security};
use portfolio_engine::registry::{CalculatorRegistry, CategoryResults, ProgressUpdate};
use portfolio_engine::PlannerConfig;
use serde::Deserialize;
use tracing::info;

use crate::error::{CliError, Result};

/// The on-disk fixture shape a planning run is assembled from.
///
/// Mirrors `portfolio_server`'s `RecommendationsRequest` body, since both
/// front ends build an [`portfolio_engine::OpportunityContext`] from the
/// same minimal inputs; a fixture file is the CLI's equivalent of a
/// recommendations request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    securities: Vec<Security>,
    positions: Vec<EnrichedPosition>,
    total_portfolio_value_eur: f64,
    available_cash_eur: f64,
    #[serde(default)]
    planner_config: Option<PlannerConfig>,
}

fn load_fixture(path: &Path) -> Result<Fixture> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::InvalidFixture {
        path: path.display().to_string(),
        source,
    })
}

/// Runs one planning cycle against the fixture at `path` and prints the
/// result in `format` (`"json"` or `"table"`).
pub fn run(path: &Path, format: &str, show_progress: bool) -> Result<()> {
    let fixture = load_fixture(path)?;
    let config = fixture.planner_config.clone().unwrap_or_default();

    let ctx = OpportunityContextBuilder::new()
        .total_portfolio_value_eur(fixture.total_portfolio_value_eur)
        .available_cash_eur(fixture.available_cash_eur)
        .add_securities(fixture.securities)
        .add_positions(fixture.positions)
        .build()
        .map_err(CliError::InvalidContext)?;

    info!(calculators = config.enabled_calculators.len(), "running planning cycle");

    let registry = CalculatorRegistry::with_default_calculators();
    let results = if show_progress {
        registry.identify_opportunities_with_progress(&ctx, &config, report_progress)
    } else {
        registry.identify_opportunities_with_exclusions(&ctx, &config)
    };

    match format {
        "json" => print_json(&results),
        "table" => print_table(&results),
        other => {
            return Err(CliError::InvalidArgument(format!(
                "unknown format: {other}. supported: json, table"
            )))
        }
    }

    Ok(())
}

fn report_progress(update: ProgressUpdate) {
    info!(
        phase = %update.phase,
        sub_phase = %update.sub_phase,
        current = update.current,
        total = update.total,
        message = %update.message,
    );
}

fn print_json(results: &CategoryResults) {
    let mut object = serde_json::Map::new();
    for (category, result) in results {
        object.insert(
            category.as_str().to_string(),
            serde_json::to_value(result).expect("CalculatorResult always serializes"),
        );
    }
    let value = serde_json::Value::Object(object);
    println!("{}", serde_json::to_string_pretty(&value).expect("value is already json"));
}

fn print_table(results: &CategoryResults) {
    println!(
        "{:<18} {:<4} {:<14} {:>10} {:>12} {:>8}  reason",
        "category", "side", "isin", "quantity", "value_eur", "priority"
    );
    for (category, result) in results {
        for candidate in &result.candidates {
            println!(
                "{:<18} {:<4} {:<14} {:>10} {:>12.2} {:>8.3}  {}",
                category.as_str(),
                format!("{:?}", candidate.side).to_uppercase(),
                candidate.isin,
                candidate.quantity,
                candidate.value_eur,
                candidate.priority,
                candidate.reason,
            );
        }
    }
    let total_candidates: usize = results.iter().map(|(_, r)| r.candidates.len()).sum();
    let total_excluded: usize = results.iter().map(|(_, r)| r.pre_filtered.len()).sum();
    println!("\n{total_candidates} candidate(s), {total_excluded} pre-filtered across {} categories", results.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_is_reported() {
        let result = run(Path::new("/does/not/exist.json"), "json", false);
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }

    #[test]
    fn malformed_fixture_is_reported() {
        let file = write_fixture("not json");
        let result = run(file.path(), "json", false);
        assert!(matches!(result, Err(CliError::InvalidFixture { .. })));
    }

    #[test]
    fn valid_fixture_with_no_calculators_enabled_succeeds() {
        let file = write_fixture(
            r#"{
                "securities": [],
                "positions": [],
                "totalPortfolioValueEur": 10000.0,
                "availableCashEur": 1000.0
            }"#,
        );
        let result = run(file.path(), "table", false);
        assert!(result.is_ok());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let file = write_fixture(
            r#"{
                "securities": [],
                "positions": [],
                "totalPortfolioValueEur": 10000.0,
                "availableCashEur": 1000.0
            }"#,
        );
        let result = run(file.path(), "xml", false);
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }
}
