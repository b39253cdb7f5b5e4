// crates/syndicate-cli/src/commands/simulate.rs
//
// `syndicate simulate`: replay a TOML scenario against a fresh deployment
// and report each step.

use syndicate_staking::Ledger;
use tabled::Tabled;

use crate::config::DeploymentConfig;
use crate::output::{format_json, format_table, OutputFormat};
use crate::scenario::{Scenario, ScenarioRunner, StepReport};

#[derive(Debug, Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Block")]
    block: u64,
    #[tabled(rename = "Op")]
    op: String,
    #[tabled(rename = "Result")]
    result: &'static str,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&StepReport> for StepRow {
    fn from(report: &StepReport) -> Self {
        Self {
            index: report.index,
            block: report.block,
            op: report.op.clone(),
            result: if report.passed { "ok" } else { "FAILED" },
            detail: report.detail.clone(),
        }
    }
}

/// Run the simulate subcommand. Fails if any step failed.
pub fn run(
    config: &DeploymentConfig,
    scenario_path: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(scenario_path)?;
    let ledger = Ledger::deploy(&config.to_deploy_params()?)?;
    let mut runner = ScenarioRunner::new(ledger);

    tracing::info!(
        "Replaying {} ({} steps)",
        scenario.name.as_deref().unwrap_or(scenario_path),
        scenario.steps.len()
    );
    let reports = runner.run(&scenario);
    let failed = reports.iter().filter(|r| !r.passed).count();

    match format {
        OutputFormat::Json => println!("{}", format_json(&reports)),
        OutputFormat::Table => {
            let rows: Vec<StepRow> = reports.iter().map(StepRow::from).collect();
            println!("{}", format_table(&rows));
            println!();
            println!(
                "{} of {} steps passed, final block {}",
                reports.len() - failed,
                reports.len(),
                runner.ledger().env().number
            );
        }
    }

    if failed > 0 {
        return Err(format!("{} step(s) failed", failed).into());
    }
    Ok(())
}
