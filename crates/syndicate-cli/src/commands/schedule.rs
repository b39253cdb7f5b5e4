// crates/syndicate-cli/src/commands/schedule.rs
//
// `syndicate schedule`: print the decaying emission schedule.

use serde::Serialize;
use syndicate_core::{to_amount, Units};
use syndicate_staking::EmissionSchedule;
use tabled::Tabled;

use crate::config::DeploymentConfig;
use crate::output::{render, OutputFormat};

/// One update period of the schedule.
#[derive(Debug, Serialize, Tabled)]
pub struct PeriodRow {
    #[tabled(rename = "Period")]
    pub period: u64,
    #[tabled(rename = "First Block")]
    pub first_block: u64,
    #[tabled(rename = "Last Block")]
    pub last_block: u64,
    #[tabled(rename = "Reward/Block")]
    pub reward_per_block: String,
    #[tabled(rename = "Period Emission")]
    pub emission: String,
}

/// The first `count` update periods of `schedule`.
pub fn period_rows(
    schedule: &EmissionSchedule,
    count: u64,
) -> Result<Vec<PeriodRow>, Box<dyn std::error::Error>> {
    schedule
        .periods(count)
        .into_iter()
        .map(|(period, first_block, reward)| {
            let next = schedule
                .period_start(period + 1)
                .min(schedule.end_block);
            let emission = to_amount(schedule.emitted_between(first_block, next))?;
            Ok(PeriodRow {
                period,
                first_block,
                last_block: next - 1,
                reward_per_block: Units(reward).to_string(),
                emission: Units(emission).to_string(),
            })
        })
        .collect()
}

/// Run the schedule subcommand.
pub fn run(
    config: &DeploymentConfig,
    periods: u64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = config.to_deploy_params()?;
    let start = params.genesis.number;
    let schedule = EmissionSchedule::new(
        params.reward_per_block,
        params.blocks_per_update,
        start,
        start + params.emission_blocks,
    )?
    .with_decay(params.decay_numerator, params.decay_denominator)?;

    let rows = period_rows(&schedule, periods)?;
    println!("{}", render(&rows, format));
    if format == OutputFormat::Table {
        let total = to_amount(schedule.total_emission())?;
        println!();
        println!(
            "Blocks {}..{}, {} per update, decay {}/{}",
            schedule.start_block,
            schedule.end_block,
            schedule.blocks_per_update,
            schedule.decay_numerator,
            schedule.decay_denominator
        );
        println!("Total emission: {} {}", Units(total), config.escrowed_symbol);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndicate_core::units;

    #[test]
    fn test_period_rows() {
        let schedule = EmissionSchedule::new(units(990), 100, 0, 250).unwrap();
        let rows = period_rows(&schedule, 10).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].reward_per_block, "990");
        assert_eq!(rows[0].emission, "99000");
        assert_eq!(rows[1].reward_per_block, "960.3");
        assert_eq!(rows[2].first_block, 200);
        assert_eq!(rows[2].last_block, 249);
    }
}
