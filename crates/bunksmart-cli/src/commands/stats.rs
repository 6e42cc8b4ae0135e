use clap::Subcommand;

use super::calendar::parse_month;
use super::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Rate, counts and best streak for one month
    Month {
        /// Month (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
    /// Projected attendance rate at the end of the year
    Project,
    /// Present and bunk shares per month
    Monthly,
    /// Every bunk with what was done and missed
    Bunks,
}

pub async fn run(action: StatsAction) -> CliResult {
    let engine = open_engine().await?;

    match action {
        StatsAction::Month { month } => {
            let month = parse_month(month.as_deref())?;
            let stats = engine.stats(month);
            println!("{}", month.label());
            println!("  rate:       {}%", stats.rate);
            println!("  present:    {}", stats.present_count);
            println!("  bunked:     {}", stats.bunk_count);
            println!("  best streak: {}", stats.max_streak);
        }
        StatsAction::Project => {
            println!("{}%", engine.projected_year_end_rate());
        }
        StatsAction::Monthly => print_json(&engine.monthly_breakdown())?,
        StatsAction::Bunks => print_json(&engine.bunk_log())?,
    }
    Ok(())
}
