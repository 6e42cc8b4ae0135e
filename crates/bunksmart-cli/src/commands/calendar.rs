use bunksmart_core::{CalendarGrid, CellStatus, YearMonth};
use chrono::Utc;
use clap::Args;

use super::{open_engine, print_json, CliResult};

#[derive(Args)]
pub struct CalendarArgs {
    /// Month to show (YYYY-MM), defaults to the current month
    #[arg(long)]
    month: Option<String>,
    /// Print the grid as JSON
    #[arg(long)]
    json: bool,
}

pub fn parse_month(raw: Option<&str>) -> Result<YearMonth, Box<dyn std::error::Error>> {
    match raw {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(YearMonth::from_date(Utc::now().date_naive())),
    }
}

pub async fn run(args: CalendarArgs) -> CliResult {
    let month = parse_month(args.month.as_deref())?;
    let engine = open_engine().await?;
    let grid = engine.calendar(month);

    if args.json {
        return print_json(&grid);
    }
    print!("{}", render(&grid));
    Ok(())
}

/// Text grid: `P` present, `B` bunked, `.` unmarked; other months blank.
fn render(grid: &CalendarGrid) -> String {
    let mut out = format!("{}\n", grid.month.label());
    let header: Vec<String> = grid.day_names().iter().map(|d| format!("{d:>4}")).collect();
    out.push_str(&header.concat());
    out.push('\n');

    for week in grid.weeks() {
        for cell in week {
            if !cell.in_month {
                out.push_str("    ");
                continue;
            }
            let mark = match cell.status {
                CellStatus::Present => 'P',
                CellStatus::Bunked => 'B',
                CellStatus::Unmarked => '.',
            };
            out.push_str(&format!("{:>3}{mark}", cell.day()));
        }
        out.push('\n');
    }
    out
}
