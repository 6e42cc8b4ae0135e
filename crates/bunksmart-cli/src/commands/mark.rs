use bunksmart_core::view::Notification;
use bunksmart_core::{AttendanceStatus, DateKey, MarkDetails};
use chrono::Utc;
use clap::Args;

use super::{not_signed_in, open_engine, print_json, CliResult};

#[derive(Args)]
pub struct MarkArgs {
    /// Day to mark (YYYY-MM-DD or "today")
    date: String,
    /// present or bunked
    status: String,
    /// What you did instead (bunks only)
    #[arg(long)]
    activity: Option<String>,
    /// What you missed (bunks only)
    #[arg(long)]
    missed: Option<String>,
    /// Do not check in active challenges after marking today present
    #[arg(long)]
    no_check_in: bool,
}

pub fn parse_date(raw: &str) -> Result<DateKey, Box<dyn std::error::Error>> {
    if raw.eq_ignore_ascii_case("today") {
        return DateKey::from_datetime(Utc::now()).ok_or_else(|| "today is out of range".into());
    }
    Ok(DateKey::parse(raw)?)
}

pub async fn run(args: MarkArgs) -> CliResult {
    let date = parse_date(&args.date)?;
    let status: AttendanceStatus = args.status.parse()?;
    let details = MarkDetails {
        activity: args.activity,
        missed: args.missed,
    };

    let mut engine = open_engine().await?;
    let record = engine
        .mark_date(date, status, details)
        .await?
        .ok_or_else(not_signed_in)?;
    eprintln!("{}", Notification::attendance_saved().message());
    print_json(&serde_json::json!({ "date": date, "record": record }))?;

    let now = Utc::now();
    let is_today = DateKey::from_datetime(now) == Some(date);
    if record.is_present() && is_today && !args.no_check_in {
        if let Some(reports) = engine.check_in_active(now).await? {
            for report in &reports {
                eprintln!(
                    "{}: {}",
                    report.challenge.title(),
                    Notification::checked_in(report.outcome).message()
                );
            }
        }
    }
    Ok(())
}
