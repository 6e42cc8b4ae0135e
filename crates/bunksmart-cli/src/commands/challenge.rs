use bunksmart_core::view::Notification;
use bunksmart_core::ChallengeId;
use chrono::Utc;
use clap::Subcommand;

use super::{not_signed_in, open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Show every challenge card
    List {
        /// Print the cards as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start or restart a challenge
    Start {
        /// Challenge id (e.g. 30_days_hard, custom_challenge)
        id: ChallengeId,
        /// Target days for the custom challenge
        #[arg(long)]
        goal: Option<u32>,
    },
    /// Check in for today (requires today marked present)
    CheckIn {
        /// Challenge id
        id: ChallengeId,
    },
}

pub async fn run(action: ChallengeAction) -> CliResult {
    let mut engine = open_engine().await?;
    let now = Utc::now();

    match action {
        ChallengeAction::List { json } => {
            let cards = engine.challenge_cards(now);
            if json {
                return print_json(&cards);
            }
            for card in cards {
                let badge = if card.badge { " [done]" } else { "" };
                println!(
                    "{:<18} {:<20} {:>5.1}%  {}{badge}",
                    card.id.as_str(),
                    card.title,
                    card.progress_pct,
                    card.progress_text
                );
            }
        }
        ChallengeAction::Start { id, goal } => {
            let outcome = engine
                .start_challenge(id, goal, now)
                .await?
                .ok_or_else(not_signed_in)?;
            println!("{}", Notification::started(outcome).message());
        }
        ChallengeAction::CheckIn { id } => {
            let report = engine.check_in(id, now).await?.ok_or_else(not_signed_in)?;
            println!("{}", Notification::checked_in(report.outcome).message());
            println!(
                "{}: {}/{} days, streak {}",
                report.challenge.title(),
                report.completed_days,
                report.total_days,
                report.streak
            );
        }
    }
    Ok(())
}
