use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "bunksmart", version, about = "Bunk Smart attendance tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign out, show the current user
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Mark a day present or bunked
    Mark(commands::mark::MarkArgs),
    /// Show a month calendar
    Calendar(commands::calendar::CalendarArgs),
    /// Attendance statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Attendance challenges
    Challenge {
        #[command(subcommand)]
        action: commands::challenge::ChallengeAction,
    },
    /// Per-user settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Export, import and clear user data
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action).await,
        Commands::Mark(args) => commands::mark::run(args).await,
        Commands::Calendar(args) => commands::calendar::run(args).await,
        Commands::Stats { action } => commands::stats::run(action).await,
        Commands::Challenge { action } => commands::challenge::run(action).await,
        Commands::Settings { action } => commands::settings::run(action).await,
        Commands::Data { action } => commands::data::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
