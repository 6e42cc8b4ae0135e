use std::path::PathBuf;

use bunksmart_core::view::Notification;
use bunksmart_core::ExportFormat;
use chrono::Utc;
use clap::{Subcommand, ValueEnum};

use super::{not_signed_in, open_engine, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Full document backup
    Json,
    /// Attendance spreadsheet
    Csv,
    /// Printable attendance report
    Text,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Text => ExportFormat::Text,
        }
    }
}

#[derive(Subcommand)]
pub enum DataAction {
    /// Export the signed-in user's data
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: FormatArg,
        /// Output file, defaults to the suggested file name ("-" for stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace data with a previous JSON export
    Import {
        path: PathBuf,
    },
    /// Delete all attendance, settings and challenges
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(action: DataAction) -> CliResult {
    let mut engine = open_engine().await?;
    if engine.user().is_none() {
        return Err(not_signed_in());
    }

    match action {
        DataAction::Export { format, output } => {
            let format = ExportFormat::from(format);
            let (file_name, body) = engine.export(format, Utc::now().date_naive())?;
            let notification = match format {
                ExportFormat::Json => Notification::data_exported(),
                ExportFormat::Csv => Notification::csv_exported(),
                ExportFormat::Text => Notification::report_exported(),
            };
            match output {
                Some(path) if path.as_os_str() == "-" => print!("{body}"),
                Some(path) => {
                    std::fs::write(&path, body)?;
                    eprintln!("{} ({})", notification.message(), path.display());
                }
                None => {
                    let path = PathBuf::from(file_name);
                    std::fs::write(&path, body)?;
                    eprintln!("{} ({})", notification.message(), path.display());
                }
            }
        }
        DataAction::Import { path } => {
            let text = std::fs::read_to_string(&path)?;
            let summary = engine.import_json(&text).await?.ok_or_else(not_signed_in)?;
            println!("{}", Notification::data_imported().message());
            super::print_json(&summary)?;
        }
        DataAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear data without --yes".into());
            }
            engine.clear_all().await?.ok_or_else(not_signed_in)?;
            println!("{}", Notification::data_cleared().message());
        }
    }
    Ok(())
}
