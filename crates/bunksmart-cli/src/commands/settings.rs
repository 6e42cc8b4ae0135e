use bunksmart_core::settings::{effective_value, resolved};
use bunksmart_core::SettingKey;
use clap::Subcommand;

use super::{not_signed_in, open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print one setting, or its default when unset
    Get {
        /// Setting key (e.g. "theme", "streakGoal")
        key: SettingKey,
    },
    /// Validate and store one setting
    Set {
        key: SettingKey,
        /// New value, parsed according to the setting's kind
        value: String,
    },
    /// Print every setting with its effective value
    List,
}

pub async fn run(action: SettingsAction) -> CliResult {
    let mut engine = open_engine().await?;

    match action {
        SettingsAction::Get { key } => {
            print_json(&effective_value(engine.settings(), key))?;
        }
        SettingsAction::Set { key, value } => {
            let value = key.parse_value(&value)?;
            engine
                .save_setting(key.as_str(), value)
                .await?
                .ok_or_else(not_signed_in)?;
            println!("ok");
        }
        SettingsAction::List => print_json(&resolved(engine.settings()))?,
    }
    Ok(())
}
