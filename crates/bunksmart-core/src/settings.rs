//! Per-user settings stored in the user document.
//!
//! The document keeps settings as a loose `key -> JSON value` map. This module
//! gives the known keys a type, a default and a validator; unknown keys are
//! rejected on write.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::calendar::WeekStart;
use crate::error::ValidationError;

pub type SettingsMap = BTreeMap<String, Value>;

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Shape of a setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
    Text,
    /// Non-negative integer with an inclusive upper bound.
    Integer { max: u64 },
    /// `HH:MM`, 24-hour clock.
    Time,
    Choice(&'static [&'static str]),
    /// List of weekday abbreviations.
    Weekdays,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    DisplayName,
    EmailNotifications,
    PushNotifications,
    ReminderTime,
    Theme,
    StartWeek,
    Language,
    Timezone,
    DefaultAttendance,
    AttendanceReminder,
    StreakGoal,
    WorkingDays,
    DataSharing,
    TwoFactor,
    SessionTimeout,
    AutoBackup,
    BackupFrequency,
}

impl SettingKey {
    pub const ALL: [SettingKey; 17] = [
        SettingKey::DisplayName,
        SettingKey::EmailNotifications,
        SettingKey::PushNotifications,
        SettingKey::ReminderTime,
        SettingKey::Theme,
        SettingKey::StartWeek,
        SettingKey::Language,
        SettingKey::Timezone,
        SettingKey::DefaultAttendance,
        SettingKey::AttendanceReminder,
        SettingKey::StreakGoal,
        SettingKey::WorkingDays,
        SettingKey::DataSharing,
        SettingKey::TwoFactor,
        SettingKey::SessionTimeout,
        SettingKey::AutoBackup,
        SettingKey::BackupFrequency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::DisplayName => "displayName",
            SettingKey::EmailNotifications => "emailNotifications",
            SettingKey::PushNotifications => "pushNotifications",
            SettingKey::ReminderTime => "reminderTime",
            SettingKey::Theme => "theme",
            SettingKey::StartWeek => "startWeek",
            SettingKey::Language => "language",
            SettingKey::Timezone => "timezone",
            SettingKey::DefaultAttendance => "defaultAttendance",
            SettingKey::AttendanceReminder => "attendanceReminder",
            SettingKey::StreakGoal => "streakGoal",
            SettingKey::WorkingDays => "workingDays",
            SettingKey::DataSharing => "dataSharing",
            SettingKey::TwoFactor => "twoFactor",
            SettingKey::SessionTimeout => "sessionTimeout",
            SettingKey::AutoBackup => "autoBackup",
            SettingKey::BackupFrequency => "backupFrequency",
        }
    }

    pub fn kind(&self) -> SettingKind {
        match self {
            SettingKey::DisplayName | SettingKey::Language | SettingKey::Timezone => {
                SettingKind::Text
            }
            SettingKey::EmailNotifications
            | SettingKey::PushNotifications
            | SettingKey::AttendanceReminder
            | SettingKey::DataSharing
            | SettingKey::TwoFactor
            | SettingKey::AutoBackup => SettingKind::Bool,
            SettingKey::ReminderTime => SettingKind::Time,
            SettingKey::Theme => SettingKind::Choice(&["light", "dark"]),
            SettingKey::StartWeek => SettingKind::Choice(&["sunday", "monday"]),
            SettingKey::DefaultAttendance => SettingKind::Choice(&["ask", "present", "bunked"]),
            SettingKey::StreakGoal => SettingKind::Integer { max: 100 },
            SettingKey::WorkingDays => SettingKind::Weekdays,
            SettingKey::SessionTimeout => SettingKind::Integer { max: 24 * 60 },
            SettingKey::BackupFrequency => {
                SettingKind::Choice(&["daily", "weekly", "monthly"])
            }
        }
    }

    /// Value assumed while the user has not set the key.
    pub fn default_value(&self) -> Value {
        match self {
            SettingKey::DisplayName => json!(""),
            SettingKey::EmailNotifications => json!(true),
            SettingKey::PushNotifications => json!(true),
            SettingKey::ReminderTime => json!("09:00"),
            SettingKey::Theme => json!("light"),
            SettingKey::StartWeek => json!("sunday"),
            SettingKey::Language => json!("en"),
            SettingKey::Timezone => json!("Asia/Kolkata"),
            SettingKey::DefaultAttendance => json!("ask"),
            SettingKey::AttendanceReminder => json!(true),
            SettingKey::StreakGoal => json!(95),
            SettingKey::WorkingDays => json!(["mon", "tue", "wed", "thu", "fri"]),
            SettingKey::DataSharing => json!(false),
            SettingKey::TwoFactor => json!(false),
            SettingKey::SessionTimeout => json!(60),
            SettingKey::AutoBackup => json!(true),
            SettingKey::BackupFrequency => json!("weekly"),
        }
    }

    /// Check that `value` has the shape this key expects.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: self.as_str().to_string(),
            message,
        };

        match (self.kind(), value) {
            (SettingKind::Bool, Value::Bool(_)) => Ok(()),
            (SettingKind::Text, Value::String(_)) => Ok(()),
            (SettingKind::Integer { max }, Value::Number(n)) => match n.as_u64() {
                Some(v) if v <= max => Ok(()),
                _ => Err(invalid(format!("expected an integer in 0..={max}"))),
            },
            (SettingKind::Time, Value::String(s)) => {
                if is_clock_time(s) {
                    Ok(())
                } else {
                    Err(invalid(format!("'{s}' is not HH:MM")))
                }
            }
            (SettingKind::Choice(options), Value::String(s)) => {
                if options.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(invalid(format!("'{s}' is not one of {}", options.join(", "))))
                }
            }
            (SettingKind::Weekdays, Value::Array(days)) => {
                for day in days {
                    match day.as_str() {
                        Some(d) if WEEKDAYS.contains(&d) => {}
                        _ => return Err(invalid(format!("{day} is not a weekday abbreviation"))),
                    }
                }
                Ok(())
            }
            (kind, other) => Err(invalid(format!("{other} does not fit {kind:?}"))),
        }
    }

    /// Parse command-line text into a value of this key's kind.
    pub fn parse_value(&self, raw: &str) -> Result<Value, ValidationError> {
        let raw = raw.trim();
        let value = match self.kind() {
            SettingKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Value::Bool(true),
                "false" | "off" | "no" | "0" => Value::Bool(false),
                _ => {
                    return Err(ValidationError::InvalidValue {
                        field: self.as_str().to_string(),
                        message: format!("'{raw}' is not a boolean"),
                    })
                }
            },
            SettingKind::Integer { .. } => {
                let n: u64 = raw.parse().map_err(|_| ValidationError::InvalidValue {
                    field: self.as_str().to_string(),
                    message: format!("'{raw}' is not an integer"),
                })?;
                json!(n)
            }
            SettingKind::Weekdays => Value::Array(
                raw.split(',')
                    .map(|d| d.trim().to_ascii_lowercase())
                    .filter(|d| !d.is_empty())
                    .map(Value::String)
                    .collect(),
            ),
            SettingKind::Text | SettingKind::Time | SettingKind::Choice(_) => {
                Value::String(raw.to_string())
            }
        };
        self.validate(&value)?;
        Ok(value)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownSetting(s.to_string()))
    }
}

fn is_clock_time(s: &str) -> bool {
    let Some((h, m)) = s.split_once(':') else {
        return false;
    };
    if h.len() != 2 || m.len() != 2 {
        return false;
    }
    matches!((h.parse::<u32>(), m.parse::<u32>()), (Ok(h), Ok(m)) if h < 24 && m < 60)
}

/// Stored value of `key`, or its default.
pub fn effective_value(settings: &SettingsMap, key: SettingKey) -> Value {
    settings
        .get(key.as_str())
        .cloned()
        .unwrap_or_else(|| key.default_value())
}

/// Every known key with its effective value.
pub fn resolved(settings: &SettingsMap) -> SettingsMap {
    SettingKey::ALL
        .into_iter()
        .map(|k| (k.as_str().to_string(), effective_value(settings, k)))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// The settings the engine itself acts on, read leniently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreferences {
    pub display_name: Option<String>,
    pub theme: Theme,
    pub week_start: WeekStart,
    pub streak_goal: u32,
}

impl UserPreferences {
    /// Malformed stored values fall back to defaults.
    pub fn from_settings(settings: &SettingsMap) -> Self {
        let text = |key: SettingKey| effective_value(settings, key).as_str().map(str::to_string);

        let display_name = text(SettingKey::DisplayName).filter(|s| !s.trim().is_empty());
        let theme = match text(SettingKey::Theme).as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        };
        let week_start = text(SettingKey::StartWeek)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let streak_goal = effective_value(settings, SettingKey::StreakGoal)
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(95);

        Self {
            display_name,
            theme,
            week_start,
            streak_goal,
        }
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::from_settings(&SettingsMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
            key.validate(&key.default_value()).unwrap();
        }
        assert!(matches!(
            "favouriteColour".parse::<SettingKey>(),
            Err(ValidationError::UnknownSetting(_))
        ));
    }

    #[test]
    fn validates_value_shapes() {
        assert!(SettingKey::Theme.validate(&json!("dark")).is_ok());
        assert!(SettingKey::Theme.validate(&json!("purple")).is_err());
        assert!(SettingKey::StreakGoal.validate(&json!(101)).is_err());
        assert!(SettingKey::StreakGoal.validate(&json!("90")).is_err());
        assert!(SettingKey::ReminderTime.validate(&json!("24:00")).is_err());
        assert!(SettingKey::WorkingDays.validate(&json!(["mon", "funday"])).is_err());
    }

    #[test]
    fn parses_cli_text() {
        assert_eq!(SettingKey::AutoBackup.parse_value("off").unwrap(), json!(false));
        assert_eq!(SettingKey::SessionTimeout.parse_value("30").unwrap(), json!(30));
        assert_eq!(
            SettingKey::WorkingDays.parse_value("Mon, wed,fri").unwrap(),
            json!(["mon", "wed", "fri"])
        );
        assert_eq!(SettingKey::ReminderTime.parse_value("07:30").unwrap(), json!("07:30"));
        assert!(SettingKey::TwoFactor.parse_value("maybe").is_err());
    }

    #[test]
    fn preferences_fall_back_to_defaults() {
        let prefs = UserPreferences::default();
        assert_eq!(prefs.week_start, WeekStart::Sunday);
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.streak_goal, 95);
        assert_eq!(prefs.display_name, None);

        let mut settings = SettingsMap::new();
        settings.insert("startWeek".into(), json!("monday"));
        settings.insert("theme".into(), json!(42));
        settings.insert("displayName".into(), json!("Asha"));
        let prefs = UserPreferences::from_settings(&settings);
        assert_eq!(prefs.week_start, WeekStart::Monday);
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.display_name.as_deref(), Some("Asha"));
    }

    #[test]
    fn resolved_lists_every_key() {
        let resolved = resolved(&SettingsMap::new());
        assert_eq!(resolved.len(), SettingKey::ALL.len());
        assert_eq!(resolved["timezone"], json!("Asia/Kolkata"));
    }
}
