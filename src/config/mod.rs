use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::calendar::{calendar_by_name, AdjustDirection, HolidayCalendar};
use crate::errors::{RecurrenceError, Result};
use crate::recurrence::{ExpanderSettings, RecurrenceExpander, DEFAULT_SAFETY_CEILING};
use crate::utils::fs::write_atomic;

const DEFAULT_DIR_NAME: &str = ".cashflow_core";
const CONFIG_FILE: &str = "config.json";
const HOME_ENV: &str = "CASHFLOW_CORE_HOME";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub locale: String,
    pub calendar: String,
    /// Instances generated for rules with no count and no end date.
    pub safety_ceiling: u32,
    /// Cap on explicit `occurrences`; absent means no cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_occurrences: Option<u32>,
    pub due_date_direction: AdjustDirection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            locale: "pt-BR".into(),
            calendar: "brazil".into(),
            safety_ceiling: DEFAULT_SAFETY_CEILING,
            max_occurrences: None,
            due_date_direction: AdjustDirection::Forward,
        }
    }
}

impl Settings {
    pub fn expander_settings(&self) -> ExpanderSettings {
        ExpanderSettings {
            safety_ceiling: self.safety_ceiling,
            max_occurrences: self.max_occurrences,
            direction: self.due_date_direction,
        }
    }

    pub fn holiday_calendar(&self) -> Result<Box<dyn HolidayCalendar>> {
        calendar_by_name(&self.calendar).ok_or_else(|| {
            RecurrenceError::Validation(format!("unknown holiday calendar `{}`", self.calendar))
        })
    }

    /// Builds an expander over the configured calendar.
    pub fn build_expander(&self) -> Result<RecurrenceExpander<Box<dyn HolidayCalendar>>> {
        self.validate()?;
        Ok(RecurrenceExpander::new(self.holiday_calendar()?).with_settings(self.expander_settings()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.safety_ceiling == 0 {
            return Err(RecurrenceError::Validation(
                "safety ceiling must be at least 1".into(),
            ));
        }
        if let Some(max) = self.max_occurrences {
            if self.safety_ceiling > max {
                return Err(RecurrenceError::Validation(format!(
                    "safety ceiling {} exceeds max occurrences {}",
                    self.safety_ceiling, max
                )));
            }
        }
        self.holiday_calendar().map(|_| ())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Uses `$CASHFLOW_CORE_HOME`, falling back to `~/.cashflow_core`.
    pub fn new() -> Self {
        Self::with_base_dir(base_dir())
    }

    pub fn with_base_dir(base: impl Into<PathBuf>) -> Self {
        Self {
            path: base.into().join(CONFIG_FILE),
        }
    }

    /// Reads the settings file; a missing file yields the defaults.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(Settings::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let settings: Settings = serde_json::from_str(&data)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;
        let json = serde_json::to_string_pretty(settings)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn base_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path());
        let settings = manager.load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.expander_settings().safety_ceiling, 12);
        let expander = settings.build_expander().unwrap();
        assert_eq!(expander.calendar().name(), "Brazil (national)");
    }

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().join("nested"));
        let settings = Settings {
            safety_ceiling: 24,
            due_date_direction: AdjustDirection::Backward,
            ..Settings::default()
        };
        manager.save(&settings).unwrap();
        assert_eq!(manager.load().unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), r#"{"safetyCeiling": 6}"#).unwrap();
        let settings = ConfigManager::with_base_dir(temp.path()).load().unwrap();
        assert_eq!(settings.safety_ceiling, 6);
        assert_eq!(settings.calendar, "brazil");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let zero = Settings {
            safety_ceiling: 0,
            ..Settings::default()
        };
        assert!(zero.validate().is_err());
        let capped = Settings {
            max_occurrences: Some(6),
            ..Settings::default()
        };
        assert!(capped.validate().is_err());
        let unknown = Settings {
            calendar: "mars".into(),
            ..Settings::default()
        };
        assert!(matches!(
            unknown.validate(),
            Err(RecurrenceError::Validation(_))
        ));
    }
}
