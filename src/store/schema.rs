use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::bookmarks::BookmarkSet;
use crate::engine::stats::StudyStats;
use crate::session::result::QuizResult;
use crate::words::Word;

pub const WORDS_KEY: &str = "words";
pub const QUIZ_RESULTS_KEY: &str = "quiz_results";
pub const STUDY_STATS_KEY: &str = "study_stats";
pub const BOOKMARKS_KEY: &str = "bookmarks";
pub const THEME_KEY: &str = "theme";
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// Every key the app owns. A reset removes all of them.
pub const ALL_KEYS: [&str; 6] = [
    WORDS_KEY,
    QUIZ_RESULTS_KEY,
    STUDY_STATS_KEY,
    BOOKMARKS_KEY,
    THEME_KEY,
    NOTIFICATIONS_KEY,
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    Auto,
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::Auto => "auto",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme `{0}` (expected light, dark or auto)")]
pub struct ParseThemeError(pub String);

impl FromStr for ThemeMode {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "auto" => Ok(ThemeMode::Auto),
            _ => Err(ParseThemeError(s.to_string())),
        }
    }
}

/// Reminder preferences. Fields missing from a stored document take their
/// defaults, so a partial document merges over the defaults on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub daily_reminder: bool,
    #[serde(default = "default_reminder_time")]
    pub reminder_time: String,
    #[serde(default = "default_true")]
    pub word_of_the_day: bool,
    #[serde(default = "default_true")]
    pub quiz_reminder: bool,
    #[serde(default = "default_true")]
    pub streak_reminder: bool,
}

fn default_true() -> bool {
    true
}

fn default_reminder_time() -> String {
    "09:00".to_string()
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            daily_reminder: default_true(),
            reminder_time: default_reminder_time(),
            word_of_the_day: default_true(),
            quiz_reminder: default_true(),
            streak_reminder: default_true(),
        }
    }
}

impl NotificationSettings {
    /// Check `reminder_time` is a valid "HH:MM" 24-hour time.
    pub fn has_valid_reminder_time(&self) -> bool {
        chrono::NaiveTime::parse_from_str(&self.reminder_time, "%H:%M").is_ok()
            && self.reminder_time.len() == 5
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub theme: ThemeMode,
    pub notifications: NotificationSettings,
}

pub const EXPORT_VERSION: u32 = 1;

/// Backup bundle of every persisted key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub wordbook_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub words: Vec<Word>,
    pub quiz_results: Vec<QuizResult>,
    pub study_stats: Option<StudyStats>,
    pub bookmarks: BookmarkSet,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default)]
    pub notifications: NotificationSettings,
}
