use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type WordId = String;

/// Difficulty of a word. Declaration order is the severity order used when sorting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Easy,
    Medium,
    Hard,
}

pub const ALL_LEVELS: [Level; 3] = [Level::Easy, Level::Medium, Level::Hard];

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Easy => "easy",
            Level::Medium => "medium",
            Level::Hard => "hard",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level `{0}` (expected all, easy, medium or hard)")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Level::Easy),
            "medium" => Ok(Level::Medium),
            "hard" => Ok(Level::Hard),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Level restriction for word views and quiz pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelFilter {
    #[default]
    All,
    Easy,
    Medium,
    Hard,
}

impl LevelFilter {
    pub fn matches(self, level: Level) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Easy => level == Level::Easy,
            LevelFilter::Medium => level == Level::Medium,
            LevelFilter::Hard => level == Level::Hard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LevelFilter::All => "all",
            LevelFilter::Easy => "easy",
            LevelFilter::Medium => "medium",
            LevelFilter::Hard => "hard",
        }
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Easy => LevelFilter::Easy,
            Level::Medium => LevelFilter::Medium,
            Level::Hard => LevelFilter::Hard,
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LevelFilter {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(LevelFilter::All);
        }
        s.parse::<Level>().map(LevelFilter::from)
    }
}

/// A vocabulary entry. Identity fields never change after creation; the study
/// fields are rewritten every time the word shows up in a finished quiz.
///
/// Bookmark membership is not stored here: it lives in the bookmark set and is
/// derived on read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: WordId,
    pub english: String,
    pub korean: String,
    pub example: String,
    pub meaning: String,
    pub level: Level,
    #[serde(default)]
    pub study_count: u32,
    #[serde(default)]
    pub last_studied: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_correct: Option<bool>,
}

impl Word {
    pub fn new(
        id: impl Into<WordId>,
        english: impl Into<String>,
        korean: impl Into<String>,
        level: Level,
    ) -> Self {
        Self {
            id: id.into(),
            english: english.into(),
            korean: korean.into(),
            example: String::new(),
            meaning: String::new(),
            level,
            study_count: 0,
            last_studied: None,
            is_correct: None,
        }
    }

    pub fn with_example(mut self, example: impl Into<String>, meaning: impl Into<String>) -> Self {
        self.example = example.into();
        self.meaning = meaning.into();
        self
    }

    pub fn is_studied(&self) -> bool {
        self.study_count > 0
    }

    pub fn record_study(&mut self, is_correct: bool, at: DateTime<Utc>) {
        self.study_count += 1;
        self.last_studied = Some(at);
        self.is_correct = Some(is_correct);
    }

    /// Milliseconds since the epoch of the last study, 0 when never studied.
    pub fn last_studied_ms(&self) -> i64 {
        self.last_studied.map(|t| t.timestamp_millis()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order_is_severity() {
        assert!(Level::Easy < Level::Medium);
        assert!(Level::Medium < Level::Hard);
    }

    #[test]
    fn test_level_filter_parse() {
        assert_eq!("all".parse::<LevelFilter>(), Ok(LevelFilter::All));
        assert_eq!("Hard".parse::<LevelFilter>(), Ok(LevelFilter::Hard));
        assert!("expert".parse::<LevelFilter>().is_err());
    }

    #[test]
    fn test_level_filter_matches() {
        assert!(LevelFilter::All.matches(Level::Hard));
        assert!(LevelFilter::Easy.matches(Level::Easy));
        assert!(!LevelFilter::Easy.matches(Level::Medium));
    }

    #[test]
    fn test_word_deserializes_legacy_document() {
        // Older documents carry a per-word bookmark flag and null timestamps.
        let json = r#"{
            "id": "word_1",
            "english": "apple",
            "korean": "사과",
            "example": "I ate an apple.",
            "meaning": "나 사과 하나 먹었어.",
            "level": "easy",
            "isBookmarked": true,
            "studyCount": 0,
            "lastStudied": null
        }"#;
        let word: Word = serde_json::from_str(json).unwrap();
        assert_eq!(word.id, "word_1");
        assert_eq!(word.level, Level::Easy);
        assert_eq!(word.last_studied, None);
        assert_eq!(word.is_correct, None);
        assert_eq!(word.last_studied_ms(), 0);
    }

    #[test]
    fn test_record_study_updates_metadata() {
        let mut word = Word::new("w", "apple", "사과", Level::Easy);
        let at = DateTime::parse_from_rfc3339("2026-10-18T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        word.record_study(false, at);
        assert_eq!(word.study_count, 1);
        assert_eq!(word.last_studied, Some(at));
        assert_eq!(word.is_correct, Some(false));
        assert!(word.is_studied());
    }
}
